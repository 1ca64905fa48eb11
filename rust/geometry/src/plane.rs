// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Oriented-area embedding of planar 3D polygons.
//!
//! Every orientation gets one [`PlaneFrame`]: a unit normal plus an in-plane
//! orthonormal basis anchored at the world origin. Projecting polygons from
//! different elements through the same frame yields footprints that live in a
//! shared 2D coordinate system, and their distance along the normal becomes
//! the polygon's height.

use nalgebra::{Point2, Point3, Vector3};

use crate::error::{Error, Result};
use crate::footprint::Footprint;

/// An orthonormal frame for one orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneFrame {
    normal: Vector3<f64>,
    u_axis: Vector3<f64>,
    v_axis: Vector3<f64>,
}

impl PlaneFrame {
    /// Builds a frame around `normal`. The normal does not need to be unit
    /// length but must not be zero.
    pub fn new(normal: &Vector3<f64>) -> Result<Self> {
        let normal = normal
            .try_normalize(1e-12)
            .ok_or_else(|| Error::DegeneratePolygon("zero-length normal".to_string()))?;

        // Find the axis least parallel to the normal for stable cross product
        let abs_x = normal.x.abs();
        let abs_y = normal.y.abs();
        let abs_z = normal.z.abs();

        let reference = if abs_x <= abs_y && abs_x <= abs_z {
            Vector3::new(1.0, 0.0, 0.0)
        } else if abs_y <= abs_z {
            Vector3::new(0.0, 1.0, 0.0)
        } else {
            Vector3::new(0.0, 0.0, 1.0)
        };

        let u_axis = normal.cross(&reference).normalize();
        let v_axis = normal.cross(&u_axis).normalize();

        Ok(Self {
            normal,
            u_axis,
            v_axis,
        })
    }

    /// Unit normal of the frame.
    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    /// Signed distance of `point` from the origin along the normal.
    pub fn height(&self, point: &Point3<f64>) -> f64 {
        point.coords.dot(&self.normal)
    }

    /// In-plane coordinates of `point`.
    pub fn project(&self, point: &Point3<f64>) -> Point2<f64> {
        Point2::new(point.coords.dot(&self.u_axis), point.coords.dot(&self.v_axis))
    }
}

/// Unit normal of a polygon from its vector area, or `None` if it has no
/// area. Winding decides the direction (right-hand rule).
pub fn polygon_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    let (origin, rest) = points.split_first()?;
    if rest.len() < 2 {
        return None;
    }
    let area = rest
        .windows(2)
        .map(|w| (w[0] - origin).cross(&(w[1] - origin)))
        .fold(Vector3::zeros(), |acc, v| acc + v);
    area.try_normalize(1e-12)
}

/// A footprint placed at a height and sense within one frame.
#[derive(Debug, Clone)]
pub struct OrientedArea {
    pub footprint: Footprint,
    /// Unit normal of the frame the footprint lives in.
    pub direction: Vector3<f64>,
    /// Distance of the plane from the origin along `direction`.
    pub height: f64,
    /// `true` if the polygon's own normal agrees with `direction`.
    pub sense: bool,
}

impl OrientedArea {
    /// Embeds a planar polygon (outer loop plus hole loops) into `frame`.
    ///
    /// The polygon's winding decides its sense: a loop whose winding normal
    /// points along the frame normal has `sense == true`. Vertices further
    /// than `planarity_tolerance` from their mean height are rejected.
    pub fn embed(
        outer: &[Point3<f64>],
        holes: &[Vec<Point3<f64>>],
        frame: &PlaneFrame,
        planarity_tolerance: f64,
    ) -> Result<Self> {
        let normal = polygon_normal(outer)
            .ok_or_else(|| Error::DegeneratePolygon(format!("{} vertices", outer.len())))?;

        let heights: Vec<f64> = outer.iter().map(|p| frame.height(p)).collect();
        let height = heights.iter().sum::<f64>() / heights.len() as f64;
        let deviation = heights
            .iter()
            .map(|h| (h - height).abs())
            .fold(0.0f64, f64::max);
        if deviation > planarity_tolerance {
            return Err(Error::NonPlanarPolygon { deviation });
        }

        let project = |loop_3d: &[Point3<f64>]| -> Vec<Point2<f64>> {
            loop_3d.iter().map(|p| frame.project(p)).collect()
        };
        let hole_loops: Vec<Vec<Point2<f64>>> = holes.iter().map(|h| project(h)).collect();
        let footprint = Footprint::from_contour_with_holes(&project(outer), &hole_loops);

        Ok(Self {
            footprint,
            direction: frame.normal,
            height,
            sense: normal.dot(&frame.normal) > 0.0,
        })
    }
}
