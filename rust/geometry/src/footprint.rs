// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Footprint Algebra
//!
//! A [`Footprint`] is a set of disjoint polygonal shapes (each an outer contour
//! plus holes) in the 2D frame of one orientation. All boolean operations go
//! through the i_overlay crate with the even-odd fill rule, so the contours of
//! an operation's result can be fed straight back in as a subject or clip.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Minimum area threshold - shapes smaller than this are considered degenerate
pub const MIN_AREA_THRESHOLD: f64 = 1e-10;

/// One closed contour in i_overlay path format.
pub type Contour = Vec<[f64; 2]>;

/// A planar region made of disjoint shapes.
///
/// Each shape is a list of contours: the first is the outer boundary, the
/// rest are holes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    shapes: Vec<Vec<Contour>>,
}

impl Footprint {
    /// Creates a footprint covering nothing.
    pub fn empty() -> Self {
        Self { shapes: Vec::new() }
    }

    /// Creates a footprint from a single simple contour.
    ///
    /// Degenerate contours (fewer than three points, or no area) produce an
    /// empty footprint.
    pub fn from_contour(contour: &[Point2<f64>]) -> Self {
        let mut path: Contour = contour.iter().map(|p| [p.x, p.y]).collect();
        let area = shoelace(&path);
        if area.abs() <= MIN_AREA_THRESHOLD {
            return Self::empty();
        }
        if area < 0.0 {
            path.reverse();
        }
        Self {
            shapes: vec![vec![path]],
        }
    }

    /// Creates a footprint from an outer contour with holes cut out of it.
    pub fn from_contour_with_holes(outer: &[Point2<f64>], holes: &[Vec<Point2<f64>>]) -> Self {
        let mut footprint = Self::from_contour(outer);
        for hole in holes {
            footprint = footprint.difference(&Self::from_contour(hole));
        }
        footprint
    }

    /// Axis-aligned rectangle spanning `(x0, y0)` to `(x1, y1)`.
    pub fn rectangle(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::from_contour(&[
            Point2::new(x0.min(x1), y0.min(y1)),
            Point2::new(x0.max(x1), y0.min(y1)),
            Point2::new(x0.max(x1), y0.max(y1)),
            Point2::new(x0.min(x1), y0.max(y1)),
        ])
    }

    /// Returns the shapes of this footprint.
    pub fn shapes(&self) -> &[Vec<Contour>] {
        &self.shapes
    }

    /// Returns `true` if the footprint has no area above [`MIN_AREA_THRESHOLD`].
    pub fn is_empty(&self) -> bool {
        self.is_negligible(MIN_AREA_THRESHOLD)
    }

    /// Returns `true` if the footprint's area does not exceed `area_epsilon`.
    pub fn is_negligible(&self, area_epsilon: f64) -> bool {
        self.regular_area() <= area_epsilon
    }

    /// Area enclosed by outer contours minus the area of their holes.
    pub fn regular_area(&self) -> f64 {
        self.shapes
            .iter()
            .map(|shape| {
                let mut contours = shape.iter().map(|c| shoelace(c).abs());
                let outer = contours.next().unwrap_or(0.0);
                outer - contours.sum::<f64>()
            })
            .sum()
    }

    /// Axis-aligned bounds `(min, max)`, or `None` for an empty footprint.
    pub fn bounds(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let mut points = self
            .shapes
            .iter()
            .filter_map(|shape| shape.first())
            .flatten();
        let first = points.next()?;
        let mut min = Point2::new(first[0], first[1]);
        let mut max = min;
        for p in points {
            min.x = min.x.min(p[0]);
            min.y = min.y.min(p[1]);
            max.x = max.x.max(p[0]);
            max.y = max.y.max(p[1]);
        }
        Some((min, max))
    }

    /// Region covered by both footprints.
    pub fn intersection(&self, other: &Footprint) -> Footprint {
        if !self.bounds_overlap(other) {
            return Footprint::empty();
        }
        self.overlay(other, OverlayRule::Intersect)
    }

    /// Region covered by `self` but not by `other`.
    pub fn difference(&self, other: &Footprint) -> Footprint {
        if self.shapes.is_empty() {
            return Footprint::empty();
        }
        if !self.bounds_overlap(other) {
            return self.clone();
        }
        self.overlay(other, OverlayRule::Difference)
    }

    /// Region covered by either footprint.
    pub fn union(&self, other: &Footprint) -> Footprint {
        if other.shapes.is_empty() {
            return self.clone();
        }
        if self.shapes.is_empty() {
            return other.clone();
        }
        self.overlay(other, OverlayRule::Union)
    }

    fn bounds_overlap(&self, other: &Footprint) -> bool {
        let (Some((a_min, a_max)), Some((b_min, b_max))) = (self.bounds(), other.bounds()) else {
            return false;
        };
        a_min.x <= b_max.x && b_min.x <= a_max.x && a_min.y <= b_max.y && b_min.y <= a_max.y
    }

    fn overlay(&self, other: &Footprint, rule: OverlayRule) -> Footprint {
        let subject = self.to_paths();
        let clip = other.to_paths();

        // Result is Vec<Vec<Vec<[f64; 2]>>> - Vec of shapes, each shape is Vec of contours
        let result = subject.overlay(&clip, rule, FillRule::EvenOdd);

        let shapes = result
            .into_iter()
            .filter(|shape| {
                shape
                    .first()
                    .map(|outer| shoelace(outer).abs() > MIN_AREA_THRESHOLD)
                    .unwrap_or(false)
            })
            .collect();
        Footprint { shapes }
    }

    /// Flattens all contours into i_overlay path format.
    fn to_paths(&self) -> Vec<Contour> {
        self.shapes.iter().flatten().cloned().collect()
    }
}

/// Signed area of a closed path, positive when counter-clockwise.
fn shoelace(path: &[[f64; 2]]) -> f64 {
    let n = path.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let [x0, y0] = path[i];
            let [x1, y1] = path[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum();
    twice / 2.0
}
