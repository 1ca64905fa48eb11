// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Blocking: turns input polygons into oriented, tolerance-snapped entities.
//!
//! Space faces keep their own winding as sense. Element layers are extruded
//! from the base face along its normal; each layer becomes a [`Block`] whose
//! near side lies on the base side. Heights and footprint vertices pass
//! through the [`ToleranceContext`] so that touching surfaces end up with
//! identical coordinates.

use nalgebra::{Point2, Point3};
use space_boundaries_geometry::{polygon_normal, Footprint, OrientedArea, PlaneFrame};

use crate::entity::{Block, LayerRef, SpaceFace};
use crate::error::{Error, Result};
use crate::model::{Element, Polygon, Space};
use crate::tolerance::{Orientation, ToleranceContext};

/// A polygon placed into a canonical orientation.
struct Placed {
    orientation: Orientation,
    height: f64,
    sense: bool,
    footprint: Footprint,
}

/// Builds the blocks of `elements`, in element then layer order.
///
/// Layers thicker than `max_thickness` are split into two halfblocks, one
/// per side. Elements whose base polygon cannot be embedded and layers
/// without positive thickness are skipped.
pub fn build_blocks(
    elements: &[Element],
    ctx: &mut ToleranceContext,
    max_thickness: f64,
) -> Result<Vec<Block>> {
    let mut blocks = Vec::new();

    for element in elements {
        let Some(base) = place(&element.base, ctx)? else {
            tracing::warn!(element = %element.id, "skipping element with degenerate base polygon");
            continue;
        };
        let step = if base.sense { 1.0 } else { -1.0 };
        let fenestration = element.kind.is_fenestration();

        let mut offset = 0.0;
        for (index, layer) in element.layers.iter().enumerate() {
            let thickness = layer.thickness;
            if !(thickness.is_finite() && thickness > 0.0) {
                tracing::warn!(
                    element = %element.id,
                    layer = index,
                    thickness,
                    "skipping layer without positive thickness"
                );
                continue;
            }

            let near = ctx.request_height(base.orientation, base.height + step * offset)?;
            offset += thickness;
            let far = ctx.request_height(base.orientation, base.height + step * offset)?;

            let layer_ref = LayerRef {
                element_id: element.id.clone(),
                layer_index: index,
                material: layer.material.clone(),
                thickness,
            };
            let make = |sense: bool, near: f64, far: Option<f64>| Block {
                layer: layer_ref.clone(),
                orientation: base.orientation,
                sense,
                near,
                far,
                footprint: base.footprint.clone(),
                fenestration,
            };

            if thickness > max_thickness {
                tracing::debug!(
                    element = %element.id,
                    layer = index,
                    thickness,
                    "splitting thick layer into halfblocks"
                );
                blocks.push(make(!base.sense, near, None));
                blocks.push(make(base.sense, far, None));
            } else {
                blocks.push(make(!base.sense, near, Some(far)));
            }
        }
    }

    Ok(blocks)
}

/// Builds one face per bounding polygon of each space.
pub fn build_space_faces(spaces: &[Space], ctx: &mut ToleranceContext) -> Result<Vec<SpaceFace>> {
    let mut faces = Vec::new();

    for space in spaces {
        for (index, polygon) in space.faces.iter().enumerate() {
            let Some(placed) = place(polygon, ctx)? else {
                tracing::warn!(space = %space.id, face = index, "skipping degenerate space face");
                continue;
            };
            faces.push(SpaceFace::new(
                space.id.clone(),
                index,
                placed.orientation,
                placed.height,
                placed.sense,
                placed.footprint,
            ));
        }
    }

    Ok(faces)
}

/// Canonicalizes a polygon's orientation, height and vertices.
///
/// Returns `Ok(None)` for polygons that have no area or are not planar;
/// tolerance conflicts are errors.
fn place(polygon: &Polygon, ctx: &mut ToleranceContext) -> Result<Option<Placed>> {
    let outer = polygon.outer_points();
    let holes = polygon.hole_points();
    let Some(normal) = polygon_normal(&outer) else {
        return Ok(None);
    };

    let (orientation, _) = ctx.request_orientation(&normal)?;
    let frame = *ctx
        .frame(orientation)
        .ok_or(Error::UnknownOrientation(orientation.index()))?;
    let area = match OrientedArea::embed(&outer, &holes, &frame, ctx.epsilon()) {
        Ok(area) => area,
        Err(err) => {
            tracing::warn!(error = %err, "polygon does not embed");
            return Ok(None);
        }
    };

    let height = ctx.request_height(orientation, area.height)?;
    let outer_2d = snap(&outer, &frame, orientation, ctx)?;
    let holes_2d = holes
        .iter()
        .map(|hole| snap(hole, &frame, orientation, ctx))
        .collect::<Result<Vec<_>>>()?;
    let footprint = Footprint::from_contour_with_holes(&outer_2d, &holes_2d);
    if footprint.is_empty() {
        return Ok(None);
    }

    Ok(Some(Placed {
        orientation,
        height,
        sense: area.sense,
        footprint,
    }))
}

fn snap(
    points: &[Point3<f64>],
    frame: &PlaneFrame,
    orientation: Orientation,
    ctx: &mut ToleranceContext,
) -> Result<Vec<Point2<f64>>> {
    points
        .iter()
        .map(|p| ctx.request_point(orientation, &frame.project(p)))
        .collect()
}
