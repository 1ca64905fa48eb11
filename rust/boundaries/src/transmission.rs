// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transmission traversal: what each part of a space face ultimately sees.
//!
//! Starting from a face, the traversal follows contacts through blocks until
//! it reaches another space face (an internal record), a halfblock or the
//! thickness cutoff (a non-transmitting record), or runs out of contacts (an
//! external record for whatever area nothing claimed). Every unit of the
//! starting face's remaining footprint lands in exactly one record.
//!
//! The search runs on an explicit work stack. Each frame owns the area that
//! reached its node; the first frame sits on the starting face and may leave
//! through any of its contacts, later frames only through the far side of the
//! block they entered.

use serde::Serialize;
use space_boundaries_geometry::Footprint;

use crate::arena::EntityArena;
use crate::config::TraversalLimits;
use crate::entity::{Entity, LayerRef};
use crate::error::{Error, Result};
use crate::graph::{area_epsilon, ConnectivityGraph};
use crate::keys::{EntityKey, SpaceFaceKey};
use crate::tolerance::Orientation;

/// One outcome of a transmission traversal.
///
/// - internal: `end_space` is set, the path reaches another space face
/// - external: `external` is set, nothing lies beyond the crossed layers
/// - non-transmitting: neither; the path hit a halfblock or got too thick
#[derive(Debug, Clone, Serialize)]
pub struct TransmissionRecord {
    pub area: Footprint,
    pub layers: Vec<LayerRef>,
    pub sense: bool,
    pub orientation: Orientation,
    pub external: bool,
    pub start_space: String,
    pub start_height: f64,
    pub end_space: Option<String>,
    pub end_height: Option<f64>,
}

impl TransmissionRecord {
    pub fn is_internal(&self) -> bool {
        self.end_space.is_some()
    }

    /// `true` for records that end at neither another space nor the exterior.
    pub fn is_blocked(&self) -> bool {
        !self.external && self.end_space.is_none()
    }

    /// Summed thickness of the crossed layers.
    pub fn thickness(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness).sum()
    }
}

/// Pending work: area that reached `node` along `path`.
struct Frame {
    node: usize,
    path: Vec<usize>,
    /// Contact plane to leave through, `None` on the starting face.
    exit_height: Option<f64>,
    area: Footprint,
    thickness: f64,
    layers: Vec<LayerRef>,
}

/// Runs the transmission traversal from every face of the group, in
/// insertion order.
pub fn run_transmission(
    arena: &mut EntityArena,
    graph: &ConnectivityGraph,
    limits: &TraversalLimits,
) -> Result<Vec<TransmissionRecord>> {
    let mut records = Vec::new();
    for key in arena.face_keys() {
        records.extend(trace_transmissions(arena, graph, key, limits)?);
    }
    Ok(records)
}

/// Traces every transmission path leaving `start`'s remaining footprint.
///
/// The starting face's remaining footprint is used up. Area reaching another
/// face is removed from that face's remaining footprint, so the same pair of
/// faces is not reported twice.
pub fn trace_transmissions(
    arena: &mut EntityArena,
    graph: &ConnectivityGraph,
    start: SpaceFaceKey,
    limits: &TraversalLimits,
) -> Result<Vec<TransmissionRecord>> {
    let area_eps = area_epsilon(graph.epsilon());
    let Some(start_node) = graph.node_index(EntityKey::Face(start)) else {
        return Ok(Vec::new());
    };
    let Some(face) = arena.face_mut(start) else {
        return Ok(Vec::new());
    };
    let seed = face.take_remaining();
    if seed.is_negligible(area_eps) {
        return Ok(Vec::new());
    }

    let start_space = face.space_id.clone();
    let start_height = face.height;
    let sense = face.sense;
    let orientation = face.orientation;

    let record = |area: Footprint, layers: Vec<LayerRef>, external: bool, end: Option<(String, f64)>| {
        let (end_space, end_height) = match end {
            Some((space, height)) => (Some(space), Some(height)),
            None => (None, None),
        };
        TransmissionRecord {
            area,
            layers,
            sense,
            orientation,
            external,
            start_space: start_space.clone(),
            start_height,
            end_space,
            end_height,
        }
    };

    let mut records = Vec::new();
    let mut consumed: Vec<(SpaceFaceKey, Footprint)> = Vec::new();
    let mut stack = vec![Frame {
        node: start_node,
        path: vec![start_node],
        exit_height: None,
        area: seed,
        thickness: 0.0,
        layers: Vec::new(),
    }];

    while let Some(frame) = stack.pop() {
        if frame.path.len() > limits.max_depth {
            return Err(Error::DepthLimitExceeded {
                limit: limits.max_depth,
            });
        }

        let neighbors: Vec<(usize, f64)> = match frame.exit_height {
            None => graph
                .neighbors(frame.node)
                .map(|(n, edge)| (n, edge.height))
                .collect(),
            Some(exit) => graph
                .neighbors_at(frame.node, exit)
                .filter(|(n, _)| !frame.path.contains(n))
                .map(|(n, edge)| (n, edge.height))
                .collect(),
        };

        let mut unaccounted = frame.area.clone();
        for (neighbor, edge_height) in neighbors {
            let key = graph.node_key(neighbor);
            let Some(entity) = arena.entity(key) else {
                continue;
            };
            let overlap = unaccounted.intersection(entity.footprint());
            unaccounted = unaccounted.difference(entity.footprint());
            if overlap.is_negligible(area_eps) {
                continue;
            }

            match entity {
                Entity::Face(target) => {
                    let end = Some((target.space_id.clone(), target.height));
                    if let Some(target_key) = key.as_face() {
                        consumed.push((target_key, overlap.clone()));
                    }
                    records.push(record(overlap, frame.layers.clone(), false, end));
                }
                Entity::Block(block) => {
                    let thickness = frame.thickness + block.thickness();
                    let mut layers = frame.layers.clone();
                    layers.push(block.layer.clone());

                    match block.opposite_height(edge_height) {
                        Some(exit) if thickness <= limits.max_thickness => {
                            let mut path = frame.path.clone();
                            path.push(neighbor);
                            stack.push(Frame {
                                node: neighbor,
                                path,
                                exit_height: Some(exit),
                                area: overlap,
                                thickness,
                                layers,
                            });
                        }
                        _ => records.push(record(overlap, layers, false, None)),
                    }
                }
            }
        }

        if !unaccounted.is_negligible(area_eps) {
            records.push(record(unaccounted, frame.layers, true, None));
        }
    }

    for (key, area) in consumed {
        if let Some(face) = arena.face_mut(key) {
            face.consume(&area);
        }
    }

    Ok(records)
}
