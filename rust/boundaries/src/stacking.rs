// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stacking traversal: the material layers between two parallel surfaces.
//!
//! A [`StackingSequence`] pairs a footprint with the vertices visited to
//! reach it. Walking outward from a space face, every contact splits off the
//! part of the sequence it covers, so the sequences derived from one seed
//! always partition the seed footprint. Each finished sequence becomes a
//! [`BlockStack`].

use serde::Serialize;
use space_boundaries_geometry::Footprint;

use crate::arena::EntityArena;
use crate::config::TraversalLimits;
use crate::entity::{Entity, LayerRef};
use crate::error::{Error, Result};
use crate::graph::{area_epsilon, ConnectivityGraph};
use crate::keys::{EntityKey, SpaceFaceKey};
use crate::tolerance::Orientation;

/// How a block stack ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StackKind {
    /// Two space faces touch directly, no material in between.
    Virtual,
    /// Material layers between two space faces.
    Closed,
    /// Nothing more touches the last layer (or the face itself).
    Open,
    /// The last layer is a halfblock.
    Terminal,
    /// The accumulated thickness passed the cutoff.
    TooThick,
}

/// An ordered set of material layers over one footprint.
#[derive(Debug, Clone, Serialize)]
pub struct BlockStack {
    pub area: Footprint,
    pub orientation: Orientation,
    /// Sense of the space face the stack starts from.
    pub base_sense: bool,
    pub layers: Vec<LayerRef>,
    pub near_space: String,
    pub near_height: f64,
    pub far_space: Option<String>,
    pub far_height: Option<f64>,
    pub kind: StackKind,
}

impl BlockStack {
    /// Summed thickness of the stack's layers.
    pub fn thickness(&self) -> f64 {
        self.layers.iter().map(|l| l.thickness).sum()
    }
}

/// Footprint plus the graph vertices visited to reach it.
#[derive(Debug, Clone)]
pub struct StackingSequence {
    footprint: Footprint,
    vertices: Vec<usize>,
}

impl StackingSequence {
    pub fn new(footprint: Footprint, start: usize) -> Self {
        Self {
            footprint,
            vertices: vec![start],
        }
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Moves the part of this sequence covered by `other` into a new
    /// sequence that continues at `vertex`.
    ///
    /// Returns `None` and leaves `self` untouched if the covered part is no
    /// larger than `area_epsilon`.
    pub fn split_off(
        &mut self,
        other: &Footprint,
        vertex: usize,
        area_epsilon: f64,
    ) -> Option<StackingSequence> {
        let claimed = self.footprint.intersection(other);
        if claimed.is_negligible(area_epsilon) {
            return None;
        }
        self.footprint = self.footprint.difference(other);

        let mut vertices = self.vertices.clone();
        vertices.push(vertex);
        Some(StackingSequence {
            footprint: claimed,
            vertices,
        })
    }

    fn finish(
        self,
        origin: &StackOrigin,
        arena: &EntityArena,
        graph: &ConnectivityGraph,
        kind: StackKind,
    ) -> BlockStack {
        let mut layers = Vec::new();
        let mut far = None;
        for &vertex in &self.vertices[1..] {
            match arena.entity(graph.node_key(vertex)) {
                Some(Entity::Block(block)) => layers.push(block.layer.clone()),
                Some(Entity::Face(face)) => far = Some((face.space_id.clone(), face.height)),
                None => {}
            }
        }
        let (far_space, far_height) = match far {
            Some((space, height)) => (Some(space), Some(height)),
            None => (None, None),
        };

        BlockStack {
            area: self.footprint,
            orientation: origin.orientation,
            base_sense: origin.sense,
            layers,
            near_space: origin.space_id.clone(),
            near_height: origin.height,
            far_space,
            far_height,
            kind,
        }
    }
}

/// The space face a stack starts from.
struct StackOrigin {
    space_id: String,
    height: f64,
    sense: bool,
    orientation: Orientation,
}

/// A sequence waiting to be extended from its last vertex.
struct Pending {
    sequence: StackingSequence,
    /// Contact plane on the far side of the last vertex.
    height: f64,
    thickness: f64,
}

/// Runs the stacking traversal from every face of the group, in insertion
/// order.
pub fn run_stacking(
    arena: &mut EntityArena,
    graph: &ConnectivityGraph,
    limits: &TraversalLimits,
) -> Result<Vec<BlockStack>> {
    let mut stacks = Vec::new();
    for key in arena.face_keys() {
        stacks.extend(trace_stacks(arena, graph, key, limits)?);
    }
    Ok(stacks)
}

/// Builds the block stacks seeded by `start`'s remaining footprint.
///
/// The seed is taken out of the face's remaining footprint. Stacks that end
/// on another face also remove their area from that face's remaining
/// footprint.
pub fn trace_stacks(
    arena: &mut EntityArena,
    graph: &ConnectivityGraph,
    start: SpaceFaceKey,
    limits: &TraversalLimits,
) -> Result<Vec<BlockStack>> {
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
    let origin = StackOrigin {
        space_id: face.space_id.clone(),
        height: face.height,
        sense: face.sense,
        orientation: face.orientation,
    };

    let mut stacks = Vec::new();
    let mut consumed: Vec<(SpaceFaceKey, Footprint)> = Vec::new();
    let mut stack = vec![Pending {
        sequence: StackingSequence::new(seed, start_node),
        height: origin.height,
        thickness: 0.0,
    }];

    while let Some(Pending {
        mut sequence,
        height,
        thickness,
    }) = stack.pop()
    {
        if sequence.vertices.len() > limits.max_depth {
            return Err(Error::DepthLimitExceeded {
                limit: limits.max_depth,
            });
        }
        if thickness > limits.max_thickness {
            stacks.push(sequence.finish(&origin, arena, graph, StackKind::TooThick));
            continue;
        }

        let Some(&current) = sequence.vertices.last() else {
            continue;
        };
        let contacts: Vec<(usize, f64, Option<&Footprint>)> = graph
            .neighbors_at(current, height)
            .filter(|(n, _)| !sequence.vertices.contains(n))
            .map(|(n, edge)| (n, edge.height, edge.overlap.as_ref()))
            .collect();

        for (neighbor, edge_height, overlap) in contacts {
            let key = graph.node_key(neighbor);
            let Some(entity) = arena.entity(key) else {
                continue;
            };
            let covered = overlap.unwrap_or(entity.footprint());
            let Some(part) = sequence.split_off(covered, neighbor, area_eps) else {
                continue;
            };

            match entity {
                Entity::Face(_) => {
                    let kind = if part.vertices.len() == 2 {
                        StackKind::Virtual
                    } else {
                        StackKind::Closed
                    };
                    if let Some(face_key) = key.as_face() {
                        consumed.push((face_key, part.footprint.clone()));
                    }
                    stacks.push(part.finish(&origin, arena, graph, kind));
                }
                Entity::Block(block) => match block.opposite_height(edge_height) {
                    Some(next) => stack.push(Pending {
                        sequence: part,
                        height: next,
                        thickness: thickness + block.thickness(),
                    }),
                    None => stacks.push(part.finish(&origin, arena, graph, StackKind::Terminal)),
                },
            }
        }

        if !sequence.footprint.is_negligible(area_eps) {
            stacks.push(sequence.finish(&origin, arena, graph, StackKind::Open));
        }
    }

    for (key, area) in consumed {
        if let Some(face) = arena.face_mut(key) {
            face.consume(&area);
        }
    }

    tracing::trace!(
        space = %origin.space_id,
        stacks = stacks.len(),
        "stacked space face"
    );

    Ok(stacks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tests::{block, z_orientation};
    use crate::entity::SpaceFace;
    use crate::graph::GraphMode;
    use approx::assert_relative_eq;

    const EPS: f64 = 1e-4;

    fn limits() -> TraversalLimits {
        TraversalLimits {
            max_thickness: 1.0,
            max_depth: 64,
        }
    }

    fn face(id: &str, height: f64, sense: bool, fp: Footprint) -> SpaceFace {
        SpaceFace::new(id, 0, z_orientation(), height, sense, fp)
    }

    #[test]
    fn split_off_partitions_the_footprint() {
        let mut seq = StackingSequence::new(Footprint::rectangle(0.0, 0.0, 4.0, 1.0), 0);
        let part = seq
            .split_off(&Footprint::rectangle(1.0, -1.0, 2.0, 2.0), 7, 1e-9)
            .unwrap();
        assert_eq!(part.vertices(), &[0, 7]);
        assert_eq!(seq.vertices(), &[0]);
        assert_relative_eq!(part.footprint().regular_area(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(seq.footprint().regular_area(), 3.0, epsilon = 1e-9);
        assert!(part.footprint().intersection(seq.footprint()).is_empty());
    }

    #[test]
    fn split_off_outside_leaves_sequence_untouched() {
        let mut seq = StackingSequence::new(Footprint::rectangle(0.0, 0.0, 1.0, 1.0), 0);
        assert!(seq
            .split_off(&Footprint::rectangle(5.0, 5.0, 6.0, 6.0), 1, 1e-9)
            .is_none());
        assert_relative_eq!(seq.footprint().regular_area(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn two_layer_wall_between_rooms() {
        let mut arena = EntityArena::new();
        let fp = Footprint::rectangle(0.0, 0.0, 5.0, 3.0);
        let a = arena.add_face(face("a", 0.0, true, fp.clone()));
        arena.add_block(block("plaster", false, 0.0, Some(0.02), fp.clone()));
        arena.add_block(block("brick", false, 0.02, Some(0.26), fp.clone()));
        let b = arena.add_face(face("b", 0.26, false, fp));
        let graph = ConnectivityGraph::build(&arena, EPS, GraphMode::Stacking);

        let stacks = run_stacking(&mut arena, &graph, &limits()).unwrap();
        assert_eq!(stacks.len(), 1);
        let s = &stacks[0];
        assert_eq!(s.kind, StackKind::Closed);
        assert_eq!(s.near_space, "a");
        assert_eq!(s.far_space.as_deref(), Some("b"));
        assert_eq!(s.far_height, Some(0.26));
        let names: Vec<&str> = s.layers.iter().map(|l| l.element_id.as_str()).collect();
        assert_eq!(names, vec!["plaster", "brick"]);

        assert!(arena.face(a).unwrap().remaining().is_empty());
        assert!(arena.face(b).unwrap().remaining().is_empty());
    }

    #[test]
    fn virtual_boundary_between_faces() {
        let mut arena = EntityArena::new();
        let a = arena.add_face(face("a", 1.0, true, Footprint::rectangle(0.0, 0.0, 2.0, 2.0)));
        arena.add_face(face("b", 1.0, false, Footprint::rectangle(1.0, 0.0, 3.0, 2.0)));
        let graph = ConnectivityGraph::build(&arena, EPS, GraphMode::Stacking);

        let stacks = trace_stacks(&mut arena, &graph, a, &limits()).unwrap();
        assert_eq!(stacks.len(), 2);
        let virtual_stack = stacks.iter().find(|s| s.kind == StackKind::Virtual).unwrap();
        assert!(virtual_stack.layers.is_empty());
        assert_relative_eq!(virtual_stack.area.regular_area(), 2.0, epsilon = 1e-9);
        let open = stacks.iter().find(|s| s.kind == StackKind::Open).unwrap();
        assert!(open.far_space.is_none());
        assert_relative_eq!(open.area.regular_area(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn halfblock_ends_stack() {
        let mut arena = EntityArena::new();
        let fp = Footprint::rectangle(0.0, 0.0, 1.0, 1.0);
        let a = arena.add_face(face("a", 0.0, true, fp.clone()));
        arena.add_block(block("ground", false, 0.0, None, fp));
        let graph = ConnectivityGraph::build(&arena, EPS, GraphMode::Stacking);

        let stacks = trace_stacks(&mut arena, &graph, a, &limits()).unwrap();
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].kind, StackKind::Terminal);
        assert_eq!(stacks[0].layers.len(), 1);
    }

    #[test]
    fn too_thick_stack_is_cut() {
        let mut arena = EntityArena::new();
        let fp = Footprint::rectangle(0.0, 0.0, 1.0, 1.0);
        let a = arena.add_face(face("a", 0.0, true, fp.clone()));
        arena.add_block(block("l1", false, 0.0, Some(0.7), fp.clone()));
        arena.add_block(block("l2", false, 0.7, Some(1.4), fp.clone()));
        arena.add_face(face("b", 1.4, false, fp));
        let graph = ConnectivityGraph::build(&arena, EPS, GraphMode::Stacking);

        let stacks = trace_stacks(&mut arena, &graph, a, &limits()).unwrap();
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].kind, StackKind::TooThick);
        assert_eq!(stacks[0].layers.len(), 2);
        assert!(stacks[0].far_space.is_none());
    }

    #[test]
    fn stacking_connects_across_fenestration() {
        let mut arena = EntityArena::new();
        let fp = Footprint::rectangle(0.0, 0.0, 1.0, 1.0);
        let a = arena.add_face(face("a", 0.0, true, fp.clone()));
        let mut pane = block("window", false, 0.0, Some(0.05), fp.clone());
        pane.fenestration = true;
        arena.add_block(pane);
        arena.add_block(block("shutter", false, 0.05, Some(0.1), fp));
        let graph = ConnectivityGraph::build(&arena, EPS, GraphMode::Stacking);

        let stacks = trace_stacks(&mut arena, &graph, a, &limits()).unwrap();
        assert_eq!(stacks.len(), 1);
        assert_eq!(stacks[0].kind, StackKind::Open);
        assert_eq!(stacks[0].layers.len(), 2);
    }
}
