// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connectivity graph over the entities of one orientation group.
//!
//! Builds a graph where:
//! - **Nodes** = space faces and blocks
//! - **Edges** = physical contact: the two entities sit at matching heights
//!   with compatible senses and their footprints overlap
//!
//! Candidate pairs come from a height sweep: every height of every entity is
//! sorted, and each entry is paired with the entries that follow it within
//! one epsilon. Windows starting at consecutive entries may overlap, which
//! mirrors the non-transitive matching of the tolerance context. Only pairs
//! inside a window are ever tested, so the cost is quadratic in the size of a
//! height cluster rather than in the size of the group.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use space_boundaries_geometry::Footprint;

use crate::arena::EntityArena;
use crate::entity::{Block, Entity, SpaceFace};
use crate::keys::EntityKey;

/// Which traversal the graph is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphMode {
    /// Fenestration and non-fenestration blocks never connect; edges carry
    /// heights only.
    Transmission,
    /// All blocks may connect; edges also carry the overlap footprint.
    Stacking,
}

/// An undirected contact between two entities.
#[derive(Debug, Clone)]
pub struct GraphEdge {
    /// Source node index.
    pub source: usize,
    /// Target node index.
    pub target: usize,
    /// Resolved height of the contact plane.
    pub height: f64,
    /// Overlap of the two footprints (stacking graphs only).
    pub overlap: Option<Footprint>,
}

/// Smallest footprint area that still counts as contact at tolerance `epsilon`.
pub(crate) fn area_epsilon(epsilon: f64) -> f64 {
    epsilon * epsilon
}

fn within(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}

/// Contact graph for one orientation group.
#[derive(Debug)]
pub struct ConnectivityGraph {
    nodes: Vec<EntityKey>,
    edges: Vec<GraphEdge>,
    /// Adjacency list: node index → list of (neighbor index, edge index).
    adjacency: Vec<SmallVec<[(usize, usize); 4]>>,
    key_to_node: FxHashMap<EntityKey, usize>,
    epsilon: f64,
    mode: GraphMode,
}

impl ConnectivityGraph {
    /// Builds the contact graph for every entity in `arena`.
    pub fn build(arena: &EntityArena, epsilon: f64, mode: GraphMode) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            adjacency: Vec::new(),
            key_to_node: FxHashMap::default(),
            epsilon,
            mode,
        };

        for key in arena.entity_keys() {
            graph.add_node(key);
        }

        // Every height of every entity, tagged with its node
        let mut entries: Vec<(f64, usize)> = Vec::with_capacity(graph.nodes.len() * 2);
        for (idx, &key) in graph.nodes.iter().enumerate() {
            if let Some(entity) = arena.entity(key) {
                let (first, second) = entity.heights();
                entries.push((first, idx));
                if let Some(second) = second {
                    entries.push((second, idx));
                }
            }
        }
        entries.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut tested: FxHashSet<(usize, usize)> = FxHashSet::default();
        for (i, &(start, a)) in entries.iter().enumerate() {
            for &(_, b) in entries[i + 1..]
                .iter()
                .take_while(|(h, _)| h - start <= epsilon)
            {
                if a == b {
                    continue;
                }
                let pair = (a.min(b), a.max(b));
                if !tested.insert(pair) {
                    continue;
                }
                let (Some(ea), Some(eb)) = (
                    arena.entity(graph.nodes[pair.0]),
                    arena.entity(graph.nodes[pair.1]),
                ) else {
                    continue;
                };
                if let Some((height, overlap)) = try_connect(ea, eb, epsilon, mode) {
                    tracing::trace!(
                        source = pair.0,
                        target = pair.1,
                        height,
                        "entities connected"
                    );
                    let overlap = (mode == GraphMode::Stacking).then_some(overlap);
                    graph.add_edge(pair.0, pair.1, height, overlap);
                }
            }
        }

        tracing::debug!(
            ?mode,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            pairs_tested = tested.len(),
            "built connectivity graph"
        );

        graph
    }

    fn add_node(&mut self, key: EntityKey) -> usize {
        let idx = self.nodes.len();
        self.key_to_node.insert(key, idx);
        self.nodes.push(key);
        self.adjacency.push(SmallVec::new());
        idx
    }

    fn add_edge(&mut self, source: usize, target: usize, height: f64, overlap: Option<Footprint>) {
        let idx = self.edges.len();
        self.edges.push(GraphEdge {
            source,
            target,
            height,
            overlap,
        });
        self.adjacency[source].push((target, idx));
        self.adjacency[target].push((source, idx));
    }

    // =========================================================================
    // Graph accessors
    // =========================================================================

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn mode(&self) -> GraphMode {
        self.mode
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Returns the node index for an entity key.
    pub fn node_index(&self, key: EntityKey) -> Option<usize> {
        self.key_to_node.get(&key).copied()
    }

    /// Returns the entity key of a node.
    pub fn node_key(&self, node: usize) -> EntityKey {
        self.nodes[node]
    }

    /// Returns the degree (number of contacts) of a node.
    pub fn degree(&self, node: usize) -> usize {
        self.adjacency[node].len()
    }

    /// All contacts of a node as (neighbor index, edge) pairs.
    pub fn neighbors(&self, node: usize) -> impl Iterator<Item = (usize, &GraphEdge)> + '_ {
        self.adjacency[node]
            .iter()
            .map(move |&(neighbor, edge)| (neighbor, &self.edges[edge]))
    }

    /// Contacts of a node whose contact plane lies at `height`.
    pub fn neighbors_at(
        &self,
        node: usize,
        height: f64,
    ) -> impl Iterator<Item = (usize, &GraphEdge)> + '_ {
        let epsilon = self.epsilon;
        self.neighbors(node)
            .filter(move |(_, edge)| within(edge.height, height, epsilon))
    }
}

/// Decides whether two entities touch.
///
/// Returns the resolved contact height and the footprint overlap, or `None`
/// if the heights do not line up for the entities' senses or the footprints
/// do not overlap.
pub fn try_connect(
    a: Entity<'_>,
    b: Entity<'_>,
    epsilon: f64,
    mode: GraphMode,
) -> Option<(f64, Footprint)> {
    let height = match (a, b) {
        (Entity::Face(fa), Entity::Face(fb)) => face_face_height(fa, fb, epsilon)?,
        (Entity::Face(f), Entity::Block(b)) | (Entity::Block(b), Entity::Face(f)) => {
            face_block_height(f, b, epsilon)?
        }
        (Entity::Block(ba), Entity::Block(bb)) => {
            if mode == GraphMode::Transmission && ba.fenestration != bb.fenestration {
                return None;
            }
            block_block_height(ba, bb, epsilon)?
        }
    };

    let overlap = a.footprint().intersection(b.footprint());
    if overlap.is_negligible(area_epsilon(epsilon)) {
        return None;
    }
    Some((height, overlap))
}

/// Two faces of different rooms looking at each other across a plane. The
/// contact sits halfway between their heights.
fn face_face_height(a: &SpaceFace, b: &SpaceFace, epsilon: f64) -> Option<f64> {
    if std::ptr::eq(a, b) || a.sense == b.sense || !within(a.height, b.height, epsilon) {
        return None;
    }
    Some((a.height + b.height) / 2.0)
}

/// A face touches the block side whose outward normal opposes its own: the
/// near side for opposite senses, the far side for equal senses.
fn face_block_height(face: &SpaceFace, block: &Block, epsilon: f64) -> Option<f64> {
    let side = if face.sense == block.sense {
        block.far?
    } else {
        block.near
    };
    within(face.height, side, epsilon).then_some(side)
}

/// Blocks of equal sense stack far-to-near; blocks of opposite sense touch
/// near-to-near (back to back) or far-to-far.
fn block_block_height(a: &Block, b: &Block, epsilon: f64) -> Option<f64> {
    if std::ptr::eq(a, b) {
        return None;
    }
    let candidates: [(Option<f64>, Option<f64>); 2] = if a.sense == b.sense {
        [(a.far, Some(b.near)), (Some(a.near), b.far)]
    } else {
        [(Some(a.near), Some(b.near)), (a.far, b.far)]
    };

    // Lowest matching plane wins.
    candidates
        .iter()
        .filter_map(|pair| match *pair {
            (Some(x), Some(y)) if within(x, y, epsilon) => Some((x + y) / 2.0),
            _ => None,
        })
        .min_by(|x, y| x.total_cmp(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tests::{block, z_orientation};
    use crate::entity::SpaceFace;
    use approx::assert_relative_eq;

    const EPS: f64 = 1e-4;

    fn face(id: &str, height: f64, sense: bool, fp: Footprint) -> SpaceFace {
        SpaceFace::new(id, 0, z_orientation(), height, sense, fp)
    }

    fn unit() -> Footprint {
        Footprint::rectangle(0.0, 0.0, 1.0, 1.0)
    }

    #[test]
    fn faces_of_opposite_sense_connect_at_average_height() {
        let a = face("a", 3.0, true, unit());
        let b = face("b", 3.00008, false, unit());
        let (h, overlap) =
            try_connect(Entity::Face(&a), Entity::Face(&b), EPS, GraphMode::Transmission).unwrap();
        assert_relative_eq!(h, 3.00004, epsilon = 1e-12);
        assert_relative_eq!(overlap.regular_area(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn faces_of_same_sense_do_not_connect() {
        let a = face("a", 3.0, true, unit());
        let b = face("b", 3.0, true, unit());
        assert!(try_connect(Entity::Face(&a), Entity::Face(&b), EPS, GraphMode::Stacking).is_none());
    }

    #[test]
    fn face_does_not_connect_to_itself() {
        let a = face("a", 3.0, true, unit());
        assert!(try_connect(Entity::Face(&a), Entity::Face(&a), EPS, GraphMode::Stacking).is_none());
    }

    #[test]
    fn face_block_sense_rules() {
        // Room below z=3 with its ceiling face pointing up (+).
        let ceiling = face("room", 3.0, true, unit());
        // Slab 3.0..3.2 described from below: near face at 3.0 points down.
        let from_below = block("slab", false, 3.0, Some(3.2), unit());
        // Same slab described from above: near face at 3.2 points up.
        let from_above = block("slab", true, 3.2, Some(3.0), unit());
        // Halfblock whose only face points up at 3.0 does not face the room.
        let wrong_side = block("slab", true, 3.0, None, unit());

        let m = GraphMode::Stacking;
        assert_eq!(
            try_connect(Entity::Face(&ceiling), Entity::Block(&from_below), EPS, m).map(|r| r.0),
            Some(3.0)
        );
        assert_eq!(
            try_connect(Entity::Block(&from_above), Entity::Face(&ceiling), EPS, m).map(|r| r.0),
            Some(3.0)
        );
        assert!(try_connect(Entity::Face(&ceiling), Entity::Block(&wrong_side), EPS, m).is_none());
    }

    #[test]
    fn block_block_sense_rules() {
        let m = GraphMode::Stacking;
        // Stacked in the same direction: a spans 0..0.1, b spans 0.1..0.3.
        let a = block("a", false, 0.0, Some(0.1), unit());
        let b = block("b", false, 0.1, Some(0.3), unit());
        assert_eq!(
            try_connect(Entity::Block(&a), Entity::Block(&b), EPS, m).map(|r| r.0),
            Some(0.1)
        );
        assert_eq!(
            try_connect(Entity::Block(&b), Entity::Block(&a), EPS, m).map(|r| r.0),
            Some(0.1)
        );

        // Back to back: c extends down from 0.1, d extends up from 0.1.
        let c = block("c", true, 0.1, Some(0.0), unit());
        let d = block("d", false, 0.1, Some(0.3), unit());
        assert_eq!(
            try_connect(Entity::Block(&c), Entity::Block(&d), EPS, m).map(|r| r.0),
            Some(0.1)
        );

        // Far to far: e spans 0.3 down to 0.1, f spans -0.1 up to 0.1.
        let e = block("e", true, 0.3, Some(0.1), unit());
        let f = block("f", false, -0.1, Some(0.1), unit());
        assert_eq!(
            try_connect(Entity::Block(&e), Entity::Block(&f), EPS, m).map(|r| r.0),
            Some(0.1)
        );

        // Same sense, same span: overlapping material, not contact.
        let g = block("g", false, 0.0, Some(0.1), unit());
        assert!(try_connect(Entity::Block(&a), Entity::Block(&g), EPS, m).is_none());
    }

    #[test]
    fn fenestration_separated_only_for_transmission() {
        let wall = block("wall", false, 0.0, Some(0.1), unit());
        let mut window = block("window", false, 0.1, Some(0.2), unit());
        window.fenestration = true;

        assert!(try_connect(
            Entity::Block(&wall),
            Entity::Block(&window),
            EPS,
            GraphMode::Transmission
        )
        .is_none());
        assert!(try_connect(
            Entity::Block(&wall),
            Entity::Block(&window),
            EPS,
            GraphMode::Stacking
        )
        .is_some());
    }

    #[test]
    fn touching_footprints_do_not_connect() {
        let a = face("a", 0.0, true, Footprint::rectangle(0.0, 0.0, 1.0, 1.0));
        let b = face("b", 0.0, false, Footprint::rectangle(1.0, 0.0, 2.0, 1.0));
        assert!(try_connect(Entity::Face(&a), Entity::Face(&b), EPS, GraphMode::Stacking).is_none());
    }

    fn sample_arena(reverse: bool) -> EntityArena {
        let mut arena = EntityArena::new();
        let low = || face("low", 0.0, true, unit());
        let slab = || block("slab", false, 0.00005, Some(0.2), unit());
        let high = || face("high", 0.2, false, unit());
        let far = || block("far", false, 5.0, Some(5.2), unit());
        if reverse {
            arena.add_block(far());
            arena.add_face(high());
            arena.add_block(slab());
            arena.add_face(low());
        } else {
            arena.add_face(low());
            arena.add_block(slab());
            arena.add_face(high());
            arena.add_block(far());
        }
        arena
    }

    fn edge_set(arena: &EntityArena, graph: &ConnectivityGraph) -> Vec<(String, String, f64)> {
        let name = |node: usize| -> String {
            match arena.entity(graph.node_key(node)).unwrap() {
                Entity::Face(f) => f.space_id.clone(),
                Entity::Block(b) => b.layer.element_id.clone(),
            }
        };
        let mut set: Vec<(String, String, f64)> = graph
            .edges()
            .iter()
            .map(|e| {
                let (a, b) = (name(e.source), name(e.target));
                if a < b {
                    (a, b, e.height)
                } else {
                    (b, a, e.height)
                }
            })
            .collect();
        set.sort_by(|x, y| x.partial_cmp(y).unwrap());
        set
    }

    #[test]
    fn build_is_symmetric_and_order_independent() {
        let forward = sample_arena(false);
        let backward = sample_arena(true);
        let g1 = ConnectivityGraph::build(&forward, EPS, GraphMode::Transmission);
        let g2 = ConnectivityGraph::build(&backward, EPS, GraphMode::Transmission);

        let e1 = edge_set(&forward, &g1);
        assert_eq!(e1, edge_set(&backward, &g2));
        assert_eq!(
            e1,
            vec![
                ("high".to_string(), "slab".to_string(), 0.2),
                ("low".to_string(), "slab".to_string(), 0.00005),
            ]
        );

        // Adjacency is symmetric and there are no self loops.
        for edge in g1.edges() {
            assert_ne!(edge.source, edge.target);
            assert!(g1.neighbors(edge.source).any(|(n, _)| n == edge.target));
            assert!(g1.neighbors(edge.target).any(|(n, _)| n == edge.source));
        }
    }

    #[test]
    fn stacking_edges_carry_overlap() {
        let arena = sample_arena(false);
        let transmission = ConnectivityGraph::build(&arena, EPS, GraphMode::Transmission);
        let stacking = ConnectivityGraph::build(&arena, EPS, GraphMode::Stacking);
        assert!(transmission.edges().iter().all(|e| e.overlap.is_none()));
        assert!(stacking.edges().iter().all(|e| e.overlap.is_some()));
        assert_eq!(stacking.mode(), GraphMode::Stacking);
    }

    #[test]
    fn neighbors_at_filters_by_height() {
        let arena = sample_arena(false);
        let graph = ConnectivityGraph::build(&arena, EPS, GraphMode::Stacking);
        let slab = graph
            .node_index(EntityKey::Block(arena.blocks.keys().next().unwrap()))
            .unwrap();
        assert_eq!(graph.degree(slab), 2);
        assert_eq!(graph.neighbors_at(slab, 0.2).count(), 1);
        assert_eq!(graph.neighbors_at(slab, 0.0).count(), 1);
        assert_eq!(graph.neighbors_at(slab, 1.0).count(), 0);
    }
}
