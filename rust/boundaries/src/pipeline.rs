// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end computation: model in, boundary report out.

use rayon::prelude::*;
use serde::Serialize;

use crate::arena::EntityArena;
use crate::blocking::{build_blocks, build_space_faces};
use crate::config::{Options, TraversalLimits};
use crate::error::Result;
use crate::graph::{ConnectivityGraph, GraphMode};
use crate::model::BuildingModel;
use crate::stacking::{run_stacking, BlockStack, StackKind};
use crate::tolerance::{Orientation, ToleranceContext};
use crate::transmission::{run_transmission, TransmissionRecord};

/// Result of [`compute_space_boundaries`].
#[derive(Debug, Clone, Serialize)]
pub struct SpaceBoundaryReport {
    /// Unit direction of each orientation, indexed by [`Orientation::index`].
    pub orientations: Vec<[f64; 3]>,
    pub transmissions: Vec<TransmissionRecord>,
    pub stacks: Vec<BlockStack>,
    pub stats: ReportStats,
}

impl SpaceBoundaryReport {
    /// Transmission records starting at faces of `space_id`.
    pub fn transmissions_from<'a>(
        &'a self,
        space_id: &'a str,
    ) -> impl Iterator<Item = &'a TransmissionRecord> + 'a {
        self.transmissions
            .iter()
            .filter(move |r| r.start_space == space_id)
    }

    /// Block stacks touching `space_id` on either side.
    pub fn stacks_touching<'a>(&'a self, space_id: &'a str) -> impl Iterator<Item = &'a BlockStack> + 'a {
        self.stacks.iter().filter(move |s| {
            s.near_space == space_id || s.far_space.as_deref() == Some(space_id)
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportStats {
    pub space_faces: usize,
    pub blocks: usize,
    pub orientation_groups: usize,
    pub transmission_edges: usize,
    pub stacking_edges: usize,
    pub internal_transmissions: usize,
    pub external_transmissions: usize,
    pub blocked_transmissions: usize,
    pub open_stacks: usize,
    pub compute_time_ms: u64,
}

/// Outcome of one orientation group.
struct GroupOutcome {
    transmissions: Vec<TransmissionRecord>,
    stacks: Vec<BlockStack>,
    transmission_edges: usize,
    stacking_edges: usize,
}

/// Computes transmission records and block stacks for a building model.
///
/// Entities are grouped by orientation; groups share nothing and run in
/// parallel. Within a group, the transmission traversal runs first, then the
/// faces are restored and the stacking traversal runs on a fresh graph.
pub fn compute_space_boundaries(
    model: &BuildingModel,
    options: &Options,
) -> Result<SpaceBoundaryReport> {
    options.validate()?;
    let start = std::time::Instant::now();

    tracing::info!(
        spaces = model.spaces.len(),
        elements = model.elements.len(),
        tolerance = options.tolerance,
        "Starting space boundary computation"
    );

    let spaces: Vec<_> = model
        .spaces
        .iter()
        .filter(|s| options.accepts_space(&s.id))
        .cloned()
        .collect();
    let elements: Vec<_> = model
        .elements
        .iter()
        .filter(|e| options.accepts_element(&e.id))
        .cloned()
        .collect();

    let mut ctx = ToleranceContext::new(options.tolerance);
    let faces = build_space_faces(&spaces, &mut ctx)?;
    let blocks = build_blocks(&elements, &mut ctx, options.max_thickness)?;

    let mut stats = ReportStats {
        space_faces: faces.len(),
        blocks: blocks.len(),
        ..ReportStats::default()
    };

    let mut groups: Vec<EntityArena> = vec![EntityArena::new(); ctx.orientation_count()];
    for face in faces {
        groups[face.orientation.index() as usize].add_face(face);
    }
    for block in blocks {
        groups[block.orientation.index() as usize].add_block(block);
    }

    let limits = options.limits();
    let epsilon = ctx.epsilon();
    let outcomes = groups
        .into_par_iter()
        .enumerate()
        .filter(|(_, arena)| arena.face_count() > 0)
        .map(|(index, arena)| process_group(index, arena, epsilon, &limits))
        .collect::<Result<Vec<_>>>()?;

    stats.orientation_groups = outcomes.len();
    let mut transmissions = Vec::new();
    let mut stacks = Vec::new();
    for outcome in outcomes {
        stats.transmission_edges += outcome.transmission_edges;
        stats.stacking_edges += outcome.stacking_edges;
        transmissions.extend(outcome.transmissions);
        stacks.extend(outcome.stacks);
    }

    for record in &transmissions {
        if record.is_internal() {
            stats.internal_transmissions += 1;
        } else if record.external {
            stats.external_transmissions += 1;
        } else {
            stats.blocked_transmissions += 1;
        }
    }
    stats.open_stacks = stacks
        .iter()
        .filter(|s| matches!(s.kind, StackKind::Open | StackKind::TooThick))
        .count();
    stats.compute_time_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        transmissions = transmissions.len(),
        stacks = stacks.len(),
        groups = stats.orientation_groups,
        total_time_ms = stats.compute_time_ms,
        "Space boundary computation complete"
    );

    let orientations = (0..ctx.orientation_count() as u32)
        .filter_map(|i| ctx.direction(Orientation::from_index(i)))
        .map(|d| [d.x, d.y, d.z])
        .collect();

    Ok(SpaceBoundaryReport {
        orientations,
        transmissions,
        stacks,
        stats,
    })
}

fn process_group(
    index: usize,
    mut arena: EntityArena,
    epsilon: f64,
    limits: &TraversalLimits,
) -> Result<GroupOutcome> {
    let graph = ConnectivityGraph::build(&arena, epsilon, GraphMode::Transmission);
    let transmission_edges = graph.edge_count();
    let transmissions = run_transmission(&mut arena, &graph, limits)?;

    arena.reset_faces();
    let graph = ConnectivityGraph::build(&arena, epsilon, GraphMode::Stacking);
    let stacking_edges = graph.edge_count();
    let stacks = run_stacking(&mut arena, &graph, limits)?;

    tracing::debug!(
        orientation = index,
        faces = arena.face_count(),
        blocks = arena.block_count(),
        transmission_edges,
        stacking_edges,
        transmissions = transmissions.len(),
        stacks = stacks.len(),
        "Processed orientation group"
    );

    Ok(GroupOutcome {
        transmissions,
        stacks,
        transmission_edges,
        stacking_edges,
    })
}
