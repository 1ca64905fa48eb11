// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Space Boundaries
//!
//! Determines what bounds every face of every room in a building model: which
//! material layers lie behind it, and whether beyond those layers there is
//! another room, the exterior, or nothing that was modeled.
//!
//! Room faces and element layers are brought into per-orientation 2D frames
//! ([`blocking`]), snapped onto shared coordinates ([`tolerance`]) and stored
//! in an [`EntityArena`]. A [`ConnectivityGraph`] connects every pair of
//! entities whose heights match and whose footprints overlap. Two traversals
//! walk that graph from each room face:
//!
//! - [`transmission`] follows the layers a face sees straight through the
//!   assembly, producing [`TransmissionRecord`]s.
//! - [`stacking`] partitions a face into [`BlockStack`]s, one per distinct
//!   sequence of layers up to the next surface.
//!
//! Both attribute every part of a face's footprint to exactly one result.
//!
//! ```no_run
//! use space_boundaries::{compute_space_boundaries, BuildingModel, Options};
//!
//! # fn main() -> space_boundaries::Result<()> {
//! let model = BuildingModel::from_json(r#"{ "spaces": [], "elements": [] }"#)?;
//! let report = compute_space_boundaries(&model, &Options::from_env())?;
//! println!("{}", report.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod arena;
pub mod blocking;
pub mod config;
pub mod entity;
pub mod error;
pub mod graph;
pub mod keys;
pub mod model;
pub mod pipeline;
pub mod stacking;
pub mod tolerance;
pub mod transmission;

pub use arena::EntityArena;
pub use blocking::{build_blocks, build_space_faces};
pub use config::{Options, TraversalLimits};
pub use entity::{Block, Entity, LayerRef, SpaceFace};
pub use error::{Error, Result};
pub use graph::{try_connect, ConnectivityGraph, GraphEdge, GraphMode};
pub use keys::{BlockKey, EntityKey, SpaceFaceKey};
pub use model::{BuildingModel, Element, ElementKind, MaterialLayer, Polygon, Space};
pub use pipeline::{compute_space_boundaries, ReportStats, SpaceBoundaryReport};
pub use stacking::{run_stacking, trace_stacks, BlockStack, StackKind, StackingSequence};
pub use tolerance::{Orientation, ToleranceContext};
pub use transmission::{run_transmission, trace_transmissions, TransmissionRecord};

pub use space_boundaries_geometry::Footprint;
