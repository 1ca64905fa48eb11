// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Space Boundaries Geometry Primitives
//!
//! 2D footprint algebra using i_overlay and planar polygon embedding using
//! nalgebra. These are the primitives the connectivity engine needs: overlap,
//! subtraction, emptiness and area of footprints, and a way to bring 3D
//! planar polygons into a shared per-orientation 2D frame.

pub mod error;
pub mod footprint;
pub mod plane;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector3};

pub use error::{Error, Result};
pub use footprint::{Footprint, MIN_AREA_THRESHOLD};
pub use plane::{polygon_normal, OrientedArea, PlaneFrame};
