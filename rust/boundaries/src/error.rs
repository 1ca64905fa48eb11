// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for space boundary computation.

/// Result type alias for space boundary operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a space boundary computation.
///
/// Degenerate geometry and open-ended boundaries are not errors; they show up
/// as missing or open results instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A value lies within tolerance of two distinct canonical values.
    #[error("value {value} is within tolerance of both {lower} and {upper}")]
    NonTransitive { value: f64, lower: f64, upper: f64 },

    /// A direction lies within tolerance of two distinct canonical orientations.
    #[error("direction {direction:?} matches orientations {first} and {second}")]
    NonTransitiveOrientation {
        direction: [f64; 3],
        first: u32,
        second: u32,
    },

    /// NaN or infinite input where a real value is required.
    #[error("non-finite value {0}")]
    NonFiniteValue(f64),

    /// A direction vector has no length.
    #[error("direction has zero length")]
    DegenerateDirection,

    /// An orientation handle issued by a different tolerance context.
    #[error("orientation {0} is not known to this tolerance context")]
    UnknownOrientation(u32),

    /// A traversal went deeper than the configured limit.
    #[error("traversal depth exceeded the limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    /// The computation options are unusable.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// The input model could not be deserialized.
    #[error("model parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Geometry primitive failure.
    #[error("geometry error: {0}")]
    Geometry(#[from] space_boundaries_geometry::Error),
}
