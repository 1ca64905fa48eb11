// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Computation options, loadable from serde sources or environment variables.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DEFAULT_TOLERANCE: f64 = 1e-4;
const DEFAULT_MAX_THICKNESS: f64 = 1.0;
const DEFAULT_MAX_DEPTH: usize = 256;

/// Options for one space boundary computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Distance within which heights, coordinates and directions are merged.
    pub tolerance: f64,
    /// Accumulated layer thickness beyond which a path stops transmitting.
    /// Single layers thicker than this are treated as opaque halfblocks.
    pub max_thickness: f64,
    /// Maximum number of entities on one traversal path.
    pub max_depth: usize,
    /// If set, only spaces with these ids are considered.
    pub space_filter: Option<Vec<String>>,
    /// If set, only elements with these ids are considered.
    pub element_filter: Option<Vec<String>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_thickness: DEFAULT_MAX_THICKNESS,
            max_depth: DEFAULT_MAX_DEPTH,
            space_filter: None,
            element_filter: None,
        }
    }
}

impl Options {
    /// Load options from environment variables, falling back to defaults.
    ///
    /// Reads `SB_TOLERANCE`, `SB_MAX_THICKNESS` and `SB_MAX_DEPTH`.
    pub fn from_env() -> Self {
        Self {
            tolerance: std::env::var("SB_TOLERANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOLERANCE),
            max_thickness: std::env::var("SB_MAX_THICKNESS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_THICKNESS),
            max_depth: std::env::var("SB_MAX_DEPTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_DEPTH),
            space_filter: None,
            element_filter: None,
        }
    }

    /// Rejects options no computation can run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(self.max_thickness.is_finite() && self.max_thickness > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "max_thickness must be positive, got {}",
                self.max_thickness
            )));
        }
        if self.max_depth == 0 {
            return Err(Error::InvalidOptions("max_depth must be at least 1".into()));
        }
        Ok(())
    }

    /// Returns `true` if the space passes `space_filter`.
    pub fn accepts_space(&self, id: &str) -> bool {
        accepts(&self.space_filter, id)
    }

    /// Returns `true` if the element passes `element_filter`.
    pub fn accepts_element(&self, id: &str) -> bool {
        accepts(&self.element_filter, id)
    }

    pub fn limits(&self) -> TraversalLimits {
        TraversalLimits {
            max_thickness: self.max_thickness,
            max_depth: self.max_depth,
        }
    }
}

fn accepts(filter: &Option<Vec<String>>, id: &str) -> bool {
    filter
        .as_ref()
        .map(|ids| ids.iter().any(|i| i == id))
        .unwrap_or(true)
}

/// Bounds shared by both traversals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraversalLimits {
    pub max_thickness: f64,
    pub max_depth: usize,
}
