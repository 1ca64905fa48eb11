// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Input building model: spaces with bounding faces and layered elements.
//!
//! Space faces are wound so that their right-hand normal points out of the room.
//! An element is a planar base face plus an ordered list of material layers
//! stacked along the base face's normal, first layer touching the base plane.

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A planar polygon with optional holes, in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub outer: Vec<[f64; 3]>,
    #[serde(default)]
    pub holes: Vec<Vec<[f64; 3]>>,
}

impl Polygon {
    /// Creates a polygon without holes.
    pub fn new(outer: Vec<[f64; 3]>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Adds a hole loop.
    pub fn with_hole(mut self, hole: Vec<[f64; 3]>) -> Self {
        self.holes.push(hole);
        self
    }

    pub(crate) fn outer_points(&self) -> Vec<Point3<f64>> {
        to_points(&self.outer)
    }

    pub(crate) fn hole_points(&self) -> Vec<Vec<Point3<f64>>> {
        self.holes.iter().map(|h| to_points(h)).collect()
    }
}

fn to_points(coords: &[[f64; 3]]) -> Vec<Point3<f64>> {
    coords.iter().map(|c| Point3::new(c[0], c[1], c[2])).collect()
}

/// An enclosed space (room) and its bounding faces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub faces: Vec<Polygon>,
}

/// Kind of building element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Wall,
    Slab,
    Roof,
    Column,
    Beam,
    Covering,
    Door,
    Window,
    Other,
}

impl ElementKind {
    /// Doors and windows are fenestration.
    pub fn is_fenestration(&self) -> bool {
        matches!(self, ElementKind::Door | ElementKind::Window)
    }
}

/// One material layer of an element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLayer {
    pub material: String,
    pub thickness: f64,
}

/// A building element made of stacked material layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub kind: ElementKind,
    pub base: Polygon,
    pub layers: Vec<MaterialLayer>,
}

/// Spaces and elements of one building.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildingModel {
    #[serde(default)]
    pub spaces: Vec<Space>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl BuildingModel {
    /// Parses a model from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
