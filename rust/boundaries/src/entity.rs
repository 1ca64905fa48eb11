// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Connectable entities: room-bounding faces and material blocks.
//!
//! Both kinds live at one orientation, carry a 2D footprint in that
//! orientation's frame, and have a sense. For a [`SpaceFace`] the sense is the
//! direction of its outward normal (out of the room). For a [`Block`] it is
//! the outward normal of its near face; the far face, when there is one,
//! points the other way.

use serde::{Deserialize, Serialize};
use space_boundaries_geometry::Footprint;

use crate::tolerance::Orientation;

/// Reference to the element layer a block was cut from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerRef {
    pub element_id: String,
    pub layer_index: usize,
    pub material: String,
    pub thickness: f64,
}

/// A room-bounding face at one height.
///
/// `remaining` starts out equal to `footprint` and shrinks as traversals
/// attribute parts of the face to results.
#[derive(Debug, Clone)]
pub struct SpaceFace {
    pub space_id: String,
    pub face_index: usize,
    pub orientation: Orientation,
    pub height: f64,
    pub sense: bool,
    footprint: Footprint,
    remaining: Footprint,
}

impl SpaceFace {
    pub fn new(
        space_id: impl Into<String>,
        face_index: usize,
        orientation: Orientation,
        height: f64,
        sense: bool,
        footprint: Footprint,
    ) -> Self {
        Self {
            space_id: space_id.into(),
            face_index,
            orientation,
            height,
            sense,
            remaining: footprint.clone(),
            footprint,
        }
    }

    /// The face's full footprint.
    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    /// The part of the footprint not yet attributed to any result.
    pub fn remaining(&self) -> &Footprint {
        &self.remaining
    }

    /// Removes `area` from the remaining footprint.
    pub fn consume(&mut self, area: &Footprint) {
        self.remaining = self.remaining.difference(area);
    }

    /// Takes the whole remaining footprint, leaving nothing behind.
    pub fn take_remaining(&mut self) -> Footprint {
        std::mem::take(&mut self.remaining)
    }

    /// Restores the remaining footprint to the full footprint.
    pub fn reset(&mut self) {
        self.remaining = self.footprint.clone();
    }
}

/// A slab of material spanning one or two heights.
///
/// A block without a far height is a halfblock: its far side is not modeled
/// and nothing can be reached through it.
#[derive(Debug, Clone)]
pub struct Block {
    pub layer: LayerRef,
    pub orientation: Orientation,
    pub sense: bool,
    pub near: f64,
    pub far: Option<f64>,
    pub footprint: Footprint,
    pub fenestration: bool,
}

impl Block {
    /// Returns `true` if the block has no far side.
    pub fn is_halfblock(&self) -> bool {
        self.far.is_none()
    }

    /// Distance between near and far side; zero for halfblocks.
    pub fn thickness(&self) -> f64 {
        self.far.map(|far| (far - self.near).abs()).unwrap_or(0.0)
    }

    /// The height on the other side of the block from `entered`, if any.
    ///
    /// For a block thinner than the tolerance both sides match `entered`;
    /// the side further away wins.
    pub fn opposite_height(&self, entered: f64) -> Option<f64> {
        let far = self.far?;
        if (far - entered).abs() >= (self.near - entered).abs() {
            Some(far)
        } else {
            Some(self.near)
        }
    }
}

/// Borrowed view over either kind of connectable entity.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Face(&'a SpaceFace),
    Block(&'a Block),
}

impl<'a> Entity<'a> {
    /// Height(s) of the entity: a face has one, a block has near and
    /// optionally far.
    pub fn heights(&self) -> (f64, Option<f64>) {
        match self {
            Entity::Face(f) => (f.height, None),
            Entity::Block(b) => (b.near, b.far),
        }
    }

    /// The footprint used for overlap tests.
    pub fn footprint(&self) -> &'a Footprint {
        match self {
            Entity::Face(f) => &f.footprint,
            Entity::Block(b) => &b.footprint,
        }
    }

    pub fn thickness(&self) -> f64 {
        match self {
            Entity::Face(_) => 0.0,
            Entity::Block(b) => b.thickness(),
        }
    }

    /// Only halfblocks end a path.
    pub fn is_terminal(&self) -> bool {
        match self {
            Entity::Face(_) => false,
            Entity::Block(b) => b.is_halfblock(),
        }
    }

    pub fn to_layer(&self) -> Option<&'a LayerRef> {
        match self {
            Entity::Face(_) => None,
            Entity::Block(b) => Some(&b.layer),
        }
    }

    pub fn sense(&self) -> bool {
        match self {
            Entity::Face(f) => f.sense,
            Entity::Block(b) => b.sense,
        }
    }

    pub fn orientation(&self) -> Orientation {
        match self {
            Entity::Face(f) => f.orientation,
            Entity::Block(b) => b.orientation,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tolerance::ToleranceContext;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    pub(crate) fn z_orientation() -> Orientation {
        let mut ctx = ToleranceContext::new(1e-6);
        ctx.request_orientation(&Vector3::z()).unwrap().0
    }

    pub(crate) fn layer(element_id: &str) -> LayerRef {
        LayerRef {
            element_id: element_id.to_string(),
            layer_index: 0,
            material: "concrete".to_string(),
            thickness: 0.2,
        }
    }

    pub(crate) fn block(
        id: &str,
        sense: bool,
        near: f64,
        far: Option<f64>,
        footprint: Footprint,
    ) -> Block {
        Block {
            layer: layer(id),
            orientation: z_orientation(),
            sense,
            near,
            far,
            footprint,
            fenestration: false,
        }
    }

    #[test]
    fn face_entity_properties() {
        let face = SpaceFace::new(
            "room",
            0,
            z_orientation(),
            3.0,
            true,
            Footprint::rectangle(0.0, 0.0, 2.0, 2.0),
        );
        let e = Entity::Face(&face);
        assert_eq!(e.heights(), (3.0, None));
        assert_eq!(e.thickness(), 0.0);
        assert!(!e.is_terminal());
        assert!(e.to_layer().is_none());
        assert!(e.sense());
    }

    #[test]
    fn block_thickness_and_terminal() {
        let full = block("w", false, 1.0, Some(1.25), Footprint::rectangle(0.0, 0.0, 1.0, 1.0));
        let half = block("w", false, 1.0, None, Footprint::rectangle(0.0, 0.0, 1.0, 1.0));

        assert_relative_eq!(Entity::Block(&full).thickness(), 0.25);
        assert!(!Entity::Block(&full).is_terminal());
        assert_eq!(Entity::Block(&half).thickness(), 0.0);
        assert!(Entity::Block(&half).is_terminal());
        assert_eq!(Entity::Block(&half).to_layer().unwrap().element_id, "w");
    }

    #[test]
    fn opposite_height_picks_the_far_side() {
        let b = block("w", false, 1.0, Some(1.25), Footprint::empty());
        assert_eq!(b.opposite_height(1.0), Some(1.25));
        assert_eq!(b.opposite_height(1.25), Some(1.0));
        let half = block("w", false, 1.0, None, Footprint::empty());
        assert_eq!(half.opposite_height(1.0), None);
    }

    #[test]
    fn consume_and_reset_face() {
        let mut face = SpaceFace::new(
            "room",
            0,
            z_orientation(),
            0.0,
            true,
            Footprint::rectangle(0.0, 0.0, 2.0, 2.0),
        );
        face.consume(&Footprint::rectangle(0.0, 0.0, 1.0, 2.0));
        assert_relative_eq!(face.remaining().regular_area(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(face.footprint().regular_area(), 4.0, epsilon = 1e-9);

        let taken = face.take_remaining();
        assert_relative_eq!(taken.regular_area(), 2.0, epsilon = 1e-9);
        assert!(face.remaining().is_empty());

        face.reset();
        assert_relative_eq!(face.remaining().regular_area(), 4.0, epsilon = 1e-9);
    }
}
