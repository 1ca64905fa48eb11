// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for the entities of one orientation group.
//!
//! The [`EntityArena`] owns every [`SpaceFace`] and [`Block`] of a group.
//! Graphs and traversals refer to them through [`EntityKey`]s, so a traversal
//! can shrink one face's remaining footprint while holding only handles to the
//! rest. Iteration follows insertion order.

use slotmap::SlotMap;

use crate::entity::{Block, Entity, SpaceFace};
use crate::keys::*;

/// Owner of the faces and blocks that share one orientation.
#[derive(Debug, Clone, Default)]
pub struct EntityArena {
    pub(crate) faces: SlotMap<SpaceFaceKey, SpaceFace>,
    pub(crate) blocks: SlotMap<BlockKey, Block>,
}

impl EntityArena {
    /// Creates a new, empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Face operations ---

    /// Adds a face and returns its key.
    pub fn add_face(&mut self, face: SpaceFace) -> SpaceFaceKey {
        self.faces.insert(face)
    }

    /// Returns the face for the given key, or `None` if not found.
    pub fn face(&self, key: SpaceFaceKey) -> Option<&SpaceFace> {
        self.faces.get(key)
    }

    /// Returns the face for the given key mutably.
    pub fn face_mut(&mut self, key: SpaceFaceKey) -> Option<&mut SpaceFace> {
        self.faces.get_mut(key)
    }

    /// Face keys in insertion order.
    pub fn face_keys(&self) -> Vec<SpaceFaceKey> {
        self.faces.keys().collect()
    }

    /// Returns the number of faces in the arena.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Restores every face's remaining footprint.
    pub fn reset_faces(&mut self) {
        for face in self.faces.values_mut() {
            face.reset();
        }
    }

    // --- Block operations ---

    /// Adds a block and returns its key.
    pub fn add_block(&mut self, block: Block) -> BlockKey {
        self.blocks.insert(block)
    }

    /// Returns the block for the given key, or `None` if not found.
    pub fn block(&self, key: BlockKey) -> Option<&Block> {
        self.blocks.get(key)
    }

    /// Returns the number of blocks in the arena.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    // --- Mixed access ---

    /// Returns a view of the entity behind `key`.
    pub fn entity(&self, key: EntityKey) -> Option<Entity<'_>> {
        match key {
            EntityKey::Face(k) => self.faces.get(k).map(Entity::Face),
            EntityKey::Block(k) => self.blocks.get(k).map(Entity::Block),
        }
    }

    /// All entity keys: faces first, then blocks, each in insertion order.
    pub fn entity_keys(&self) -> impl Iterator<Item = EntityKey> + '_ {
        self.faces
            .keys()
            .map(EntityKey::Face)
            .chain(self.blocks.keys().map(EntityKey::Block))
    }

    /// Returns `true` if the given key references a live entity.
    pub fn contains(&self, key: EntityKey) -> bool {
        match key {
            EntityKey::Face(k) => self.faces.contains_key(k),
            EntityKey::Block(k) => self.blocks.contains_key(k),
        }
    }
}
