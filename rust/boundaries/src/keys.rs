// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity key types for arena-based storage.
//!
//! Space faces and blocks live in separate slot maps. Keys stay valid for the
//! lifetime of the arena, which lets traversals hold handles to the face whose
//! remaining footprint they shrink.

use slotmap::new_key_type;

new_key_type! {
    /// Key for a room-bounding face.
    pub struct SpaceFaceKey;

    /// Key for a material block.
    pub struct BlockKey;
}

/// A key that can reference either kind of connectable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKey {
    Face(SpaceFaceKey),
    Block(BlockKey),
}

impl EntityKey {
    /// Returns the face key, if this is a face.
    pub fn as_face(&self) -> Option<SpaceFaceKey> {
        match self {
            EntityKey::Face(k) => Some(*k),
            EntityKey::Block(_) => None,
        }
    }

    /// Returns the block key, if this is a block.
    pub fn as_block(&self) -> Option<BlockKey> {
        match self {
            EntityKey::Face(_) => None,
            EntityKey::Block(k) => Some(*k),
        }
    }
}

impl From<SpaceFaceKey> for EntityKey {
    fn from(k: SpaceFaceKey) -> Self {
        EntityKey::Face(k)
    }
}

impl From<BlockKey> for EntityKey {
    fn from(k: BlockKey) -> Self {
        EntityKey::Block(k)
    }
}
