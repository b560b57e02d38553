// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene: node identifiers, roles, flags, and local node data.

use core::fmt;

use stave_units::{Point, Unit};

/// Identifier for a node in the scene.
///
/// This is a small, copyable handle that stays stable across updates but becomes
/// invalid when the underlying slot is reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// Use [`Scene::is_alive`](crate::Scene::is_alive) to check whether a `NodeId` still refers to a
/// live node. Operations given a stale id fail with [`SceneError::StaleNode`](crate::SceneError::StaleNode).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.0, self.1)
    }
}

/// The structural role a node plays in the scene.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// The single document root. It has no parent and sits at the canvas origin.
    Document,
    /// A page, always a direct child of the document root.
    Page {
        /// The 0-based page index.
        index: usize,
    },
    /// A flowable coordinate space whose descendants wrap across lines and pages.
    Flowable,
    /// Any other positioned object.
    Object,
}

bitflags::bitflags! {
    /// Node flags controlling rendering and layout participation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Node is visible (participates in the render pass).
        const VISIBLE           = 0b0000_0001;
        /// Node marks a preferred line break position in its flowable.
        const BREAK_OPPORTUNITY = 0b0000_0010;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// Local data for a node.
#[derive(Clone, Debug, Default)]
pub struct LocalNode {
    /// Position relative to the parent.
    pub pos: Point,
    /// Extent along the flow axis that may be split across lines.
    ///
    /// Zero means the node is never split. Nodes carrying a
    /// [`Spanner`](crate::Spanner) use the spanner's x length instead.
    pub breakable_length: Unit,
    /// Visibility and layout flags.
    pub flags: NodeFlags,
}

impl LocalNode {
    /// A visible node at `pos` with no breakable length.
    pub fn at(pos: Point) -> Self {
        Self {
            pos,
            ..Default::default()
        }
    }

    /// Builder-style breakable length.
    pub fn with_breakable_length(mut self, length: Unit) -> Self {
        self.breakable_length = length;
        self
    }

    /// Builder-style flags.
    pub fn with_flags(mut self, flags: NodeFlags) -> Self {
        self.flags = flags;
        self
    }
}
