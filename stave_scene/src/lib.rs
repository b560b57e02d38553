// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stave Scene: an arena scene graph with flowable line breaking for music engraving.
//!
//! - Represents a hierarchy of positioned nodes under a document root and its pages.
//! - Maps positions between arbitrary nodes through their lowest common ancestor.
//! - Lays out *flowables*: virtual single-strip coordinate spaces whose descendants wrap
//!   across lines and pages.
//! - Dispatches each node's rendering as one complete fragment, or as a before-break,
//!   spanning-continuation and after-break sequence when it crosses line breaks.
//!
//! ## Logical and canvas space
//!
//! Every node has a position relative to its parent. [`Scene::map_to`] works purely in this
//! logical (pre-wrap) space. The on-screen position of a node inside a flowable depends on
//! which line it lands on, so it is only available through [`Scene::canvas_pos`] after
//! [`Scene::commit`] has laid out the flowable's lines.
//!
//! ## API overview
//!
//! - [`Scene`]: the per-document context owning nodes, pages and flowable layouts.
//! - [`LocalNode`]: per-node local data (position, breakable length, flags).
//! - [`NodeId`]: generational handle of a node; [`NodeRole`] tags its structural role.
//! - [`FlowableConfig`]: length, line height, padding and break threshold of a flowable.
//! - [`NewLine`] and [`MarginController`]: the layout controllers of a flowable.
//! - [`Spanner`]: an end anchor attached to a node, making it breakable over its x length.
//! - [`Fragment`] and [`RenderSink`]: the render dispatch protocol.
//! - [`GlyphMetrics`]: the glyph metrics provider contract.
//!
//! Key operations:
//! - [`Scene::insert`] / [`Scene::insert_flowable`] → [`NodeId`]
//! - [`Scene::commit`] → [`LayoutSummary`]; regenerates flowable lines.
//! - [`Scene::canvas_pos`] and [`Scene::fragments`] for line-aware positions.
//! - [`Scene::render`] to drive a [`RenderSink`].
//!
//! # Example
//!
//! ```rust
//! use stave_scene::{FlowableConfig, Fragment, LocalNode, Scene};
//! use stave_units::{Point, Unit};
//!
//! let mut scene = Scene::default();
//! let flowable = scene
//!     .insert_flowable(None, Point::ORIGIN, FlowableConfig::new(Unit::mm(500.0), Unit::mm(20.0)))
//!     .unwrap();
//! // A 200mm long object starting near the end of the first 170mm line.
//! let slur = scene
//!     .insert(
//!         Some(flowable),
//!         LocalNode::at(Point::new(Unit::mm(150.0), Unit::ZERO))
//!             .with_breakable_length(Unit::mm(200.0)),
//!     )
//!     .unwrap();
//!
//! let summary = scene.commit().unwrap();
//! assert_eq!(summary.lines, 3);
//!
//! let fragments = scene.fragments(slur).unwrap();
//! assert!(matches!(fragments[0], Fragment::BeforeBreak { .. }));
//! assert!(matches!(fragments[1], Fragment::SpanningContinuation { .. }));
//! assert!(matches!(fragments[2], Fragment::AfterBreak { .. }));
//! ```

mod dispatch;
mod flowable;
mod glyph;
mod layout_controllers;
pub mod mapping;
mod paper;
mod scene;
mod spanner;
mod types;

pub use dispatch::{Fragment, RenderContext, RenderSink};
pub use flowable::{Flowable, FlowableConfig};
pub use glyph::{CachedGlyphMetrics, GlyphInfo, GlyphMetrics, GlyphTable};
pub use layout_controllers::{
    DEFAULT_MARGIN_LAYER, LayoutController, MarginController, NewLine,
};
pub use paper::{DEFAULT_PAGE_GAP, PageProvider, Paper, PaperPages};
pub use scene::{LayoutSummary, Scene, SceneConfig};
pub use spanner::{EndY, Spanner, SpannerEnd};
pub use types::{LocalNode, NodeFlags, NodeId, NodeRole};

use stave_units::{Unit, UnitError};

/// Errors reported by scene operations.
///
/// Every variant names the violated precondition. These are structural or configuration
/// errors; none of them is transient.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// The handle refers to a node that was removed.
    #[error("node {0} is not alive")]
    StaleNode(NodeId),
    /// Two nodes share no common ancestor.
    #[error("nodes {src} and {dst} have no common ancestor")]
    NoCommonAncestor {
        /// The node mapped from.
        src: NodeId,
        /// The node mapped to.
        dst: NodeId,
    },
    /// A node was expected to be an ancestor of another but is not.
    #[error("{ancestor} is not an ancestor of {node}")]
    NotAnAncestor {
        /// The node walked up from.
        node: NodeId,
        /// The node expected on its ancestor chain.
        ancestor: NodeId,
    },
    /// A flowable-space position lies beyond the flowable's laid-out lines.
    #[error("flowable x {flowable_x} is outside the covered length {covered}")]
    OutOfBounds {
        /// The requested position.
        flowable_x: Unit,
        /// The total length covered by the flowable's lines.
        covered: Unit,
    },
    /// A canvas-space query was made before the flowable was laid out.
    #[error("layout of flowable {0} is stale; commit the scene first")]
    LayoutStale(NodeId),
    /// The node is not a flowable.
    #[error("node {0} is not a flowable")]
    NotAFlowable(NodeId),
    /// The operation needs a flowable ancestor but the node has none.
    #[error("node {0} is not inside a flowable")]
    NoFlowable(NodeId),
    /// Flowables cannot contain other flowables.
    #[error("flowable would be nested inside flowable {0}")]
    NestedFlowable(NodeId),
    /// Document and page nodes cannot be moved, removed or given arbitrary children.
    #[error("node {0} is a structural node")]
    StructuralNode(NodeId),
    /// Reparenting would make a node its own ancestor.
    #[error("reparenting {0} would create a cycle")]
    Cycle(NodeId),
    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A line would have no room on its page.
    #[error("line {line} of flowable {flowable} has no room on page {page}")]
    DegenerateLine {
        /// The flowable being laid out.
        flowable: NodeId,
        /// Index of the line that could not be placed.
        line: usize,
        /// Page the line was placed on.
        page: usize,
    },
    /// A spanner's end does not lie to the right of its start.
    #[error("spanner {0} has no positive x length")]
    DegenerateSpanner(NodeId),
    /// A spanner's endpoints are in different flowables, or only one is in a flowable.
    #[error("spanner {0} ends in a different flowable than it starts")]
    SpannerFlowableMismatch(NodeId),
    /// The glyph metrics provider has no entry for a glyph.
    #[error("glyph {name:?} (alternate {alternate:?}) not found")]
    GlyphNotFound {
        /// The requested glyph name.
        name: String,
        /// The requested alternate, if any.
        alternate: Option<usize>,
    },
    /// A unit could not be constructed.
    #[error(transparent)]
    Unit(#[from] UnitError),
}
