// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The spanner component: a second anchor attached to a node.
//!
//! A node's own position is the spanner's start. The end is given relative to another node
//! (or the spanner node itself). Beams, slurs, hairpins, and other lines between two
//! points are spanners.

use stave_units::{Point, Unit};

use crate::{NodeId, Scene, SceneError};

/// The node an end position is relative to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpannerEnd {
    /// The spanner node itself, so the end is relative to the start.
    SelfNode,
    /// Another node.
    Node(NodeId),
}

/// How the end's y position is determined.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EndY {
    /// Level with the start, whatever the end node's position.
    Horizontal,
    /// A fixed y position relative to the end node.
    Fixed(Unit),
}

/// An end anchor for a node.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Spanner {
    /// The end's x position relative to `end_parent`.
    pub end_x: Unit,
    /// The node the end is relative to.
    pub end_parent: SpannerEnd,
    /// The end's y position.
    pub end_y: EndY,
}

impl Spanner {
    /// A horizontal spanner ending `end_x` from `end_parent`.
    pub const fn horizontal(end_x: Unit, end_parent: SpannerEnd) -> Self {
        Self {
            end_x,
            end_parent,
            end_y: EndY::Horizontal,
        }
    }

    /// A spanner ending at `end_pos` relative to `end_parent`.
    pub const fn ending_at(end_pos: Point, end_parent: SpannerEnd) -> Self {
        Self {
            end_x: end_pos.x,
            end_parent,
            end_y: EndY::Fixed(end_pos.y),
        }
    }

    fn end_node(&self, owner: NodeId) -> NodeId {
        match self.end_parent {
            SpannerEnd::SelfNode => owner,
            SpannerEnd::Node(node) => node,
        }
    }
}

impl Scene {
    /// Attach a spanner to `id`, replacing any previous one.
    ///
    /// Both ends must be in the same flowable, or both outside any flowable, and the end
    /// must lie to the right of the start.
    pub fn set_spanner(&mut self, id: NodeId, spanner: Spanner) -> Result<(), SceneError> {
        self.check_spanner(id, &spanner)?;
        self.node_mut(id)?.spanner = Some(spanner);
        Ok(())
    }

    /// Detach and return the spanner of `id`.
    pub fn clear_spanner(&mut self, id: NodeId) -> Result<Option<Spanner>, SceneError> {
        Ok(self.node_mut(id)?.spanner.take())
    }

    /// The spanner attached to `id`.
    pub fn spanner(&self, id: NodeId) -> Result<Option<&Spanner>, SceneError> {
        Ok(self.node(id)?.spanner.as_ref())
    }

    fn require_spanner(&self, id: NodeId) -> Result<&Spanner, SceneError> {
        self.spanner(id)?.ok_or(SceneError::DegenerateSpanner(id))
    }

    /// The end position relative to the end node.
    pub fn spanner_end_pos(&self, id: NodeId) -> Result<Point, SceneError> {
        let spanner = self.require_spanner(id)?;
        let y = match spanner.end_y {
            EndY::Fixed(y) => y,
            EndY::Horizontal => self.map_to(spanner.end_node(id), id)?.y,
        };
        Ok(Point::new(spanner.end_x, y))
    }

    /// The end position relative to the spanner's start.
    pub fn spanner_relative_end(&self, id: NodeId) -> Result<Point, SceneError> {
        let spanner = self.require_spanner(id)?;
        let to_end_node = self.map_to(id, spanner.end_node(id))?;
        Ok(to_end_node + self.spanner_end_pos(id)?)
    }

    /// The horizontal distance from start to end.
    pub fn spanner_x_length(&self, id: NodeId) -> Result<Unit, SceneError> {
        Ok(self.spanner_relative_end(id)?.x)
    }

    /// The straight-line distance from start to end.
    pub fn spanner_2d_length(&self, id: NodeId) -> Result<Unit, SceneError> {
        Ok(self.spanner_relative_end(id)?.hypot())
    }

    /// The angle from start to end in degrees, clockwise since y grows downward.
    pub fn spanner_angle(&self, id: NodeId) -> Result<f64, SceneError> {
        let end = self.spanner_relative_end(id)?;
        Ok(end.y.base_value().atan2(end.x.base_value()).to_degrees())
    }

    /// The point at `ratio` along the spanner, relative to its start.
    ///
    /// `0.0` is the start and `1.0` the end; other ratios extrapolate along the same line.
    pub fn point_along_spanner(&self, id: NodeId, ratio: f64) -> Result<Point, SceneError> {
        Ok(self.spanner_relative_end(id)? * ratio)
    }

    /// The extent of `id` that may be split across lines.
    ///
    /// Spanners use their x length; other nodes use [`LocalNode::breakable_length`](crate::LocalNode::breakable_length).
    pub fn breakable_length(&self, id: NodeId) -> Result<Unit, SceneError> {
        match self.node(id)?.spanner {
            Some(_) => self.spanner_x_length(id),
            None => Ok(self.node(id)?.local.breakable_length),
        }
    }

    pub(crate) fn check_spanner(&self, id: NodeId, spanner: &Spanner) -> Result<(), SceneError> {
        let end = spanner.end_node(id);
        if self.flowable_of(id)? != self.flowable_of(end)? {
            return Err(SceneError::SpannerFlowableMismatch(id));
        }
        let to_end_node = self.map_to(id, end)?;
        if to_end_node.x + spanner.end_x <= Unit::ZERO {
            return Err(SceneError::DegenerateSpanner(id));
        }
        Ok(())
    }
}
