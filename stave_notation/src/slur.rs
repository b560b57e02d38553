// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slurs and ties: filled arcs between two anchors.

use kurbo::BezPath;
use stave_scene::{LocalNode, NodeId, Scene, Spanner, SpannerEnd};
use stave_units::{Point, Unit};

use crate::path::{curve_to, line_to, move_to};
use crate::{NotationError, SpannerPath, Staff};

/// Up or down the page.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalDirection {
    /// Toward the top of the page.
    #[default]
    Up,
    /// Toward the bottom of the page.
    Down,
}

impl VerticalDirection {
    /// `-1.0` for up, since y grows downward.
    pub(crate) fn sign(self) -> f64 {
        match self {
            Self::Up => -1.0,
            Self::Down => 1.0,
        }
    }
}

/// Shape of a slur or tie, in staff units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ArcConfig {
    /// Which way the arc bulges.
    pub direction: VerticalDirection,
    /// Height of the arc's inner curve. Derived from the arc's length when `None`.
    pub height: Option<f64>,
    /// Horizontal offset of the curve control points from the ends. Derived from the arc's
    /// length when `None`.
    pub arch_length: Option<f64>,
    /// Thickness at the middle.
    pub midpoint_thickness: f64,
    /// Thickness at the ends.
    pub endpoint_thickness: f64,
}

impl ArcConfig {
    /// Builder-style direction.
    pub const fn with_direction(mut self, direction: VerticalDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Builder-style fixed height.
    pub const fn with_height(mut self, height: f64) -> Self {
        self.height = Some(height);
        self
    }

    /// Builder-style fixed arch length.
    pub const fn with_arch_length(mut self, arch_length: f64) -> Self {
        self.arch_length = Some(arch_length);
        self
    }
}

impl Default for ArcConfig {
    fn default() -> Self {
        Self {
            direction: VerticalDirection::Up,
            height: None,
            arch_length: None,
            midpoint_thickness: 0.22,
            endpoint_thickness: 0.1,
        }
    }
}

/// Linear ramp from `low` at 4 staff units of length to `high` at 10, clamped outside.
fn ramp(length_in_units: f64, low: f64, high: f64) -> f64 {
    const SHORT: f64 = 4.0;
    const LONG: f64 = 10.0;
    if length_in_units > LONG {
        high
    } else if length_in_units < SHORT {
        low
    } else {
        low + (high - low) * (length_in_units - SHORT) / (LONG - SHORT)
    }
}

/// The arc outline from the origin to `end`, both relative to the arc's start.
fn arc_path(end: Point, length: Unit, unit: Unit, config: &ArcConfig) -> BezPath {
    let in_units = length / unit;
    let height = unit * config.height.unwrap_or_else(|| ramp(in_units, 0.75, 2.0));
    let arch = unit * config.arch_length.unwrap_or_else(|| ramp(in_units, 0.0, 1.0));
    let sign = config.direction.sign();
    let mid = height * sign;
    let mid_outer = mid + unit * (config.midpoint_thickness * sign);
    let end_outer = unit * (config.endpoint_thickness * sign);

    let mut path = BezPath::new();
    move_to(&mut path, Point::new(Unit::ZERO, end_outer));
    curve_to(
        &mut path,
        Point::new(arch, mid_outer),
        Point::new(end.x - arch, end.y + mid_outer),
        Point::new(end.x, end.y + end_outer),
    );
    line_to(&mut path, end);
    curve_to(
        &mut path,
        Point::new(end.x - arch, end.y + mid),
        Point::new(arch, mid),
        Point::ORIGIN,
    );
    path
}

fn insert_arc(
    scene: &mut Scene,
    parent: NodeId,
    pos: Point,
    spanner: Spanner,
) -> Result<NodeId, NotationError> {
    let node = scene.insert(Some(parent), LocalNode::at(pos))?;
    if let Err(err) = scene.set_spanner(node, spanner) {
        if let Err(cleanup) = scene.remove(node) {
            tracing::warn!(%node, %cleanup, "could not remove arc node");
        }
        return Err(err.into());
    }
    Ok(node)
}

/// A slur between two arbitrary points.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Slur {
    node: NodeId,
    unit: Unit,
    config: ArcConfig,
}

impl Slur {
    /// Insert a slur starting at `pos` relative to `parent` and ending at `end_pos`
    /// relative to `end_parent`.
    ///
    /// Its shape is measured in `staff`'s units. The end must lie to the right of the start.
    pub fn insert(
        scene: &mut Scene,
        staff: &Staff,
        parent: NodeId,
        pos: Point,
        end_parent: SpannerEnd,
        end_pos: Point,
        config: ArcConfig,
    ) -> Result<Self, NotationError> {
        let node = insert_arc(scene, parent, pos, Spanner::ending_at(end_pos, end_parent))?;
        Ok(Self {
            node,
            unit: staff.unit(1.0),
            config,
        })
    }

    /// The arc shape.
    pub fn config(&self) -> &ArcConfig {
        &self.config
    }
}

impl SpannerPath for Slur {
    fn node(&self) -> NodeId {
        self.node
    }

    fn local_path(&self, scene: &Scene) -> Result<BezPath, NotationError> {
        let end = scene.spanner_relative_end(self.node)?;
        Ok(arc_path(end, end.hypot(), self.unit, &self.config))
    }
}

/// A tie: a slur whose end is level with its start.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Tie {
    node: NodeId,
    unit: Unit,
    config: ArcConfig,
}

impl Tie {
    /// Insert a tie starting at `pos` relative to `parent` and ending `end_x` right of
    /// `end_parent`.
    pub fn insert(
        scene: &mut Scene,
        staff: &Staff,
        parent: NodeId,
        pos: Point,
        end_parent: SpannerEnd,
        end_x: Unit,
        config: ArcConfig,
    ) -> Result<Self, NotationError> {
        let node = insert_arc(scene, parent, pos, Spanner::horizontal(end_x, end_parent))?;
        Ok(Self {
            node,
            unit: staff.unit(1.0),
            config,
        })
    }

    /// The arc shape.
    pub fn config(&self) -> &ArcConfig {
        &self.config
    }
}

impl SpannerPath for Tie {
    fn node(&self) -> NodeId {
        self.node
    }

    fn local_path(&self, scene: &Scene) -> Result<BezPath, NotationError> {
        let length = scene.spanner_x_length(self.node)?;
        let end = Point::new(length, Unit::ZERO);
        Ok(arc_path(end, length, self.unit, &self.config))
    }
}
