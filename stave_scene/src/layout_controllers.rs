// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Records attached to flowable positions that shape its layout.

use std::borrow::Cow;
use std::collections::BTreeMap;

use stave_units::{Point, Unit};

/// Margin layer used when a controller does not name one.
pub const DEFAULT_MARGIN_LAYER: &str = "default";

/// A laid-out line of a flowable.
///
/// Lines are generated by [`Scene::commit`](crate::Scene::commit) and are read-only.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLine {
    /// Top-left corner of the line, relative to its page.
    pub pos: Point,
    /// Index of the page this line appears on.
    pub page: usize,
    /// Where this line starts in the flowable's local space.
    pub flowable_x: Unit,
    /// The line length.
    pub length: Unit,
    /// The line height.
    pub height: Unit,
    /// Top-left corner of the line in canvas space.
    pub canvas_pos: Point,
}

impl NewLine {
    /// The flowable x position where this line ends.
    pub fn flowable_end_x(&self) -> Unit {
        self.flowable_x + self.length
    }

    /// Bottom-right corner of the line, relative to its page.
    pub fn doc_end_pos(&self) -> Point {
        Point::new(self.pos.x + self.length, self.pos.y + self.height)
    }
}

/// A left margin applied to flowable lines starting at or after `flowable_x`.
///
/// Controllers on different layers add up; within a layer the latest controller wins.
#[derive(Clone, Debug, PartialEq)]
pub struct MarginController {
    /// Position in the flowable's local space where this margin takes effect.
    pub flowable_x: Unit,
    /// The left margin contributed by this controller.
    pub margin_left: Unit,
    /// Independent margin contributors use separate layers.
    pub layer: Cow<'static, str>,
}

impl MarginController {
    /// A controller on the [`DEFAULT_MARGIN_LAYER`].
    pub fn new(flowable_x: Unit, margin_left: Unit) -> Self {
        Self {
            flowable_x,
            margin_left,
            layer: Cow::Borrowed(DEFAULT_MARGIN_LAYER),
        }
    }

    /// Builder-style layer.
    pub fn with_layer(mut self, layer: impl Into<Cow<'static, str>>) -> Self {
        self.layer = layer.into();
        self
    }
}

/// Any controller affecting a flowable's layout, ordered by flowable position.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutController {
    /// A generated line start.
    NewLine(NewLine),
    /// A registered margin change.
    Margin(MarginController),
}

impl LayoutController {
    /// The controller's position in flowable space.
    pub fn flowable_x(&self) -> Unit {
        match self {
            Self::NewLine(line) => line.flowable_x,
            Self::Margin(margin) => margin.flowable_x,
        }
    }
}

/// Insert a margin controller, keeping `controllers` sorted by `flowable_x`.
///
/// An identical controller is not added twice. A controller with the same position and
/// layer as an existing one replaces it.
pub(crate) fn insert_margin_controller(
    controllers: &mut Vec<MarginController>,
    controller: MarginController,
) {
    if controllers.contains(&controller) {
        return;
    }
    controllers.retain(|c| !(c.flowable_x == controller.flowable_x && c.layer == controller.layer));
    let at = controllers.partition_point(|c| c.flowable_x <= controller.flowable_x);
    controllers.insert(at, controller);
}

/// Sum of the latest margin per layer at or before `flowable_x`.
pub(crate) fn margin_at(controllers: &[MarginController], flowable_x: Unit) -> Unit {
    let mut latest: BTreeMap<&str, Unit> = BTreeMap::new();
    for c in controllers.iter().take_while(|c| c.flowable_x <= flowable_x) {
        latest.insert(&c.layer, c.margin_left);
    }
    latest.into_values().sum()
}
