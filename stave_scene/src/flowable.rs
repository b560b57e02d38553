// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Flowable configuration, line generation, and flowable-space queries.

use stave_units::{Point, Unit};

use crate::layout_controllers::{LayoutController, MarginController, NewLine, margin_at};
use crate::{NodeId, PageProvider, SceneError};

/// The geometry of a flowable.
///
/// All fields may be changed after construction through
/// [`Scene::set_flowable_config`](crate::Scene::set_flowable_config) and friends; any change
/// marks the flowable's layout stale until the next [`Scene::commit`](crate::Scene::commit).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FlowableConfig {
    /// Total length of the virtual strip.
    pub length: Unit,
    /// Height of every line.
    pub height: Unit,
    /// Vertical gap between consecutive lines on the same page.
    pub y_padding: Unit,
    /// Maximum amount a line may be shortened to end on a break opportunity.
    ///
    /// Zero disables break opportunities entirely.
    pub break_threshold: Unit,
}

impl FlowableConfig {
    /// Default gap between lines.
    pub const DEFAULT_Y_PADDING: Unit = Unit::mm(5.0);

    /// Default break opportunity threshold.
    pub const DEFAULT_BREAK_THRESHOLD: Unit = Unit::mm(5.0);

    /// A flowable with the default padding and break threshold.
    pub const fn new(length: Unit, height: Unit) -> Self {
        Self {
            length,
            height,
            y_padding: Self::DEFAULT_Y_PADDING,
            break_threshold: Self::DEFAULT_BREAK_THRESHOLD,
        }
    }

    /// Builder-style line padding.
    pub const fn with_y_padding(mut self, y_padding: Unit) -> Self {
        self.y_padding = y_padding;
        self
    }

    /// Builder-style break threshold.
    pub const fn with_break_threshold(mut self, break_threshold: Unit) -> Self {
        self.break_threshold = break_threshold;
        self
    }

    /// Check that every field is finite and non-negative.
    pub fn validate(&self) -> Result<(), SceneError> {
        let checks = [
            (self.length, "flowable length must be finite and non-negative"),
            (self.height, "flowable height must be finite and non-negative"),
            (self.y_padding, "flowable y padding must be finite and non-negative"),
            (
                self.break_threshold,
                "flowable break threshold must be finite and non-negative",
            ),
        ];
        for (value, message) in checks {
            if !value.base_value().is_finite() || value < Unit::ZERO {
                return Err(SceneError::InvalidConfig(message));
            }
        }
        Ok(())
    }
}

/// Where a flowable's first line begins.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct FlowableStart {
    /// Index of the page containing the flowable.
    pub page: usize,
    /// The flowable's position relative to that page.
    pub pos: Point,
}

/// Lay out the lines of a flowable.
///
/// `break_opportunities` are flowable x positions and must be sorted. The returned lines
/// are sorted by `flowable_x`, start at zero, and their lengths sum to `config.length`.
pub(crate) fn generate_lines(
    flowable: NodeId,
    config: &FlowableConfig,
    margins: &[MarginController],
    start: FlowableStart,
    break_opportunities: &[Unit],
    pages: &dyn PageProvider,
) -> Result<Vec<NewLine>, SceneError> {
    let mut lines: Vec<NewLine> = Vec::new();
    let mut x_progress = Unit::ZERO;
    loop {
        let margin = margin_at(margins, x_progress);
        let (page, pos) = match lines.last() {
            None => (start.page, Point::new(start.pos.x + margin, start.pos.y)),
            Some(last) => {
                let y = last.pos.y + config.height + config.y_padding;
                if y + config.height > pages.live_height(last.page) {
                    (last.page + 1, Point::new(margin, Unit::ZERO))
                } else {
                    (last.page, Point::new(margin, y))
                }
            }
        };

        let max_length = pages.live_width(page) - pos.x;
        if max_length <= Unit::ZERO {
            return Err(SceneError::DegenerateLine {
                flowable,
                line: lines.len(),
                page,
            });
        }
        let max_end = x_progress + max_length;
        let opportunity = break_opportunities
            .iter()
            .rev()
            .find(|opp| **opp > x_progress && **opp < max_end);
        let mut length = match opportunity {
            Some(opp) if max_end - *opp < config.break_threshold => *opp - x_progress,
            _ => max_length,
        };

        let remaining = config.length - x_progress;
        let is_last = length >= remaining;
        if is_last {
            length = remaining;
        }
        lines.push(NewLine {
            pos,
            page,
            flowable_x: x_progress,
            length,
            height: config.height,
            canvas_pos: pages.page_origin(page) + pos,
        });
        if is_last {
            return Ok(lines);
        }
        x_progress += length;
    }
}

/// A flowable's configuration, margin controllers, and generated lines.
#[derive(Clone, Debug)]
pub struct Flowable {
    id: NodeId,
    config: FlowableConfig,
    margin_controllers: Vec<MarginController>,
    lines: Vec<NewLine>,
    stale: bool,
}

impl Flowable {
    pub(crate) fn new(id: NodeId, config: FlowableConfig) -> Self {
        Self {
            id,
            config,
            margin_controllers: Vec::new(),
            lines: Vec::new(),
            stale: true,
        }
    }

    /// The node owning this flowable.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The flowable's geometry.
    pub fn config(&self) -> &FlowableConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut FlowableConfig {
        self.stale = true;
        &mut self.config
    }

    /// Registered margin controllers, sorted by `flowable_x`.
    pub fn margin_controllers(&self) -> &[MarginController] {
        &self.margin_controllers
    }

    pub(crate) fn margin_controllers_mut(&mut self) -> &mut Vec<MarginController> {
        self.stale = true;
        &mut self.margin_controllers
    }

    /// Whether the lines are out of date with respect to the scene.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub(crate) fn mark_stale(&mut self) {
        self.stale = true;
    }

    pub(crate) fn set_lines(&mut self, lines: Vec<NewLine>) {
        self.lines = lines;
        self.stale = false;
    }

    /// The generated lines, in flowable order.
    pub fn lines(&self) -> Result<&[NewLine], SceneError> {
        if self.stale {
            return Err(SceneError::LayoutStale(self.id));
        }
        Ok(&self.lines)
    }

    /// Every layout controller, sorted by `flowable_x`.
    ///
    /// A line comes before a margin controller at the same position.
    pub fn layout_controllers(&self) -> Result<Vec<LayoutController>, SceneError> {
        let mut all: Vec<LayoutController> = self
            .lines()?
            .iter()
            .cloned()
            .map(LayoutController::NewLine)
            .chain(
                self.margin_controllers
                    .iter()
                    .cloned()
                    .map(LayoutController::Margin),
            )
            .collect();
        all.sort_by(|a, b| {
            a.flowable_x()
                .base_value()
                .total_cmp(&b.flowable_x().base_value())
        });
        Ok(all)
    }

    /// The total length covered by the generated lines.
    pub fn covered_length(&self) -> Result<Unit, SceneError> {
        Ok(self.lines()?.iter().map(|line| line.length).sum())
    }

    /// Index of the line containing `flowable_x`.
    ///
    /// Accurate to within one base unit. Positions before the flowable start belong to the
    /// first line.
    pub fn last_break_index_at(&self, flowable_x: Unit) -> Result<usize, SceneError> {
        let lines = self.lines()?;
        let mut remaining = flowable_x;
        for (i, line) in lines.iter().enumerate() {
            remaining -= line.length;
            if remaining.base_value() < 0.0 {
                return Ok(i);
            }
        }
        if remaining.base_value() <= 1.0 && !lines.is_empty() {
            return Ok(lines.len() - 1);
        }
        Err(SceneError::OutOfBounds {
            flowable_x,
            covered: self.covered_length()?,
        })
    }

    /// The line containing `flowable_x`.
    pub fn last_break_at(&self, flowable_x: Unit) -> Result<&NewLine, SceneError> {
        let index = self.last_break_index_at(flowable_x)?;
        Ok(&self.lines()?[index])
    }

    /// Convert a point in flowable space into canvas space.
    pub fn map_to_canvas(&self, local: Point) -> Result<Point, SceneError> {
        let line = self.last_break_at(local.x)?;
        Ok(line.canvas_pos + Point::new(local.x - line.flowable_x, local.y))
    }

    /// Distance from the start of the line containing `flowable_x` to `flowable_x`.
    pub fn dist_to_line_start(&self, flowable_x: Unit) -> Result<Unit, SceneError> {
        let line = self.last_break_at(flowable_x)?;
        Ok(flowable_x - line.flowable_x)
    }

    /// Distance from `flowable_x` to the end of the line containing it.
    pub fn dist_to_line_end(&self, flowable_x: Unit) -> Result<Unit, SceneError> {
        let line = self.last_break_at(flowable_x)?;
        Ok(line.flowable_end_x() - flowable_x)
    }
}
