// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Instrument names written in the fringe of every line of a staff.

use stave_scene::{Fragment, GlyphMetrics, MarginController, NodeId, Scene};
use stave_units::{Point, Unit};

use crate::{NotationError, StaffGroup};

/// Margin layer that [`InstrumentName::register_margin_controllers`] writes to.
pub const INSTRUMENT_NAME_LAYER: &str = "instrument_name";

/// Measures text set in the instrument name font.
pub trait TextMetrics {
    /// Horizontal extent of `text`.
    fn text_width(&self, text: &str) -> Unit;
}

impl<F: Fn(&str) -> Unit> TextMetrics for F {
    fn text_width(&self, text: &str) -> Unit {
        self(text)
    }
}

/// One placed instrument name.
#[derive(Clone, Debug, PartialEq)]
pub struct NameText<'a> {
    /// The line the name is drawn on, if the staff is in a flowable.
    pub line: Option<usize>,
    /// Canvas anchor. The text is right-aligned and vertically centered on it.
    pub anchor: Point,
    /// The text to draw.
    pub text: &'a str,
}

/// An instrument name attached to a staff.
///
/// The name sits at `fringe_offset` from the top-left corner of the staff's fringe on
/// every line: right-aligned, vertically centered. Names cannot change within a staff.
#[derive(Clone, Debug, PartialEq)]
pub struct InstrumentName {
    staff: NodeId,
    fringe_offset: Point,
    first_line_text: String,
    later_lines_text: Option<String>,
}

impl InstrumentName {
    /// A name for `staff`, shown as `first_line_text` on every line.
    pub fn new(staff: NodeId, fringe_offset: Point, first_line_text: impl Into<String>) -> Self {
        Self {
            staff,
            fringe_offset,
            first_line_text: first_line_text.into(),
            later_lines_text: None,
        }
    }

    /// Builder-style text for lines after the first, such as an abbreviation. An empty
    /// string leaves later lines blank.
    pub fn with_later_lines_text(mut self, text: impl Into<String>) -> Self {
        self.later_lines_text = Some(text.into());
        self
    }

    /// The staff node.
    pub fn staff(&self) -> NodeId {
        self.staff
    }

    /// Offset from the top-left corner of the staff's fringe.
    pub fn fringe_offset(&self) -> Point {
        self.fringe_offset
    }

    /// The first line's text.
    pub fn first_line_text(&self) -> &str {
        &self.first_line_text
    }

    /// The text on lines after the first.
    pub fn later_lines_text(&self) -> &str {
        self.later_lines_text
            .as_deref()
            .unwrap_or(&self.first_line_text)
    }

    /// Room the name needs left of the fringe: its width, plus any gap a negative
    /// `fringe_offset.x` leaves between the text and the fringe.
    fn margin_for(&self, text: &str, metrics: &dyn TextMetrics) -> Unit {
        if text.is_empty() {
            return Unit::ZERO;
        }
        metrics.text_width(text) + (-self.fringe_offset.x).max(Unit::ZERO)
    }

    /// Register the margins `names` need on every flowable containing one of their staves.
    ///
    /// Each staff gets a controller at its start for the first line's text and one a
    /// base unit later for the later lines' text. Names whose staves start together share
    /// the widest margin. Controllers previously registered on [`INSTRUMENT_NAME_LAYER`]
    /// are replaced. Returns the number registered.
    pub fn register_margin_controllers(
        names: &[Self],
        scene: &mut Scene,
        metrics: &dyn TextMetrics,
    ) -> Result<usize, NotationError> {
        let mut by_flowable: Vec<(NodeId, Vec<(Unit, Unit)>)> = Vec::new();
        for name in names {
            let Some(flowable) = scene.flowable_of(name.staff)? else {
                continue;
            };
            let staff_x = scene.descendant_pos_x(name.staff, flowable)?;
            let first = name.margin_for(name.first_line_text(), metrics);
            let later = name.margin_for(name.later_lines_text(), metrics);
            let entries = [(staff_x, first), (staff_x + Unit::graphic(1.0), later)];
            match by_flowable.iter_mut().find(|(f, _)| *f == flowable) {
                Some((_, xs)) => xs.extend(entries),
                None => by_flowable.push((flowable, entries.to_vec())),
            }
        }

        let mut registered = 0;
        for (flowable, mut entries) in by_flowable {
            entries.sort_by(|a, b| a.0.base_value().total_cmp(&b.0.base_value()));
            let mut widest: Vec<(Unit, Unit)> = Vec::with_capacity(entries.len());
            for (x, margin) in entries {
                match widest.last_mut() {
                    Some((at, width)) if *at == x => *width = width.max(margin),
                    _ => widest.push((x, margin)),
                }
            }
            scene.clear_margin_layer(flowable, INSTRUMENT_NAME_LAYER)?;
            for (x, margin) in widest {
                scene.add_margin_controller(
                    flowable,
                    MarginController::new(x, margin).with_layer(INSTRUMENT_NAME_LAYER),
                )?;
                registered += 1;
            }
        }
        tracing::debug!(registered, names = names.len(), "registered instrument name margins");
        Ok(registered)
    }

    /// Where to draw the name for one of its staff's render fragments. Blank text gives
    /// `None`.
    pub fn placement(
        &self,
        group: &mut StaffGroup,
        scene: &Scene,
        fragment: &Fragment,
        glyphs: &dyn GlyphMetrics,
    ) -> Result<Option<NameText<'_>>, NotationError> {
        let text = match fragment {
            Fragment::Complete { .. } | Fragment::BeforeBreak { .. } => self.first_line_text(),
            Fragment::SpanningContinuation { .. } | Fragment::AfterBreak { .. } => {
                self.later_lines_text()
            }
        };
        if text.is_empty() {
            return Ok(None);
        }
        let fringe = group.fringe_layout_at(scene, self.staff, fragment.line(), glyphs)?;
        Ok(Some(NameText {
            line: fragment.line(),
            anchor: fragment.start() + self.fringe_offset + Point::new(fringe.staff, Unit::ZERO),
            text,
        }))
    }

    /// Every placement of the name, in line order. The scene must be committed.
    pub fn placements(
        &self,
        group: &mut StaffGroup,
        scene: &Scene,
        glyphs: &dyn GlyphMetrics,
    ) -> Result<Vec<NameText<'_>>, NotationError> {
        let mut out = Vec::new();
        for fragment in scene.fragments(self.staff)? {
            if let Some(text) = self.placement(group, scene, &fragment, glyphs)? {
                out.push(text);
            }
        }
        Ok(out)
    }
}
