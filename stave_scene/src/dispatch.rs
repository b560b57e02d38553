// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render dispatch: splitting nodes into fragments at line breaks.
//!
//! A node inside a flowable whose breakable length runs past the end of its line is
//! rendered as a [`Fragment::BeforeBreak`], any number of
//! [`Fragment::SpanningContinuation`]s covering whole lines, and a final
//! [`Fragment::AfterBreak`]. Everything else is rendered as one [`Fragment::Complete`].

use stave_units::{Point, Unit};

use crate::{LayoutSummary, NewLine, NodeFlags, NodeId, NodeRole, Scene, SceneError};

/// One rendering call planned for a node, in canvas space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Fragment {
    /// The whole node at once.
    Complete {
        /// Canvas position of the node.
        pos: Point,
        /// The flowable line the node is on, if it is in a flowable.
        line: Option<usize>,
        /// The node's flowable x position, if it is in a flowable.
        flowable_x: Option<Unit>,
        /// The node's breakable length.
        length: Unit,
    },
    /// The first piece, from the node's start to the end of its first line.
    BeforeBreak {
        /// Index of the line.
        line: usize,
        /// Where this piece starts in the node's local x space (always zero).
        local_start_x: Unit,
        /// Canvas position of the node's start.
        start: Point,
        /// Canvas position of the line end, level with `start`.
        stop: Point,
        /// Distance from the line's start to the node's start.
        ///
        /// A node starting within one base unit of its line's end is moved to the next
        /// line, so this and `start.x` can be up to one unit left of that line's start.
        dist_to_line_start: Unit,
    },
    /// A middle piece covering a whole line.
    SpanningContinuation {
        /// Index of the line.
        line: usize,
        /// Where this piece starts in the node's local x space.
        local_start_x: Unit,
        /// Canvas position of the line start.
        start: Point,
        /// Canvas position of the line end.
        stop: Point,
    },
    /// The last piece, from a line start to the node's end.
    AfterBreak {
        /// Index of the line.
        line: usize,
        /// Where this piece starts in the node's local x space.
        local_start_x: Unit,
        /// Canvas position of the line start.
        start: Point,
        /// Canvas position of the node's end.
        stop: Point,
    },
}

impl Fragment {
    /// The flowable line of this fragment.
    pub fn line(&self) -> Option<usize> {
        match *self {
            Self::Complete { line, .. } => line,
            Self::BeforeBreak { line, .. }
            | Self::SpanningContinuation { line, .. }
            | Self::AfterBreak { line, .. } => Some(line),
        }
    }

    /// The canvas position this fragment starts at.
    pub fn start(&self) -> Point {
        match *self {
            Self::Complete { pos, .. } => pos,
            Self::BeforeBreak { start, .. }
            | Self::SpanningContinuation { start, .. }
            | Self::AfterBreak { start, .. } => start,
        }
    }

    /// The `(start, length)` of the node's local x range this fragment covers.
    pub fn local_span(&self) -> (Unit, Unit) {
        match *self {
            Self::Complete { length, .. } => (Unit::ZERO, length),
            Self::BeforeBreak {
                local_start_x,
                start,
                stop,
                ..
            }
            | Self::SpanningContinuation {
                local_start_x,
                start,
                stop,
                ..
            }
            | Self::AfterBreak {
                local_start_x,
                start,
                stop,
                ..
            } => (local_start_x, stop.x - start.x),
        }
    }

    /// The fragment's horizontal extent as a Kurbo line in base units.
    pub fn to_kurbo_line(&self) -> kurbo::Line {
        let start = self.start();
        let (_, length) = self.local_span();
        kurbo::Line::new(start.to_kurbo(), start.with_x(start.x + length).to_kurbo())
    }

    /// Invoke the sink hook matching this fragment.
    pub fn dispatch<S: RenderSink + ?Sized>(&self, sink: &mut S, ctx: &RenderContext<'_>) {
        match *self {
            Self::Complete { pos, .. } => sink.render_complete(ctx, pos),
            Self::BeforeBreak {
                local_start_x,
                start,
                stop,
                dist_to_line_start,
                ..
            } => sink.render_before_break(ctx, local_start_x, start, stop, dist_to_line_start),
            Self::SpanningContinuation {
                local_start_x,
                start,
                stop,
                ..
            } => sink.render_spanning_continuation(ctx, local_start_x, start, stop),
            Self::AfterBreak {
                local_start_x,
                start,
                ..
            } => sink.render_after_break(ctx, local_start_x, start),
        }
    }
}

/// What a [`RenderSink`] hook is rendering.
#[derive(Copy, Clone, Debug)]
pub struct RenderContext<'a> {
    /// The scene being rendered.
    pub scene: &'a Scene,
    /// The node being rendered.
    pub node: NodeId,
    /// The flowable containing the node, if any.
    pub flowable: Option<NodeId>,
    /// The fragment being rendered.
    pub fragment: &'a Fragment,
}

impl RenderContext<'_> {
    /// The flowable line the fragment is on.
    pub fn line(&self) -> Option<&NewLine> {
        let flowable = self.scene.flowable(self.flowable?).ok()?;
        flowable.lines().ok()?.get(self.fragment.line()?)
    }
}

/// Receives rendering calls from [`Scene::render`].
///
/// Each node produces exactly one `render_complete` call, or a `render_before_break`
/// call, zero or more `render_spanning_continuation` calls, and a `render_after_break`
/// call. All hooks default to doing nothing.
pub trait RenderSink {
    /// Render a whole node at `pos`.
    fn render_complete(&mut self, _ctx: &RenderContext<'_>, _pos: Point) {}

    /// Render the piece of a node before its first line break.
    fn render_before_break(
        &mut self,
        _ctx: &RenderContext<'_>,
        _local_start_x: Unit,
        _start: Point,
        _stop: Point,
        _dist_to_line_start: Unit,
    ) {
    }

    /// Render a piece of a node covering a whole line.
    fn render_spanning_continuation(
        &mut self,
        _ctx: &RenderContext<'_>,
        _local_start_x: Unit,
        _start: Point,
        _stop: Point,
    ) {
    }

    /// Render the piece of a node after its last line break.
    fn render_after_break(&mut self, _ctx: &RenderContext<'_>, _local_start_x: Unit, _start: Point) {}
}

impl Scene {
    /// Plan the fragments `id` renders as, without rendering.
    ///
    /// Nodes starting within one base unit of their line's end begin on the next line.
    pub fn fragments(&self, id: NodeId) -> Result<Vec<Fragment>, SceneError> {
        if let Some(spanner) = self.spanner(id)? {
            self.check_spanner(id, spanner)?;
        }
        let breakable = self.breakable_length(id)?;
        let Some(flowable_id) = self.flowable_of(id)? else {
            return Ok(vec![Fragment::Complete {
                pos: self.canvas_pos(id)?,
                line: None,
                flowable_x: None,
                length: breakable,
            }]);
        };

        let flowable = self.flowable(flowable_id)?;
        let lines = flowable.lines()?;
        let pos = self.descendant_pos(id, flowable_id)?;
        let mut first = flowable.last_break_index_at(pos.x)?;
        let mut first_length = lines[first].flowable_end_x() - pos.x;
        let mut remaining = breakable - first_length;
        if remaining > Unit::ZERO && first_length < Unit::graphic(1.0) && first + 1 < lines.len() {
            first += 1;
            first_length = lines[first].flowable_end_x() - pos.x;
            remaining = breakable - first_length;
        }

        let line = &lines[first];
        let start = line.canvas_pos + Point::new(pos.x - line.flowable_x, pos.y);
        if remaining <= Unit::ZERO {
            return Ok(vec![Fragment::Complete {
                pos: start,
                line: Some(first),
                flowable_x: Some(pos.x),
                length: breakable,
            }]);
        }

        let mut out = vec![Fragment::BeforeBreak {
            line: first,
            local_start_x: Unit::ZERO,
            start,
            stop: start.with_x(start.x + first_length),
            dist_to_line_start: pos.x - line.flowable_x,
        }];
        for (index, line) in lines.iter().enumerate().skip(first + 1) {
            let start = line.canvas_pos + Point::new(Unit::ZERO, pos.y);
            let local_start_x = breakable - remaining;
            if remaining > line.length {
                out.push(Fragment::SpanningContinuation {
                    line: index,
                    local_start_x,
                    start,
                    stop: start.with_x(start.x + line.length),
                });
                remaining -= line.length;
            } else {
                out.push(Fragment::AfterBreak {
                    line: index,
                    local_start_x,
                    start,
                    stop: start.with_x(start.x + remaining),
                });
                return Ok(out);
            }
        }
        Err(SceneError::OutOfBounds {
            flowable_x: pos.x + breakable,
            covered: flowable.covered_length()?,
        })
    }

    /// Commit the layout, then render every visible node on every page into `sink`.
    ///
    /// Nodes are visited depth-first in paint order. A node without
    /// [`NodeFlags::VISIBLE`] is skipped along with its descendants. Flowables, pages and
    /// the document root are containers and are not rendered themselves.
    pub fn render<S: RenderSink + ?Sized>(
        &mut self,
        sink: &mut S,
    ) -> Result<LayoutSummary, SceneError> {
        let summary = self.commit()?;
        let scene: &Self = self;
        for index in 0..scene.page_count() {
            if let Some(page) = scene.page_id(index) {
                scene.render_children(page, sink)?;
            }
        }
        Ok(summary)
    }

    fn render_children<S: RenderSink + ?Sized>(
        &self,
        id: NodeId,
        sink: &mut S,
    ) -> Result<(), SceneError> {
        for &child in self.children(id)? {
            if !self.flags(child)?.contains(NodeFlags::VISIBLE) {
                continue;
            }
            if self.role(child)? == NodeRole::Object {
                let flowable = self.flowable_of(child)?;
                for fragment in self.fragments(child)? {
                    tracing::trace!(node = %child, ?fragment, "dispatching fragment");
                    let ctx = RenderContext {
                        scene: self,
                        node: child,
                        flowable,
                        fragment: &fragment,
                    };
                    fragment.dispatch(sink, &ctx);
                }
            }
            self.render_children(child, sink)?;
        }
        Ok(())
    }
}
