// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paper geometry and the page provider contract.

use stave_units::{Point, Unit};

/// Visual gap between pages laid out on the canvas.
pub const DEFAULT_PAGE_GAP: Unit = Unit::mm(150.0);

/// A paper geometry used to lay out pages.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Paper {
    /// Full paper width.
    pub width: Unit,
    /// Full paper height.
    pub height: Unit,
    /// Top margin.
    pub margin_top: Unit,
    /// Right margin.
    pub margin_right: Unit,
    /// Bottom margin.
    pub margin_bottom: Unit,
    /// Left margin.
    pub margin_left: Unit,
    /// Binding gutter, excluded from the live width.
    pub gutter: Unit,
}

impl Paper {
    /// A4 portrait with 20mm margins.
    pub const A4: Self = Self::new(
        Unit::mm(210.0),
        Unit::mm(297.0),
        Unit::mm(20.0),
        Unit::mm(20.0),
        Unit::mm(20.0),
        Unit::mm(20.0),
        Unit::ZERO,
    );

    /// US letter portrait with 1 inch margins.
    pub const LETTER: Self = Self::new(
        Unit::inch(8.5),
        Unit::inch(11.0),
        Unit::inch(1.0),
        Unit::inch(1.0),
        Unit::inch(1.0),
        Unit::inch(1.0),
        Unit::ZERO,
    );

    /// Create a paper geometry.
    pub const fn new(
        width: Unit,
        height: Unit,
        margin_top: Unit,
        margin_right: Unit,
        margin_bottom: Unit,
        margin_left: Unit,
        gutter: Unit,
    ) -> Self {
        Self {
            width,
            height,
            margin_top,
            margin_right,
            margin_bottom,
            margin_left,
            gutter,
        }
    }

    /// Width of the area inside the margins and gutter.
    pub fn live_width(&self) -> Unit {
        self.width - self.gutter - self.margin_left - self.margin_right
    }

    /// Height of the area inside the margins.
    pub fn live_height(&self) -> Unit {
        self.height - self.margin_bottom - self.margin_top
    }

    /// A 90-degree clockwise rotation of this paper. The gutter is unchanged.
    pub fn make_rotation(&self) -> Self {
        Self::new(
            self.height,
            self.width,
            self.margin_left,
            self.margin_top,
            self.margin_right,
            self.margin_bottom,
            self.gutter,
        )
    }
}

impl Default for Paper {
    fn default() -> Self {
        Self::A4
    }
}

/// Supplies page geometry to a [`Scene`](crate::Scene).
///
/// Pages are requested by index and may be created on demand as flowable content
/// overflows, so every index must be answerable.
pub trait PageProvider: core::fmt::Debug {
    /// Canvas position of the top-left corner of a page's live area.
    fn page_origin(&self, index: usize) -> Point;

    /// Width of a page's live area.
    fn live_width(&self, index: usize) -> Unit;

    /// Height of a page's live area.
    fn live_height(&self, index: usize) -> Unit;
}

/// Pages of a single paper size laid out left to right on the canvas.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PaperPages {
    /// Geometry shared by every page.
    pub paper: Paper,
    /// Horizontal gap between consecutive pages.
    pub page_gap: Unit,
}

impl PaperPages {
    /// Pages of `paper` separated by [`DEFAULT_PAGE_GAP`].
    pub const fn new(paper: Paper) -> Self {
        Self {
            paper,
            page_gap: DEFAULT_PAGE_GAP,
        }
    }

    /// Builder-style page gap.
    pub const fn with_page_gap(mut self, gap: Unit) -> Self {
        self.page_gap = gap;
        self
    }
}

impl Default for PaperPages {
    fn default() -> Self {
        Self::new(Paper::default())
    }
}

impl PageProvider for PaperPages {
    #[allow(
        clippy::cast_precision_loss,
        reason = "Page counts stay far below f64 integer precision."
    )]
    fn page_origin(&self, index: usize) -> Point {
        let page_x = (self.paper.width + self.page_gap) * index as f64;
        Point::new(
            page_x + self.paper.margin_left + self.paper.gutter,
            self.paper.margin_top,
        )
    }

    fn live_width(&self, _index: usize) -> Unit {
        self.paper.live_width()
    }

    fn live_height(&self, _index: usize) -> Unit {
        self.paper.live_height()
    }
}
