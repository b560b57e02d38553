// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Axis-aligned rectangles made of [`Unit`]s.

use crate::{Point, Unit};

/// An axis-aligned rectangle given by its top-left corner and size.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct UnitRect {
    /// Left edge.
    pub x: Unit,
    /// Top edge.
    pub y: Unit,
    /// Horizontal extent.
    pub width: Unit,
    /// Vertical extent.
    pub height: Unit,
}

impl UnitRect {
    /// Create a rectangle from its top-left corner and size.
    pub const fn new(x: Unit, y: Unit, width: Unit, height: Unit) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The top-left corner.
    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The right edge.
    pub fn right(&self) -> Unit {
        self.x + self.width
    }

    /// The bottom edge.
    pub fn bottom(&self) -> Unit {
        self.y + self.height
    }

    /// This rectangle moved by `offset`.
    pub fn translate(&self, offset: Point) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// This rectangle as a Kurbo rectangle in base units.
    pub fn to_kurbo(&self) -> kurbo::Rect {
        kurbo::Rect::from_origin_size(
            self.origin().to_kurbo(),
            (self.width.base_value(), self.height.base_value()),
        )
    }
}
