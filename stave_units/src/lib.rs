// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stave Units: typed graphical distances for music engraving.
//!
//! - [`Unit`]: a scalar distance stored as a canonical base value plus a display
//!   denomination ([`UnitKind`]). Arithmetic keeps the left operand's denomination.
//! - [`Point`]: an `(x, y)` pair of units with the usual vector arithmetic.
//! - [`UnitRect`]: an axis-aligned rectangle of units, used for glyph bounds.
//!
//! Comparisons between units tolerate a base-value difference below [`CMP_EPSILON`], so
//! values that took different conversion paths stay equal.
//!
//! Conversion to Kurbo types is provided in base units, for handing canvas positions to a
//! 2D backend.
//!
//! # Example
//!
//! ```rust
//! use stave_units::{Point, Unit, UnitKind};
//!
//! let staff_space = UnitKind::custom("StaffUnit", Unit::mm(1.75).base_value()).unwrap();
//! let offset = Point::new(Unit::new(2.0, staff_space), Unit::mm(0.0));
//! assert_eq!(offset.x, Unit::mm(3.5));
//! assert_eq!(offset.x.display_value(), 2.0);
//! ```

mod point;
mod rect;
mod unit;

pub use point::{ORIGIN, Point};
pub use rect::UnitRect;
pub use unit::{CMP_EPSILON, Unit, UnitKind};

/// Errors from constructing units.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum UnitError {
    /// A raw value could not be converted into a unit.
    #[error("cannot convert {value} into {kind}")]
    TypeConversion {
        /// The rejected value.
        value: f64,
        /// The requested denomination.
        kind: &'static str,
    },
    /// A custom denomination was given an unusable conversion rate.
    #[error("unit kind {name} needs a finite positive rate, got {rate}")]
    InvalidRate {
        /// The denomination name.
        name: &'static str,
        /// The rejected rate.
        rate: f64,
    },
}

/// Shorthand for a zero unit.
pub const ZERO: Unit = Unit::ZERO;
