// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two-dimensional points made of [`Unit`]s.

use core::fmt;
use core::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use crate::{Unit, UnitKind};

/// A two-dimensional point.
///
/// The x-axis grows left to right and the y-axis grows top to bottom.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Point {
    /// The horizontal value.
    pub x: Unit,
    /// The vertical value.
    pub y: Unit,
}

/// Shorthand for a point at `(ZERO, ZERO)`.
pub const ORIGIN: Point = Point::ORIGIN;

impl Point {
    /// The point at `(ZERO, ZERO)`.
    pub const ORIGIN: Self = Self::new(Unit::ZERO, Unit::ZERO);

    /// Create a point from two units.
    pub const fn new(x: Unit, y: Unit) -> Self {
        Self { x, y }
    }

    /// Create a point from raw values in one denomination.
    pub const fn from_values(x: f64, y: f64, kind: UnitKind) -> Self {
        Self::new(Unit::new(x, kind), Unit::new(y, kind))
    }

    /// Copy of this point with a different x value.
    pub const fn with_x(self, x: Unit) -> Self {
        Self::new(x, self.y)
    }

    /// Copy of this point with a different y value.
    pub const fn with_y(self, y: Unit) -> Self {
        Self::new(self.x, y)
    }

    /// A point whose values are the absolute values of this one's.
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Euclidean distance from the origin, in the denomination of `x`.
    pub fn hypot(self) -> Unit {
        let base = self.x.base_value().hypot(self.y.base_value());
        Unit::from_base(base, self.x.kind())
    }

    /// This point as a Kurbo point in base units.
    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x.base_value(), self.y.base_value())
    }

    /// A point from a Kurbo point given in base units, expressed in `kind`.
    pub fn from_kurbo(point: kurbo::Point, kind: UnitKind) -> Self {
        Self::new(
            Unit::from_base(point.x, kind),
            Unit::from_base(point.y, kind),
        )
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({}, {})", self.x, self.y)
    }
}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}
