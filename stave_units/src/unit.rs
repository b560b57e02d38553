// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Unit`] scalar and its named denominations.

use core::cmp::Ordering;
use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use crate::UnitError;

/// Tolerance applied to every comparison between base values.
pub const CMP_EPSILON: f64 = 0.001;

/// Points per inch; the ratio of [`UnitKind::Inch`] to base units.
const INCH_RATE: f64 = 72.0;

/// The ratio of [`UnitKind::Mm`] to base units.
const MM_RATE: f64 = INCH_RATE * 0.039_370_1;

/// The denomination a [`Unit`] displays itself in.
///
/// Every kind has a fixed conversion rate to the canonical base value. Base units are
/// device units (one base unit per [`UnitKind::Graphic`]).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum UnitKind {
    /// One-to-one with base units.
    Graphic,
    /// An inch (72 base units).
    Inch,
    /// A millimeter.
    Mm,
    /// A runtime-defined denomination, such as a staff space.
    Custom {
        /// Name used when displaying values of this kind.
        name: &'static str,
        /// Base units per one of this kind.
        rate: f64,
    },
}

impl UnitKind {
    /// Create a custom denomination.
    ///
    /// Fails with [`UnitError::InvalidRate`] unless `rate` is finite and positive.
    pub fn custom(name: &'static str, rate: f64) -> Result<Self, UnitError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(UnitError::InvalidRate { name, rate });
        }
        Ok(Self::Custom { name, rate })
    }

    /// Base units per one of this kind.
    pub const fn rate(self) -> f64 {
        match self {
            Self::Graphic => 1.0,
            Self::Inch => INCH_RATE,
            Self::Mm => MM_RATE,
            Self::Custom { rate, .. } => rate,
        }
    }

    /// Display name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Graphic => "Unit",
            Self::Inch => "Inch",
            Self::Mm => "Mm",
            Self::Custom { name, .. } => name,
        }
    }
}

/// An immutable graphical distance with a denomination.
///
/// Arithmetic between units keeps the denomination of the left operand:
///
/// ```
/// use stave_units::Unit;
///
/// let sum = Unit::inch(1.0) + Unit::mm(1.0);
/// assert_eq!(sum.to_string(), "Inch(1.039)");
/// ```
///
/// Equality and ordering compare base values with a tolerance of [`CMP_EPSILON`], so
/// values that took different conversion paths still compare equal:
///
/// ```
/// use stave_units::{Unit, UnitKind};
///
/// assert_eq!(Unit::mm(1.0).to_kind(UnitKind::Inch), Unit::mm(1.0));
/// assert!(Unit::mm(1.0).to_kind(UnitKind::Inch) <= Unit::mm(1.0));
/// ```
#[derive(Copy, Clone, Debug)]
pub struct Unit {
    base_value: f64,
    kind: UnitKind,
    // The exact value given at construction, if constructed from a raw number.
    literal: Option<f64>,
}

impl Unit {
    /// A zero-length graphic unit.
    pub const ZERO: Self = Self::graphic(0.0);

    /// Construct from a raw value in the given denomination.
    pub const fn new(value: f64, kind: UnitKind) -> Self {
        Self {
            base_value: value * kind.rate(),
            kind,
            literal: Some(value),
        }
    }

    /// Like [`Unit::new`], but rejects values that cannot be converted (NaN).
    pub fn try_new(value: f64, kind: UnitKind) -> Result<Self, UnitError> {
        if value.is_nan() {
            return Err(UnitError::TypeConversion {
                value,
                kind: kind.name(),
            });
        }
        Ok(Self::new(value, kind))
    }

    /// Construct directly from a base value, re-expressed in `kind`.
    pub const fn from_base(base_value: f64, kind: UnitKind) -> Self {
        Self {
            base_value,
            kind,
            literal: None,
        }
    }

    /// A graphic (device) unit.
    pub const fn graphic(value: f64) -> Self {
        Self::new(value, UnitKind::Graphic)
    }

    /// An inch.
    pub const fn inch(value: f64) -> Self {
        Self::new(value, UnitKind::Inch)
    }

    /// A millimeter.
    pub const fn mm(value: f64) -> Self {
        Self::new(value, UnitKind::Mm)
    }

    /// Re-express this distance in another denomination, keeping its base value.
    pub const fn to_kind(self, kind: UnitKind) -> Self {
        Self::from_base(self.base_value, kind)
    }

    /// The canonical device-resolution value.
    pub const fn base_value(self) -> f64 {
        self.base_value
    }

    /// The denomination of this value.
    pub const fn kind(self) -> UnitKind {
        self.kind
    }

    /// The value in this unit's own denomination.
    ///
    /// Values constructed from a raw number echo it back exactly. Converted values are
    /// rounded to 3 decimal places to hide floating point noise.
    pub fn display_value(self) -> f64 {
        match self.literal {
            Some(value) => value,
            None => round_to(self.base_value / self.kind.rate(), 3),
        }
    }

    /// The base value rounded to 2 decimal places, suitable for cache keys.
    pub fn rounded_base_value(self) -> f64 {
        round_to(self.base_value, 2)
    }

    /// The same value as a cache-key friendly integer (hundredths of a base unit).
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Cache keys only need to distinguish practical document distances."
    )]
    pub fn cache_key(self) -> i64 {
        (self.base_value * 100.0).round() as i64
    }

    /// Absolute value, keeping the denomination.
    pub fn abs(self) -> Self {
        Self::from_base(self.base_value.abs(), self.kind)
    }

    /// The smaller of two values (by tolerant comparison), keeping its own denomination.
    pub fn min(self, other: Self) -> Self {
        if other < self { other } else { self }
    }

    /// The larger of two values (by tolerant comparison), keeping its own denomination.
    pub fn max(self, other: Self) -> Self {
        if other > self { other } else { self }
    }

    /// Whether the base value is within tolerance of zero.
    pub fn is_zero(self) -> bool {
        self.base_value.abs() < CMP_EPSILON
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10_f64.powi(places);
    (value * scale).round() / scale
}

impl Default for Unit {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind.name(), self.display_value())
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        // Strict check first so matching infinities compare equal.
        self.base_value == other.base_value
            || (self.base_value - other.base_value).abs() < CMP_EPSILON
    }
}

impl PartialOrd for Unit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self == other {
            return Some(Ordering::Equal);
        }
        let delta = self.base_value - other.base_value;
        if delta.is_nan() {
            None
        } else if delta < 0.0 {
            Some(Ordering::Less)
        } else {
            Some(Ordering::Greater)
        }
    }
}

impl Add for Unit {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_base(self.base_value + rhs.base_value, self.kind)
    }
}

impl AddAssign for Unit {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Unit {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_base(self.base_value - rhs.base_value, self.kind)
    }
}

impl SubAssign for Unit {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f64> for Unit {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::from_base(self.base_value * rhs, self.kind)
    }
}

impl Mul<Unit> for f64 {
    type Output = Unit;

    fn mul(self, rhs: Unit) -> Unit {
        rhs * self
    }
}

impl Div<f64> for Unit {
    type Output = Self;

    fn div(self, rhs: f64) -> Self {
        Self::from_base(self.base_value / rhs, self.kind)
    }
}

/// Dividing two distances gives a dimensionless ratio.
impl Div for Unit {
    type Output = f64;

    fn div(self, rhs: Self) -> f64 {
        self.base_value / rhs.base_value
    }
}

impl Neg for Unit {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_base(-self.base_value, self.kind)
    }
}

impl Sum for Unit {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, u| acc + u)
    }
}
