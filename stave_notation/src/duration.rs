// Copyright 2025 the Stave Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Metered note durations.

use core::cmp::Ordering;
use core::fmt;
use core::ops::Add;

use crate::NotationError;

/// How a duration is written: a base note value and a number of dots.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DurationDisplay {
    /// The undotted note value as a division of a whole note: `1` for a whole note, `4` for
    /// a quarter, and `0` for a double whole note.
    pub base_division: u32,
    /// Number of augmentation dots.
    pub dot_count: u8,
}

/// A metered, non-tuplet duration as a fraction of a whole note.
///
/// The fraction is kept reduced. `Duration::new(3, 8)` is a dotted quarter and
/// `Duration::new(2, 4)` is the same value as `Duration::new(1, 2)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Duration {
    numerator: u32,
    denominator: u32,
}

impl Duration {
    /// A whole note.
    pub const WHOLE: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    /// Create a duration of `numerator / denominator` whole notes.
    ///
    /// Fails with [`NotationError::InvalidDuration`] if either part is zero or the
    /// denominator is not a power of two.
    pub fn new(numerator: u32, denominator: u32) -> Result<Self, NotationError> {
        if numerator == 0 || !denominator.is_power_of_two() {
            return Err(NotationError::InvalidDuration {
                numerator,
                denominator,
            });
        }
        let shift = numerator.trailing_zeros().min(denominator.trailing_zeros());
        Ok(Self {
            numerator: numerator >> shift,
            denominator: denominator >> shift,
        })
    }

    /// The duration written as `base_division` with `dots` augmentation dots.
    ///
    /// `base_division` must be `0` (double whole note) or a power of two.
    pub fn from_description(base_division: u32, dots: u8) -> Result<Self, NotationError> {
        let (numerator, denominator) = match base_division {
            0 => (2_u64, 1_u64),
            d if d.is_power_of_two() => (1, u64::from(d)),
            _ => {
                return Err(NotationError::InvalidDuration {
                    numerator: 1,
                    denominator: base_division,
                });
            }
        };
        if dots > 16 {
            return Err(NotationError::InvalidDuration {
                numerator: 1,
                denominator: base_division,
            });
        }
        // Each dot adds half of the previous addition: n/d + n/2d + ... = n(2^(k+1)-1)/(d 2^k).
        let scale = 1_u64 << dots;
        let numerator = numerator * ((scale << 1) - 1);
        let denominator = denominator * scale;
        let invalid = NotationError::InvalidDuration {
            numerator: u32::MAX,
            denominator: base_division,
        };
        Self::new(
            u32::try_from(numerator).map_err(|_| invalid.clone())?,
            u32::try_from(denominator).map_err(|_| invalid)?,
        )
    }

    /// The reduced numerator.
    pub fn numerator(self) -> u32 {
        self.numerator
    }

    /// The reduced denominator.
    pub fn denominator(self) -> u32 {
        self.denominator
    }

    /// The duration in whole notes.
    pub fn to_f64(self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }

    /// How this duration is written, or `None` if it needs a tie.
    pub fn display(self) -> Option<DurationDisplay> {
        if self.numerator >= 2 * self.denominator {
            if self.numerator >= 4 * self.denominator {
                return None;
            }
            // Written as a double whole note, dotted like the half-length value.
            let half = Self::new(self.numerator, self.denominator * 2).ok()?.display()?;
            return Some(DurationDisplay {
                base_division: 0,
                dot_count: half.dot_count,
            });
        }
        // A dotted value has a numerator of the form 2^(k+1) - 1 over the base division
        // times 2^k.
        let mut numerator = self.numerator;
        let mut denominator = self.denominator;
        let mut dot_count = 0;
        while numerator > 1 {
            if numerator % 2 == 0 {
                return None;
            }
            numerator = (numerator - 1) / 2;
            denominator /= 2;
            dot_count += 1;
        }
        if denominator == 0 {
            return None;
        }
        Some(DurationDisplay {
            base_division: denominator,
            dot_count,
        })
    }

    /// Whether this duration can only be written with a tie.
    pub fn requires_tie(self) -> bool {
        self.display().is_none()
    }

    /// Number of augmentation dots, or zero if the duration needs a tie.
    pub fn dot_count(self) -> u8 {
        self.display().map_or(0, |d| d.dot_count)
    }

    /// Number of flags (or beams) on the written value.
    ///
    /// Quarter notes and longer have none; each halving beyond a quarter adds one. Zero
    /// if the duration needs a tie.
    pub fn flag_count(self) -> u8 {
        match self.display() {
            Some(DurationDisplay { base_division, .. }) if base_division >= 8 => {
                u8::try_from(base_division.trailing_zeros() - 2).unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// The difference between two durations, or `None` unless `self` is longer.
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        let (a, b, denominator) = self.common_terms(other);
        if a <= b {
            return None;
        }
        reduce(a - b, denominator)
    }

    fn common_terms(self, other: Self) -> (u64, u64, u64) {
        let denominator = u64::from(self.denominator.max(other.denominator));
        let a = u64::from(self.numerator) * (denominator / u64::from(self.denominator));
        let b = u64::from(other.numerator) * (denominator / u64::from(other.denominator));
        (a, b, denominator)
    }
}

fn reduce(numerator: u64, denominator: u64) -> Option<Duration> {
    let shift = numerator.trailing_zeros().min(denominator.trailing_zeros());
    Duration::new(
        u32::try_from(numerator >> shift).ok()?,
        u32::try_from(denominator >> shift).ok()?,
    )
    .ok()
}

impl Add for Duration {
    type Output = Option<Self>;

    /// The sum of two durations, or `None` if it overflows.
    fn add(self, rhs: Self) -> Option<Self> {
        let (a, b, denominator) = self.common_terms(rhs);
        reduce(a + b, denominator)
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> Ordering {
        let (a, b, _) = self.common_terms(*other);
        a.cmp(&b)
    }
}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
