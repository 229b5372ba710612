// ============================================================================
// Tick Values
// Price in ticks and quantity in units, both backed by i64
// ============================================================================

use super::errors::{NumericError, NumericResult};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Price
// ============================================================================

/// Price expressed as a signed number of ticks.
///
/// The tick is the venue's minimum price increment; the engine never
/// interprets it further. `Price::MAX` and `Price::MIN` act as marketable
/// sentinels: a market buy is priced at `MAX` and a market sell at `MIN`
/// so the crossing test accepts every resting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct Price(i64);

impl Price {
    /// Marketable sentinel for aggressive buys
    pub const MAX: Self = Self(i64::MAX);

    /// Marketable sentinel for aggressive sells
    pub const MIN: Self = Self(i64::MIN);

    #[inline]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    #[inline]
    pub const fn ticks(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Quantity
// ============================================================================

/// Quantity in units.
///
/// Signed so that arithmetic errors show up as negative values in debug
/// assertions rather than wrapping; every order and trade carries a
/// strictly positive quantity (validated at the engine boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Self(units)
    }

    #[inline]
    pub const fn units(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns the minimum of two quantities.
    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    /// Checked addition.
    ///
    /// # Errors
    /// Returns `Overflow` or `Underflow` if the result is out of range.
    #[inline]
    pub fn checked_add(self, rhs: Self) -> NumericResult<Self> {
        self.0.checked_add(rhs.0).map(Self).ok_or_else(|| {
            if rhs.0 > 0 {
                NumericError::Overflow
            } else {
                NumericError::Underflow
            }
        })
    }

    /// Checked subtraction.
    ///
    /// # Errors
    /// Returns `Overflow` or `Underflow` if the result is out of range.
    #[inline]
    pub fn checked_sub(self, rhs: Self) -> NumericResult<Self> {
        self.0.checked_sub(rhs.0).map(Self).ok_or_else(|| {
            if rhs.0 < 0 {
                NumericError::Overflow
            } else {
                NumericError::Underflow
            }
        })
    }

    /// Saturating addition, for aggregate sums that only need a threshold test.
    #[inline]
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

// Infallible Add/Sub for book-keeping arithmetic; out-of-range results are
// programming bugs, not caller input.
impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs).expect("quantity addition overflow")
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(rhs).expect("quantity subtraction underflow")
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Quantity {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
