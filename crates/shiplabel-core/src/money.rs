//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Rate quotes arrive as floats:                                          │
//! │    7.00 - 5.95 = 1.0499999999999998  ❌                                 │
//! │                                                                         │
//! │  OUR SOLUTION: Convert once at the boundary, then integer cents         │
//! │    700 - 595 = 105 cents  ✅                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Carrier quotes and declared customs values come in as decimal numbers.
//! They are rounded to the nearest cent exactly once, in
//! [`Money::from_decimal`], and every sum, delta and threshold comparison
//! after that is integer math.
//!
//! ## Usage
//! ```rust
//! use shiplabel_core::money::Money;
//!
//! let rate = Money::from_decimal(5.95);
//! let retail = Money::from_decimal(7.00);
//! assert_eq!((retail - rate).cents(), 105);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Where Money is Used
/// ```text
/// RateQuote.rate ──► PriceLine.price ──► PriceBreakdown.total
/// RateQuote.retail_rate - rate ──────► PriceBreakdown.discount
/// CustomsItem.value × quantity ──────► value by tariff class ──► ITN check
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a decimal amount (as quoted by a carrier or typed into a
    /// customs form) to Money, rounding to the nearest cent.
    ///
    /// Non-finite input converts to zero.
    ///
    /// ## Example
    /// ```rust
    /// use shiplabel_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(5.95).cents(), 595);
    /// assert_eq!(Money::from_decimal(0.125).cents(), 13);
    /// assert_eq!(Money::from_decimal(f64::NAN).cents(), 0);
    /// ```
    pub fn from_decimal(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money((amount * 100.0).round() as i64)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Value of `count` shipped units at this unit value. Saturates at the
    /// `i64` bounds like every other `Money` operation.
    ///
    /// ```rust
    /// use shiplabel_core::money::Money;
    ///
    /// let unit_value = Money::from_decimal(750.0);
    /// assert_eq!(unit_value.times(2).cents(), 150_000);
    /// ```
    #[inline]
    pub const fn times(&self, count: i64) -> Self {
        Money(self.0.saturating_mul(count))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented formatting. The CLI formats for display with its own
/// currency settings.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{}${}.{:02}", sign, cents / 100, cents % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.times(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
