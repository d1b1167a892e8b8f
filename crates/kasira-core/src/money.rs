//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                        │
//! │                                                                    │
//! │  In floating point:                                                │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                      │
//! │                                                                    │
//! │  OUR SOLUTION: Integer Cents                                       │
//! │    Every amount is an i64 in the smallest currency unit.           │
//! │    Rounding happens exactly once, at discount computation,         │
//! │    and the rounded value is frozen onto the sale item.             │
//! │                                                                    │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasira_core::money::Money;
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(1099);
//!
//! // Arithmetic operations
//! let doubled = price * 2;
//! let total = price + Money::from_cents(500);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: allows negative values for corrections and refunds
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Derives**: full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// let line_total = unit_price.multiply_quantity(3);
    /// assert_eq!(line_total.cents(), 897);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Computes the discount portion of this amount at the given rate.
    ///
    /// ## Implementation
    /// Integer math with half-up rounding: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5). i128 intermediate
    /// prevents overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use kasira_core::money::Money;
    /// use kasira_core::types::DiscountRate;
    ///
    /// let gross = Money::from_cents(10000);
    /// let rate = DiscountRate::from_bps(1000); // 10%
    /// assert_eq!(gross.discount_amount(rate).cents(), 1000);
    /// ```
    pub fn discount_amount(&self, rate: DiscountRate) -> Money {
        let discount = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(discount as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// For debugging and logs; callers format for locale and currency.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summation over line totals.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 600);
    }

    #[test]
    fn test_discount_amount_basic() {
        // 100.00 at 10% = 10.00
        let gross = Money::from_cents(10000);
        let rate = DiscountRate::from_bps(1000);
        assert_eq!(gross.discount_amount(rate).cents(), 1000);
    }

    #[test]
    fn test_discount_amount_with_rounding() {
        // 10.99 at 7.5% = 0.82425 → 0.82
        let gross = Money::from_cents(1099);
        let rate = DiscountRate::from_bps(750);
        assert_eq!(gross.discount_amount(rate).cents(), 82);

        // 10.00 at 8.25% = 0.825 → rounds half-up to 0.83
        let gross = Money::from_cents(1000);
        let rate = DiscountRate::from_bps(825);
        assert_eq!(gross.discount_amount(rate).cents(), 83);
    }

    #[test]
    fn test_discount_amount_full_and_zero() {
        let gross = Money::from_cents(4321);
        assert_eq!(gross.discount_amount(DiscountRate::zero()).cents(), 0);
        assert_eq!(gross.discount_amount(DiscountRate::from_bps(10000)).cents(), 4321);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_cents(100);
        assert!(positive.is_positive());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
    }
}
