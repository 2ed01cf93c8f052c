//! # Money Module
//!
//! Provides the `Money` and `TaxRate` types used by every price, balance and
//! bill in the canteen.
//!
//! ## Precision Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FULL PRECISION IN, ROUNDING ONLY ON DISPLAY                            │
//! │                                                                         │
//! │  Menu price 10.00 × 2        = 20.00                                    │
//! │  10% discount                = 18.00                                    │
//! │  Tax at 0.08                 =  1.44                                    │
//! │  Total                       = 19.44   ← stored exactly as computed     │
//! │                                                                         │
//! │  Stored and compared values are never rounded. `Display` rounds to      │
//! │  two decimals so receipts read naturally.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use canteen_core::money::Money;
//!
//! let price = Money::new(10.0);
//! let line = price.multiply_quantity(3);
//! assert_eq!(line, Money::new(30.0));
//! assert_eq!(line.to_string(), "Rs 30.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

/// Tolerance used when comparing computed amounts.
pub const MONEY_EPSILON: f64 = 1e-9;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in currency units.
///
/// ## Design Decisions
/// - **f64**: percentage discounts and tax produce fractional units, and the
///   ledger keeps them at full precision
/// - **Single field tuple struct**: zero-cost abstraction over f64
/// - **transparent sqlx type**: stored as SQLite REAL
///
/// ```text
/// MenuItem.price ──► OrderLine.unit_price ──► Order.total
///                                                 │
///                          discount / loyalty ◄───┘
///                                 │
///                                 ▼
///                         tax ──► Bill.total ──► Wallet debit / refund
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct Money(f64);

impl Money {
    /// Creates a Money value from currency units.
    #[inline]
    pub const fn new(amount: f64) -> Self {
        Money(amount)
    }

    /// Returns the amount in currency units.
    #[inline]
    pub const fn amount(&self) -> f64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0.0)
    }

    /// Checks if the value is zero (within [`MONEY_EPSILON`]).
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.abs() < MONEY_EPSILON
    }

    /// Checks if the value is strictly positive.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > 0.0
    }

    /// Checks if the value is strictly negative.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < 0.0
    }

    /// Returns true for NaN or infinite amounts.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.is_finite()
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use canteen_core::money::Money;
    ///
    /// let line = Money::new(2.5).multiply_quantity(4);
    /// assert_eq!(line.amount(), 10.0);
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty as f64)
    }

    /// Subtracts `other`, flooring the result at zero.
    ///
    /// ## Example
    /// ```rust
    /// use canteen_core::money::Money;
    ///
    /// assert_eq!(Money::new(5.0).saturating_sub(Money::new(8.0)), Money::zero());
    /// ```
    #[inline]
    pub fn saturating_sub(&self, other: Money) -> Self {
        Money((self.0 - other.0).max(0.0))
    }

    /// Applies a percentage reduction: `amount * (1 - pct / 100)`.
    #[inline]
    pub fn apply_percentage(&self, pct: f64) -> Self {
        Money(self.0 * (1.0 - pct / 100.0))
    }

    /// Calculates tax on this amount.
    ///
    /// ## Example
    /// ```rust
    /// use canteen_core::money::{Money, TaxRate};
    ///
    /// let tax = Money::new(20.0).calculate_tax(TaxRate::new(0.08));
    /// assert!((tax.amount() - 1.6).abs() < 1e-9);
    /// ```
    #[inline]
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        Money(self.0 * rate.fraction())
    }

    /// Compares two amounts within [`MONEY_EPSILON`].
    #[inline]
    pub fn approx_eq(&self, other: Money) -> bool {
        (self.0 - other.0).abs() < MONEY_EPSILON
    }
}

/// Display shows two decimals with the canteen's currency prefix.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0.0 {
            write!(f, "-Rs {:.2}", -self.0)
        } else {
            write!(f, "Rs {:.2}", self.0)
        }
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
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate as a fraction of the taxable amount (0.08 = 8%).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(f64);

impl TaxRate {
    /// Creates a tax rate from a fraction.
    #[inline]
    pub const fn new(fraction: f64) -> Self {
        TaxRate(fraction)
    }

    /// Returns the rate as a fraction.
    #[inline]
    pub const fn fraction(&self) -> f64 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 * 100.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::new(10.999).to_string(), "Rs 11.00");
        assert_eq!(Money::new(5.0).to_string(), "Rs 5.00");
        assert_eq!(Money::new(-5.5).to_string(), "-Rs 5.50");
        assert_eq!(Money::zero().to_string(), "Rs 0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(10.0);
        let b = Money::new(4.0);

        assert_eq!(a + b, Money::new(14.0));
        assert_eq!(a - b, Money::new(6.0));
        assert_eq!(a * 3, Money::new(30.0));
    }

    #[test]
    fn test_saturating_sub_floors_at_zero() {
        assert_eq!(Money::new(3.0).saturating_sub(Money::new(1.0)), Money::new(2.0));
        assert_eq!(Money::new(3.0).saturating_sub(Money::new(10.0)), Money::zero());
    }

    #[test]
    fn test_percentage_keeps_full_precision() {
        let discounted = Money::new(33.0).apply_percentage(10.0);
        assert!(discounted.approx_eq(Money::new(29.7)));
        // not rounded to cents
        let third = Money::new(10.0).apply_percentage(100.0 / 3.0 * 2.0);
        assert!((third.amount() - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_tax() {
        let tax = Money::new(100.0).calculate_tax(TaxRate::new(0.08));
        assert!(tax.approx_eq(Money::new(8.0)));
        assert!((TaxRate::new(0.08).percentage() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::new(1.5), Money::new(2.5)].into_iter().sum();
        assert_eq!(total, Money::new(4.0));
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::new(1.0).is_positive());
        assert!(Money::new(-1.0).is_negative());
        assert!(!Money::new(f64::NAN).is_finite());
    }
}
