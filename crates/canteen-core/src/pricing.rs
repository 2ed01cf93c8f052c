//! # Pricing
//!
//! Pure arithmetic for turning an order total into a bill total.
//!
//! ## Evaluation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  order.total                                   subtotal                 │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  discount_reduction()   missing / expired / combo unmet → 0            │
//! │      │                  percentage → subtotal × value / 100            │
//! │      │                  fixed, combo → min(value, subtotal)            │
//! │      ▼                                                                  │
//! │  loyalty redemption     points / 10, floored so taxable ≥ 0            │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  tax = taxable × rate,  total = taxable + tax                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Looking up the discount and redeeming points touch storage, so they live
//! in the engine. Everything here is side-effect free.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{Money, TaxRate};
use crate::types::{Discount, DiscountKind};
use crate::POINTS_PER_CURRENCY_UNIT;

/// Breakdown of a priced order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricedTotal {
    /// Order total before any reduction.
    pub subtotal: Money,
    /// Reduction from the discount (zero when skipped).
    pub discount: Money,
    /// Nominal value of redeemed loyalty points.
    pub loyalty_discount: Money,
    /// Amount tax is charged on.
    pub taxable: Money,
    pub tax: Money,
    pub total: Money,
}

/// Reduction a discount grants on `subtotal` at `now`.
///
/// Returns zero whenever the discount does not apply: outside its window, or
/// a combo whose items are not all on the order. Never errors.
///
/// ## Example
/// ```rust
/// use std::collections::BTreeSet;
/// use chrono::{Duration, Utc};
/// use canteen_core::money::Money;
/// use canteen_core::pricing::discount_reduction;
/// use canteen_core::types::{Discount, DiscountKind};
///
/// let now = Utc::now();
/// let ten_off = Discount {
///     id: "d".into(),
///     name: "Ten off".into(),
///     kind: DiscountKind::Percentage,
///     value: 10.0,
///     starts_at: now - Duration::hours(1),
///     ends_at: now + Duration::hours(1),
///     combo_item_ids: BTreeSet::new(),
/// };
/// let cut = discount_reduction(&ten_off, Money::new(50.0), &BTreeSet::new(), now);
/// assert!(cut.approx_eq(Money::new(5.0)));
/// ```
pub fn discount_reduction(
    discount: &Discount,
    subtotal: Money,
    order_items: &BTreeSet<String>,
    now: DateTime<Utc>,
) -> Money {
    if !discount.is_active_at(now) {
        return Money::zero();
    }

    let reduced = match discount.kind {
        DiscountKind::Percentage => subtotal.apply_percentage(discount.value),
        DiscountKind::Fixed => subtotal.saturating_sub(Money::new(discount.value)),
        DiscountKind::Combo => {
            if !combo_satisfied(&discount.combo_item_ids, order_items) {
                return Money::zero();
            }
            subtotal.saturating_sub(Money::new(discount.value))
        }
    };

    subtotal.saturating_sub(reduced)
}

/// A combo is satisfied when every one of its items is on the order.
/// An empty combo never matches.
pub fn combo_satisfied(combo: &BTreeSet<String>, order_items: &BTreeSet<String>) -> bool {
    !combo.is_empty() && combo.is_subset(order_items)
}

/// Currency value of `points` loyalty points.
pub fn points_value(points: i64) -> Money {
    Money::new(points as f64 / POINTS_PER_CURRENCY_UNIT)
}

/// Points earned on a settled bill: `floor(total / earn_rate)`.
///
/// ```rust
/// use canteen_core::money::Money;
/// use canteen_core::pricing::points_earned;
///
/// assert_eq!(points_earned(Money::new(21.6), 10.0), 2);
/// assert_eq!(points_earned(Money::new(9.99), 10.0), 0);
/// ```
pub fn points_earned(total: Money, earn_rate: f64) -> i64 {
    if earn_rate <= 0.0 || !total.is_positive() {
        return 0;
    }
    (total.amount() / earn_rate).floor() as i64
}

/// Composes the final price from its parts.
///
/// `discount` comes from [`discount_reduction`]; `loyalty_discount` is the
/// value of the points already redeemed. The taxable amount never goes below
/// zero.
pub fn compose(
    subtotal: Money,
    discount: Money,
    loyalty_discount: Money,
    rate: TaxRate,
) -> PricedTotal {
    let taxable = subtotal
        .saturating_sub(discount)
        .saturating_sub(loyalty_discount);
    let tax = taxable.calculate_tax(rate);

    PricedTotal {
        subtotal,
        discount,
        loyalty_discount,
        taxable,
        tax,
        total: taxable + tax,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn discount(kind: DiscountKind, value: f64, combo: &[&str]) -> Discount {
        let now = Utc::now();
        Discount {
            id: "d1".to_string(),
            name: "Promo".to_string(),
            kind,
            value,
            starts_at: now - Duration::hours(1),
            ends_at: now + Duration::hours(1),
            combo_item_ids: combo.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn items(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plain_total_with_tax() {
        let priced = compose(Money::new(20.0), Money::zero(), Money::zero(), TaxRate::new(0.08));
        assert!(priced.tax.approx_eq(Money::new(1.6)));
        assert!(priced.total.approx_eq(Money::new(21.6)));
        assert_eq!(priced.taxable, Money::new(20.0));
    }

    #[test]
    fn test_percentage_discount() {
        let d = discount(DiscountKind::Percentage, 25.0, &[]);
        let cut = discount_reduction(&d, Money::new(40.0), &items(&[]), Utc::now());
        assert!(cut.approx_eq(Money::new(10.0)));
    }

    #[test]
    fn test_fixed_discount_floors_at_zero() {
        let d = discount(DiscountKind::Fixed, 50.0, &[]);
        let cut = discount_reduction(&d, Money::new(30.0), &items(&[]), Utc::now());
        assert_eq!(cut, Money::new(30.0));

        let priced = compose(Money::new(30.0), cut, Money::zero(), TaxRate::new(0.08));
        assert!(priced.total.is_zero());
    }

    #[test]
    fn test_expired_discount_is_skipped() {
        let d = discount(DiscountKind::Fixed, 5.0, &[]);
        let later = d.ends_at + Duration::seconds(1);
        assert!(discount_reduction(&d, Money::new(30.0), &items(&[]), later).is_zero());
    }

    #[test]
    fn test_combo_requires_superset() {
        let d = discount(DiscountKind::Combo, 15.0, &["burger", "fries"]);
        let now = Utc::now();

        let full = discount_reduction(&d, Money::new(100.0), &items(&["burger", "fries", "cola"]), now);
        assert_eq!(full, Money::new(15.0));

        let partial = discount_reduction(&d, Money::new(100.0), &items(&["burger"]), now);
        assert!(partial.is_zero());
    }

    #[test]
    fn test_empty_combo_never_applies() {
        let d = discount(DiscountKind::Combo, 15.0, &[]);
        assert!(discount_reduction(&d, Money::new(100.0), &items(&["tea"]), Utc::now()).is_zero());
    }

    #[test]
    fn test_loyalty_reduces_before_tax() {
        let priced = compose(
            Money::new(100.0),
            Money::zero(),
            points_value(10),
            TaxRate::new(0.08),
        );
        assert!(priced.taxable.approx_eq(Money::new(99.0)));
        assert!(priced.total.approx_eq(Money::new(106.92)));
    }

    #[test]
    fn test_points_earned_floors() {
        assert_eq!(points_earned(Money::new(106.92), 10.0), 10);
        assert_eq!(points_earned(Money::zero(), 10.0), 0);
        assert_eq!(points_earned(Money::new(50.0), 0.0), 0);
    }
}
