//! # Validation Module
//!
//! Input validation utilities for the canteen POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Engine service boundary (Rust)                               │
//! │  ├── THIS MODULE: shape and range checks                               │
//! │  └── Runs before any storage access                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine business rules                                        │
//! │  └── Stock, balances, order state (CoreError)                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 0), CHECK (balance >= 0)                       │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use canteen_core::validation::{validate_phone_number, validate_quantity};
//!
//! assert!(validate_phone_number("0300123456").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{DiscountDraft, DiscountKind, LineRequest};
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Length of a wallet phone number.
pub const PHONE_NUMBER_DIGITS: usize = 10;

const MAX_NAME_LEN: usize = 200;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a menu item or discount name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a customer id as supplied to order creation.
pub fn validate_customer_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "customer id".to_string(),
        });
    }
    Ok(())
}

/// Validates a wallet phone number.
///
/// ## Rules
/// - Exactly 10 characters
/// - ASCII digits only
///
/// ## Example
/// ```rust
/// use canteen_core::validation::validate_phone_number;
///
/// assert!(validate_phone_number("0300123456").is_ok());
/// assert!(validate_phone_number("030012345").is_err());
/// assert!(validate_phone_number("03001234a6").is_err());
/// ```
pub fn validate_phone_number(phone: &str) -> ValidationResult<()> {
    if phone.len() != PHONE_NUMBER_DIGITS || !phone.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone number".to_string(),
            reason: format!("must be exactly {PHONE_NUMBER_DIGITS} digits"),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value on an order line.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1.0,
            max: MAX_ITEM_QUANTITY as f64,
        });
    }

    Ok(())
}

/// Validates the lines of a new order.
///
/// ## Rules
/// - Between 1 and MAX_ORDER_LINES (100) lines
/// - Every line has a non-empty item id and a valid quantity
pub fn validate_order_lines(lines: &[LineRequest]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "order lines".to_string(),
        });
    }

    if lines.len() > MAX_ORDER_LINES {
        return Err(ValidationError::OutOfRange {
            field: "order lines".to_string(),
            min: 1.0,
            max: MAX_ORDER_LINES as f64,
        });
    }

    for line in lines {
        if line.item_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "item id".to_string(),
            });
        }
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

/// Validates an amount that may be zero (prices, wallet credits).
///
/// ## Example
/// ```rust
/// use canteen_core::money::Money;
/// use canteen_core::validation::validate_amount;
///
/// assert!(validate_amount("price", Money::new(0.0)).is_ok());
/// assert!(validate_amount("price", Money::new(-1.0)).is_err());
/// assert!(validate_amount("price", Money::new(f64::INFINITY)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a finite number".to_string(),
        });
    }

    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates an amount that must be strictly positive (wallet debits).
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    validate_amount(field, amount)?;
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates an absolute stock level or threshold.
pub fn validate_stock_level(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a tax rate fraction.
///
/// ## Rules
/// - Between 0.0 and 1.0 inclusive (0% to 100%)
pub fn validate_tax_rate(rate: f64) -> ValidationResult<()> {
    if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
        return Err(ValidationError::OutOfRange {
            field: "tax rate".to_string(),
            min: 0.0,
            max: 1.0,
        });
    }
    Ok(())
}

/// Validates the currency-per-point earn rate. Must be positive and finite.
pub fn validate_loyalty_earn_rate(rate: f64) -> ValidationResult<()> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "loyalty earn rate".to_string(),
        });
    }
    Ok(())
}

/// Validates a loyalty point count passed to redemption.
pub fn validate_points(points: i64) -> ValidationResult<()> {
    if points < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "loyalty points".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Discount Validators
// =============================================================================

/// Validates a discount before it is stored.
///
/// ## Rules
/// - Name non-empty
/// - Value finite and ≥ 0; percentage values ≤ 100
/// - Window `starts_at < ends_at`
/// - Combo discounts name at least one item
pub fn validate_discount(draft: &DiscountDraft) -> ValidationResult<()> {
    validate_name("discount name", &draft.name)?;

    if !draft.value.is_finite() || draft.value < 0.0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "discount value".to_string(),
        });
    }

    if draft.kind == DiscountKind::Percentage && draft.value > 100.0 {
        return Err(ValidationError::OutOfRange {
            field: "discount value".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }

    if draft.starts_at >= draft.ends_at {
        return Err(ValidationError::InvalidFormat {
            field: "discount window".to_string(),
            reason: "start must be before end".to_string(),
        });
    }

    if draft.kind == DiscountKind::Combo && draft.combo_item_ids.is_empty() {
        return Err(ValidationError::Required {
            field: "combo items".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::collections::BTreeSet;

    fn draft(kind: DiscountKind, value: f64) -> DiscountDraft {
        let now = Utc::now();
        DiscountDraft {
            name: "Happy hour".to_string(),
            kind,
            value,
            starts_at: now,
            ends_at: now + Duration::hours(2),
            combo_item_ids: BTreeSet::new(),
        }
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Chai").is_ok());
        assert!(validate_name("name", "   ").is_err());
        assert!(validate_name("name", &"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("0312345678").is_ok());
        assert!(validate_phone_number("").is_err());
        assert!(validate_phone_number("03123456789").is_err());
        assert!(validate_phone_number("+312345678").is_err());
        // non-ASCII digits are rejected
        assert!(validate_phone_number("٠٣١٢٣٤٥٦٧٨").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_order_lines() {
        assert!(validate_order_lines(&[]).is_err());
        assert!(validate_order_lines(&[LineRequest::new("tea", 2)]).is_ok());
        assert!(validate_order_lines(&[LineRequest::new("tea", -2)]).is_err());
        assert!(validate_order_lines(&[LineRequest::new(" ", 1)]).is_err());

        let too_many: Vec<_> = (0..101).map(|i| LineRequest::new(format!("i{i}"), 1)).collect();
        assert!(validate_order_lines(&too_many).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_amount("price", Money::zero()).is_ok());
        assert!(validate_amount("price", Money::new(-0.01)).is_err());
        assert!(validate_positive_amount("amount", Money::zero()).is_err());
        assert!(validate_positive_amount("amount", Money::new(f64::NAN)).is_err());
    }

    #[test]
    fn test_validate_rates() {
        assert!(validate_tax_rate(0.0).is_ok());
        assert!(validate_tax_rate(0.08).is_ok());
        assert!(validate_tax_rate(1.0).is_ok());
        assert!(validate_tax_rate(1.01).is_err());
        assert!(validate_tax_rate(-0.1).is_err());

        assert!(validate_loyalty_earn_rate(10.0).is_ok());
        assert!(validate_loyalty_earn_rate(0.0).is_err());
    }

    #[test]
    fn test_validate_discount() {
        assert!(validate_discount(&draft(DiscountKind::Percentage, 10.0)).is_ok());
        assert!(validate_discount(&draft(DiscountKind::Percentage, 150.0)).is_err());
        assert!(validate_discount(&draft(DiscountKind::Fixed, -1.0)).is_err());
        // combo without items
        assert!(validate_discount(&draft(DiscountKind::Combo, 5.0)).is_err());

        let mut inverted = draft(DiscountKind::Fixed, 5.0);
        inverted.ends_at = inverted.starts_at;
        assert!(validate_discount(&inverted).is_err());
    }
}
