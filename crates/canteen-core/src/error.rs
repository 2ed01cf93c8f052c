//! # Error Types
//!
//! Domain-specific error types for canteen-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  canteen-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorKind        - Coarse category callers branch on              │
//! │                                                                         │
//! │  canteen-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  canteen-engine errors                                                 │
//! │  └── EngineError      - CoreError | DbError, what callers see          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (order id, customer id, etc.)
//! 3. Errors are enum variants, never String
//! 4. Every variant maps to exactly one [`ErrorKind`]

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;
use crate::types::OrderStatus;

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse error category.
///
/// Serialized SCREAMING_SNAKE_CASE so that a thin transport layer can forward
/// it unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Malformed input. Nothing was touched.
    Validation,
    /// Referenced entity does not exist.
    NotFound,
    /// Request is well formed but current state forbids it.
    Conflict,
    /// Actor unknown or missing the capability.
    Forbidden,
    /// Storage unavailable or failing.
    Persistence,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. Every variant is raised
/// before the failing operation commits anything.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    ///
    /// ## When This Occurs
    /// - Unknown item, order, bill, discount or wallet id
    /// - Wallet deleted between two operator actions
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The customer id is neither the guest sentinel, a registered identity,
    /// nor a wallet owner.
    #[error("Unknown customer: {0}")]
    UnknownCustomer(String),

    /// One or more order lines cannot be covered by stock.
    ///
    /// ## When This Occurs
    /// ```text
    /// create_order([tea × 3, samosa × 2])
    ///      │
    ///      ▼
    /// tea: 5 ≥ 3 ✓      samosa: 1 ≥ 2 ✗
    ///      │
    ///      ▼
    /// InsufficientStock { item_ids: ["samosa"] }   ← tea untouched too
    /// ```
    #[error("Insufficient stock for items: {}", item_ids.join(", "))]
    InsufficientStock { item_ids: Vec<String> },

    /// Wallet balance does not cover the debit.
    #[error("Insufficient funds for {customer_id}: balance {balance}, required {required}")]
    InsufficientFunds {
        customer_id: String,
        balance: Money,
        required: Money,
    },

    /// Loyalty balance does not cover the requested redemption.
    #[error("Insufficient loyalty points for {customer_id}: balance {balance}, requested {requested}")]
    InsufficientPoints {
        customer_id: String,
        balance: i64,
        requested: i64,
    },

    /// Redemption is below the minimum batch size.
    #[error("At least {minimum} points must be redeemed, got {requested}")]
    BelowRedemptionMinimum { requested: i64, minimum: i64 },

    /// The order is not pending, so it cannot be billed.
    ///
    /// ## When This Occurs
    /// - Second `generate_bill` for an order that already has a bill
    /// - Concurrent settlement claimed the order first
    /// - The order was canceled
    #[error("Order {order_id} cannot be settled (status: {status})")]
    OrderNotSettleable {
        order_id: String,
        status: String,
    },

    /// Only pending orders can be canceled.
    #[error("Order {order_id} is {status}, cannot cancel")]
    OrderNotCancelable {
        order_id: String,
        status: OrderStatus,
    },

    /// Bill already refunded, or its order is in a state the refund policy
    /// does not accept.
    #[error("Bill {bill_id} cannot be refunded: {reason}")]
    BillNotRefundable { bill_id: String, reason: String },

    /// Phone number already used by a registered user or a wallet.
    #[error("Identity already exists: {0}")]
    DuplicateIdentity(String),

    /// Wallets can only be closed at zero balance.
    #[error("Wallet {customer_id} still holds {balance}")]
    WalletNotEmpty { customer_id: String, balance: Money },

    /// Item exists but is switched off in the catalog.
    #[error("Item {0} is not available")]
    ItemUnavailable(String),

    /// Actor is unknown or lacks the capability.
    #[error("{actor} is not allowed to {capability}")]
    Unauthorized { actor: String, capability: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::NotFound { .. } | CoreError::UnknownCustomer(_) => ErrorKind::NotFound,
            CoreError::Unauthorized { .. } => ErrorKind::Forbidden,
            CoreError::InsufficientStock { .. }
            | CoreError::InsufficientFunds { .. }
            | CoreError::InsufficientPoints { .. }
            | CoreError::BelowRedemptionMinimum { .. }
            | CoreError::OrderNotSettleable { .. }
            | CoreError::OrderNotCancelable { .. }
            | CoreError::BillNotRefundable { .. }
            | CoreError::DuplicateIdentity(_)
            | CoreError::WalletNotEmpty { .. }
            | CoreError::ItemUnavailable(_) => ErrorKind::Conflict,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., phone number, non-finite amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Operation is not defined for walk-in customers.
    #[error("{operation} is not available for guest customers")]
    GuestNotAllowed { operation: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            item_ids: vec!["tea".to_string(), "samosa".to_string()],
        };
        assert_eq!(err.to_string(), "Insufficient stock for items: tea, samosa");

        let err = CoreError::InsufficientFunds {
            customer_id: "0300123456".to_string(),
            balance: Money::new(5.0),
            required: Money::new(21.6),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds for 0300123456: balance Rs 5.00, required Rs 21.60"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer id".to_string(),
        };
        assert_eq!(err.to_string(), "customer id is required");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::not_found("order", "o1").kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::UnknownCustomer("x".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            CoreError::OrderNotSettleable {
                order_id: "o1".to_string(),
                status: "completed".to_string(),
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            CoreError::Unauthorized {
                actor: "b1".to_string(),
                capability: "refund".to_string(),
            }
            .kind(),
            ErrorKind::Forbidden
        );
    }

    #[test]
    fn test_error_kind_serialization() {
        let json = serde_json::to_string(&ErrorKind::NotFound).unwrap();
        assert_eq!(json, "\"NOT_FOUND\"");
    }
}
