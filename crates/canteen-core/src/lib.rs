//! # canteen-core: Pure Business Logic for the Canteen POS
//!
//! This crate is the **heart** of the canteen point-of-sale. It contains the
//! domain model and every calculation that does not need storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Canteen POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    canteen-engine                               │   │
//! │  │   Catalog ─► Orders ─► Pricing ─► Settlement ─► Ledger          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ canteen-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │   roles   │  │   │
//! │  │   │ Order     │  │   Money   │  │ discount  │  │ Role      │  │   │
//! │  │   │ Bill      │  │ TaxRate   │  │ tax       │  │Capability │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    canteen-db (Database Layer)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (MenuItem, Order, Bill, Discount, ledgers)
//! - [`money`] - Money and rate types
//! - [`pricing`] - Discount and tax composition
//! - [`roles`] - Operator roles and the capability table
//! - [`identity`] - Authenticator and AuditSink collaborator boundaries
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use canteen_core::money::{Money, TaxRate};
//! use canteen_core::pricing::compose;
//!
//! let priced = compose(Money::new(20.0), Money::zero(), Money::zero(), TaxRate::new(0.08));
//! assert!((priced.total.amount() - 21.6).abs() < 1e-9);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod identity;
pub mod money;
pub mod pricing;
pub mod roles;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use identity::{AuditEntry, AuditSink, Authenticator, NullAuditSink, StaticDirectory};
pub use money::{Money, TaxRate};
pub use pricing::PricedTotal;
pub use roles::{Capability, Role};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Identity used for walk-in customers without an account.
///
/// Guest orders are persisted with a NULL customer and never touch wallets or
/// loyalty balances.
pub const GUEST_CUSTOMER_ID: &str = "guest";

/// Maximum lines allowed in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single item on one order line.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Fewest loyalty points a customer may redeem at once.
pub const MIN_REDEEMABLE_POINTS: i64 = 10;

/// Loyalty points that make up one currency unit on redemption.
pub const POINTS_PER_CURRENCY_UNIT: f64 = 10.0;

/// Tax rate used until an operator stores one.
pub const DEFAULT_TAX_RATE: f64 = 0.08;

/// Currency units that must be spent to earn one loyalty point, until an
/// operator stores a different rate.
pub const DEFAULT_LOYALTY_EARN_RATE: f64 = 10.0;

/// Low-stock threshold given to a freshly created inventory record.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;
