//! # canteen-engine: Order-to-Settlement Engine
//!
//! Services that take a canteen order from creation to a settled (and
//! possibly refunded) bill while keeping stock, wallet balances and loyalty
//! points consistent.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Canteen POS Workspace                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 canteen-engine (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │  Canteen ──► CatalogStore  OrderService  SettlementService      │   │
//! │  │              LedgerService PricingEngine DiscountBook           │   │
//! │  │              SettingsService ActivityLog                        │   │
//! │  └──────────────────────────────┬──────────────────────────────────┘   │
//! │                                 │                                       │
//! │           ┌─────────────────────┴─────────────────────┐                 │
//! │           ▼                                           ▼                 │
//! │  ┌─────────────────────┐                   ┌─────────────────────┐     │
//! │  │    canteen-core     │                   │     canteen-db      │     │
//! │  │  types, pricing,    │                   │  pool, migrations,  │     │
//! │  │  roles, validation  │                   │  repositories       │     │
//! │  └─────────────────────┘                   └─────────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Order Flow
//! ```text
//! create_order ──► pending ──► generate_bill ──► completed + Bill
//!                     │                                  │
//!                     └──► cancel_order ──► canceled     └──► process_refund
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use canteen_core::{LineRequest, PaymentMethod, Role, StaticDirectory};
//! use canteen_engine::{Canteen, EngineConfig, TracingAuditSink};
//!
//! let directory = StaticDirectory::new().with_operator("asha", Role::Biller);
//! let canteen = Canteen::open(EngineConfig::load()?, Arc::new(directory), Arc::new(TracingAuditSink)).await?;
//!
//! let order_id = canteen
//!     .orders()
//!     .create_order("asha", "guest", &[LineRequest::new(tea_id, 2)])
//!     .await?;
//! let bill_id = canteen
//!     .settlement()
//!     .generate_bill(&order_id, PaymentMethod::Cash, None, 0, "asha")
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod catalog;
pub mod config;
pub mod context;
pub mod discounts;
pub mod error;
pub mod ledger;
pub mod orders;
pub mod pricing;
pub mod settings;
pub mod settlement;

// =============================================================================
// Re-exports
// =============================================================================

pub use audit::{ActivityLog, SqliteAuditSink, TracingAuditSink};
pub use catalog::CatalogStore;
pub use config::{ConfigError, EngineConfig, RefundPolicy};
pub use context::Canteen;
pub use discounts::DiscountBook;
pub use error::{EngineError, EngineResult};
pub use ledger::LedgerService;
pub use orders::OrderService;
pub use pricing::PricingEngine;
pub use settings::SettingsService;
pub use settlement::SettlementService;

pub use canteen_core::ErrorKind;
