//! # canteen-db: Database Layer for the Canteen POS
//!
//! This crate provides database access for the canteen POS.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Canteen POS Data Flow                            │
//! │                                                                         │
//! │  canteen-engine (OrderService::create_order)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   canteen-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │    │ OrderRepo     │    │ 001_initial_ │  │   │
//! │  │   │ acquire()     │◄───│ BillRepo      │    │   schema.sql │  │   │
//! │  │   │ begin()       │    │ WalletRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use canteen_db::{CatalogRepository, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("canteen.db")).await?;
//!
//! let mut conn = db.acquire().await?;
//! let menu = CatalogRepository::list_available(&mut conn).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::activity::ActivityRepository;
pub use repository::bill::BillRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::discount::DiscountRepository;
pub use repository::loyalty::LoyaltyRepository;
pub use repository::order::OrderRepository;
pub use repository::settings::SettingsRepository;
pub use repository::wallet::WalletRepository;

pub use sqlx::{Error as SqlxError, SqliteConnection};
