//! # Repository Module
//!
//! Database repository implementations for the canteen POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Connection-Scoped Repositories                       │
//! │                                                                         │
//! │  Engine service                                                        │
//! │       │                                                                 │
//! │       │  let mut tx = db.begin().await?;                               │
//! │       │  OrderRepository::transition(&mut tx, id, Pending, InProgress) │
//! │       │  BillRepository::insert(&mut tx, &bill)                        │
//! │       │  tx.commit().await?;                                           │
//! │       ▼                                                                 │
//! │  XxxRepository::fn(conn: &mut SqliteConnection, ...)                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Every function takes the connection it runs on, so the caller picks   │
//! │  the transaction boundary and several repositories share one.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Menu items and inventory
//! - [`OrderRepository`](order::OrderRepository) - Orders, lines, status transitions
//! - [`BillRepository`](bill::BillRepository) - Bills and the refund flag
//! - [`DiscountRepository`](discount::DiscountRepository) - Promotions
//! - [`WalletRepository`](wallet::WalletRepository) - Wallet balances and ledger
//! - [`LoyaltyRepository`](loyalty::LoyaltyRepository) - Loyalty points and ledger
//! - [`SettingsRepository`](settings::SettingsRepository) - Numeric settings
//! - [`ActivityRepository`](activity::ActivityRepository) - Audit trail

pub mod activity;
pub mod bill;
pub mod catalog;
pub mod discount;
pub mod loyalty;
pub mod order;
pub mod settings;
pub mod wallet;
