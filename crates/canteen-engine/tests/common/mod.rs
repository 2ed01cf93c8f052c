//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use canteen_core::{Money, NullAuditSink, Role, StaticDirectory};
use canteen_db::DbConfig;
use canteen_engine::{Canteen, EngineConfig, RefundPolicy};

pub const ADMIN: &str = "admin";
pub const MANAGER: &str = "manager";
pub const BILLER: &str = "biller";

/// Registered customer known to the directory.
pub const MEMBER: &str = "9000000001";

/// Phone number used for wallet-only customers.
pub const WALLET_PHONE: &str = "9876543210";

pub fn directory() -> StaticDirectory {
    StaticDirectory::new()
        .with_operator(ADMIN, Role::Admin)
        .with_operator(MANAGER, Role::Manager)
        .with_operator(BILLER, Role::Biller)
        .with_customer(MEMBER)
}

pub async fn canteen() -> Canteen {
    canteen_with(RefundPolicy::default()).await
}

pub async fn canteen_with(policy: RefundPolicy) -> Canteen {
    Canteen::open_with(
        DbConfig::in_memory(),
        EngineConfig::default().refund_policy(policy),
        Arc::new(directory()),
        Arc::new(NullAuditSink),
    )
    .await
    .expect("in-memory canteen")
}

/// File-backed canteen with a real connection pool, for contention tests.
pub async fn file_canteen(dir: &Path, connections: u32) -> Canteen {
    Canteen::open_with(
        DbConfig::new(dir.join("canteen.db")).max_connections(connections),
        EngineConfig::default(),
        Arc::new(directory()),
        Arc::new(NullAuditSink),
    )
    .await
    .expect("file canteen")
}

/// Adds an available item with `quantity` on hand.
pub async fn stocked_item(canteen: &Canteen, name: &str, price: f64, quantity: i64) -> String {
    let catalog = canteen.catalog();
    let id = catalog
        .add_item(ADMIN, name, Money::new(price), true)
        .await
        .expect("add item");
    catalog
        .set_stock(ADMIN, &id, quantity, 2)
        .await
        .expect("set stock");
    id
}

pub async fn on_hand(canteen: &Canteen, item_id: &str) -> i64 {
    canteen
        .catalog()
        .inventory()
        .await
        .expect("inventory")
        .into_iter()
        .find(|r| r.item_id == item_id)
        .map(|r| r.quantity)
        .expect("inventory record")
}

/// Σ loyalty ledger deltas for one customer.
pub async fn loyalty_ledger_sum(canteen: &Canteen, customer_id: &str) -> i64 {
    canteen
        .ledger()
        .loyalty_history(Some(customer_id))
        .await
        .expect("history")
        .iter()
        .map(|e| e.delta)
        .sum()
}
