//! # Seed Data Generator
//!
//! Populates a development database with a canteen menu, stock, a lunch
//! combo and a few demo wallets.
//!
//! ## Usage
//! ```bash
//! # Database from CANTEEN_DB_PATH (default ./canteen.db)
//! cargo run -p canteen-engine --bin seed
//!
//! # Explicit database path
//! cargo run -p canteen-engine --bin seed -- --db ./data/canteen.db
//!
//! # More output
//! RUST_LOG=debug cargo run -p canteen-engine --bin seed
//! ```

use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use canteen_core::{DiscountDraft, DiscountKind, Money, Role, StaticDirectory};
use canteen_engine::{Canteen, EngineConfig, TracingAuditSink};

/// Operator the seed acts as.
const SEED_ADMIN: &str = "seed-admin";

/// (name, price, stock)
const MENU: &[(&str, f64, i64)] = &[
    ("Tea", 10.0, 200),
    ("Coffee", 15.0, 150),
    ("Samosa", 12.0, 80),
    ("Vada Pav", 20.0, 60),
    ("Veg Thali", 70.0, 40),
    ("Masala Dosa", 45.0, 50),
    ("Idli Sambar", 35.0, 50),
    ("Lemon Rice", 40.0, 30),
    ("Gulab Jamun", 25.0, 8),
    ("Buttermilk", 12.0, 5),
];

/// (phone number, opening balance)
const WALLETS: &[(&str, f64)] = &[("9876543210", 500.0), ("9123456780", 150.0), ("9000011111", 0.0)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = EngineConfig::load()?;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Canteen POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: $CANTEEN_DB_PATH or ./canteen.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(path = %config.database_path.display(), "Seeding database");

    let directory = StaticDirectory::new().with_operator(SEED_ADMIN, Role::Admin);
    let canteen = Canteen::open(config, Arc::new(directory), Arc::new(TracingAuditSink)).await?;

    let catalog = canteen.catalog();
    if !catalog.list_all().await?.is_empty() {
        warn!("Menu already present, skipping seed. Delete the database file to regenerate.");
        return Ok(());
    }

    let mut item_ids = Vec::with_capacity(MENU.len());
    for (name, price, stock) in MENU {
        let id = catalog.add_item(SEED_ADMIN, name, Money::new(*price), true).await?;
        catalog.set_stock(SEED_ADMIN, &id, *stock, 10).await?;
        item_ids.push(id);
    }

    // Tea + Samosa combo, valid for a month.
    let now = Utc::now();
    let combo: BTreeSet<String> = [item_ids[0].clone(), item_ids[2].clone()].into_iter().collect();
    let combo_id = canteen
        .discounts()
        .add(
            SEED_ADMIN,
            DiscountDraft {
                name: "Chai Samosa Combo".to_string(),
                kind: DiscountKind::Combo,
                value: 4.0,
                starts_at: now,
                ends_at: now + Duration::days(30),
                combo_item_ids: combo,
            },
        )
        .await?;

    let ledger = canteen.ledger();
    for (phone, balance) in WALLETS {
        ledger.create_wallet(SEED_ADMIN, phone, Money::new(*balance)).await?;
    }

    let low_stock = catalog.low_stock().await?;
    let settings = canteen.settings().snapshot().await?;

    let summary = json!({
        "menu_items": item_ids.len(),
        "low_stock": low_stock.iter().map(|r| &r.item_id).collect::<Vec<_>>(),
        "discount": combo_id,
        "wallets": WALLETS.iter().map(|(phone, _)| phone).collect::<Vec<_>>(),
        "settings": settings,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    info!("Seed complete");
    Ok(())
}
