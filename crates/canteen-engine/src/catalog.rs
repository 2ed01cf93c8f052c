//! # Catalog Store
//!
//! Menu items and their inventory counters.
//!
//! ## Reservation
//! ```text
//! reserve([tea × 2, samosa × 1, tea × 1])
//!      │
//!      ▼  aggregate per item
//! { samosa: 1, tea: 3 }
//!      │
//!      ▼  BEGIN
//! UPDATE inventory SET quantity = quantity - 1 WHERE item_id = 'samosa' AND quantity >= 1   ✓
//! UPDATE inventory SET quantity = quantity - 3 WHERE item_id = 'tea'    AND quantity >= 3   ✗
//!      │
//!      ▼  any ✗ → ROLLBACK, InsufficientStock { item_ids: ["tea"] }
//!         all ✓ → caller continues inside the same transaction
//! ```

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use canteen_core::validation::{validate_amount, validate_name, validate_order_lines, validate_stock_level};
use canteen_core::{
    new_id, Capability, CoreError, InventoryRecord, LineRequest, MenuItem, Money, StockedItem,
    DEFAULT_LOW_STOCK_THRESHOLD,
};
use canteen_db::{CatalogRepository, SqliteConnection};

use crate::context::Canteen;
use crate::error::EngineResult;

/// Menu and stock operations.
pub struct CatalogStore<'a> {
    ctx: &'a Canteen,
}

impl<'a> CatalogStore<'a> {
    pub(crate) fn new(ctx: &'a Canteen) -> Self {
        CatalogStore { ctx }
    }

    // =========================================================================
    // Menu Items
    // =========================================================================

    /// Creates a menu item together with an empty inventory record.
    pub async fn add_item(
        &self,
        actor: &str,
        name: &str,
        price: Money,
        available: bool,
    ) -> EngineResult<String> {
        self.ctx.authorize(actor, Capability::ManageCatalog)?;
        validate_name("name", name)?;
        validate_amount("price", price)?;

        let item = MenuItem {
            id: new_id(),
            name: name.trim().to_string(),
            price,
            available,
        };

        let mut tx = self.ctx.db().begin().await?;
        CatalogRepository::insert_item(&mut tx, &item).await?;
        CatalogRepository::insert_inventory(
            &mut tx,
            &InventoryRecord {
                item_id: item.id.clone(),
                quantity: 0,
                low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            },
        )
        .await?;
        tx.commit().await?;

        info!(item_id = %item.id, name = %item.name, price = %item.price, "Menu item added");
        self.ctx
            .record(Some(actor), format!("Added menu item {} at {}", item.name, item.price));

        Ok(item.id)
    }

    /// Replaces name, price and availability. Open orders keep their
    /// snapshotted prices.
    pub async fn edit_item(
        &self,
        actor: &str,
        item_id: &str,
        name: &str,
        price: Money,
        available: bool,
    ) -> EngineResult<()> {
        self.ctx.authorize(actor, Capability::ManageCatalog)?;
        validate_name("name", name)?;
        validate_amount("price", price)?;

        let item = MenuItem {
            id: item_id.to_string(),
            name: name.trim().to_string(),
            price,
            available,
        };

        let mut conn = self.ctx.db().acquire().await?;
        if !CatalogRepository::update_item(&mut conn, &item).await? {
            return Err(CoreError::not_found("menu item", item_id).into());
        }

        info!(item_id = %item_id, price = %price, available, "Menu item updated");
        self.ctx.record(Some(actor), format!("Edited menu item {}", item.name));
        Ok(())
    }

    /// Deletes the item and its inventory record.
    pub async fn remove_item(&self, actor: &str, item_id: &str) -> EngineResult<()> {
        self.ctx.authorize(actor, Capability::ManageCatalog)?;

        let mut tx = self.ctx.db().begin().await?;
        if !CatalogRepository::delete_item(&mut tx, item_id).await? {
            return Err(CoreError::not_found("menu item", item_id).into());
        }
        tx.commit().await?;

        info!(item_id = %item_id, "Menu item removed");
        self.ctx.record(Some(actor), format!("Removed menu item {item_id}"));
        Ok(())
    }

    pub async fn item(&self, item_id: &str) -> EngineResult<MenuItem> {
        let mut conn = self.ctx.db().acquire().await?;
        CatalogRepository::get_item(&mut conn, item_id)
            .await?
            .ok_or_else(|| CoreError::not_found("menu item", item_id).into())
    }

    /// Items a biller can put on an order right now.
    pub async fn list_available(&self) -> EngineResult<Vec<StockedItem>> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(CatalogRepository::list_available(&mut conn).await?)
    }

    pub async fn list_all(&self) -> EngineResult<Vec<StockedItem>> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(CatalogRepository::list_all(&mut conn).await?)
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// Absolute set of on-hand quantity and low-stock threshold.
    pub async fn set_stock(
        &self,
        actor: &str,
        item_id: &str,
        quantity: i64,
        low_stock_threshold: i64,
    ) -> EngineResult<()> {
        self.ctx.authorize(actor, Capability::ManageInventory)?;
        validate_stock_level("quantity", quantity)?;
        validate_stock_level("low_stock_threshold", low_stock_threshold)?;

        let mut conn = self.ctx.db().acquire().await?;
        if !CatalogRepository::set_stock(&mut conn, item_id, quantity, low_stock_threshold).await? {
            return Err(CoreError::not_found("inventory record", item_id).into());
        }

        info!(item_id = %item_id, quantity, low_stock_threshold, "Stock set");
        self.ctx
            .record(Some(actor), format!("Set stock of {item_id} to {quantity}"));
        Ok(())
    }

    /// All-or-nothing stock reservation in its own transaction.
    pub async fn reserve(&self, lines: &[LineRequest]) -> EngineResult<()> {
        validate_order_lines(lines)?;

        let mut tx = self.ctx.db().begin().await?;
        if let Err(err) = reserve_in(&mut tx, lines).await {
            tx.rollback().await?;
            return Err(err);
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn inventory(&self) -> EngineResult<Vec<InventoryRecord>> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(CatalogRepository::list_inventory(&mut conn).await?)
    }

    /// Records at or below their threshold.
    pub async fn low_stock(&self) -> EngineResult<Vec<InventoryRecord>> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(CatalogRepository::list_low_stock(&mut conn).await?)
    }
}

/// Conditionally decrements stock for every line on `conn`.
///
/// On error some decrements may already have run; the caller must roll the
/// transaction back.
pub(crate) async fn reserve_in(conn: &mut SqliteConnection, lines: &[LineRequest]) -> EngineResult<()> {
    let mut wanted: BTreeMap<&str, i64> = BTreeMap::new();
    for line in lines {
        *wanted.entry(line.item_id.as_str()).or_insert(0) += line.quantity;
    }

    let mut short = Vec::new();
    for (item_id, quantity) in wanted {
        if !CatalogRepository::try_decrement(conn, item_id, quantity).await? {
            short.push(item_id.to_string());
        }
    }

    if !short.is_empty() {
        warn!(items = ?short, "Reservation rejected");
        return Err(CoreError::InsufficientStock { item_ids: short }.into());
    }

    debug!(lines = lines.len(), "Stock reserved");
    Ok(())
}
