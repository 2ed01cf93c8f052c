//! # Catalog Repository
//!
//! Menu items and their paired inventory counters.
//!
//! ## Stock Decrement
//! ```text
//! UPDATE inventory
//!    SET quantity = quantity - ?qty
//!  WHERE item_id = ?id AND quantity >= ?qty
//!
//!  rows_affected = 1  → reserved
//!  rows_affected = 0  → short (or no inventory row)
//! ```
//! The check and the decrement are one statement, so two concurrent orders
//! can never both take the last unit.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use canteen_core::{InventoryRecord, MenuItem, StockedItem};

/// Repository for menu items and inventory.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogRepository;

impl CatalogRepository {
    // =========================================================================
    // Menu Items
    // =========================================================================

    /// Inserts a menu item.
    pub async fn insert_item(conn: &mut SqliteConnection, item: &MenuItem) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Inserting menu item");
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO menu_items (id, name, price, available, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.available)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Updates name, price and availability. Returns false if the item does
    /// not exist.
    pub async fn update_item(conn: &mut SqliteConnection, item: &MenuItem) -> DbResult<bool> {
        debug!(id = %item.id, "Updating menu item");

        let result = sqlx::query(
            r#"
            UPDATE menu_items SET
                name = ?2,
                price = ?3,
                available = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.available)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes an item and its inventory record. Returns false if the item
    /// does not exist.
    pub async fn delete_item(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting menu item");

        sqlx::query("DELETE FROM inventory WHERE item_id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        let result = sqlx::query("DELETE FROM menu_items WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Gets a menu item by ID.
    pub async fn get_item(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<MenuItem>> {
        let item = sqlx::query_as::<_, MenuItem>(
            "SELECT id, name, price, available FROM menu_items WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(item)
    }

    /// Every item with its stock, ordered by name.
    pub async fn list_all(conn: &mut SqliteConnection) -> DbResult<Vec<StockedItem>> {
        let items = sqlx::query_as::<_, StockedItem>(
            r#"
            SELECT m.id, m.name, m.price, m.available,
                   i.quantity, i.low_stock_threshold
            FROM menu_items m
            JOIN inventory i ON i.item_id = m.id
            ORDER BY m.name, m.id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    /// Items a biller can sell right now: available and in stock.
    pub async fn list_available(conn: &mut SqliteConnection) -> DbResult<Vec<StockedItem>> {
        let items = sqlx::query_as::<_, StockedItem>(
            r#"
            SELECT m.id, m.name, m.price, m.available,
                   i.quantity, i.low_stock_threshold
            FROM menu_items m
            JOIN inventory i ON i.item_id = m.id
            WHERE m.available = 1 AND i.quantity > 0
            ORDER BY m.name, m.id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// Creates the inventory record paired with a new item.
    pub async fn insert_inventory(
        conn: &mut SqliteConnection,
        record: &InventoryRecord,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inventory (item_id, quantity, low_stock_threshold)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&record.item_id)
        .bind(record.quantity)
        .bind(record.low_stock_threshold)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Absolute set of quantity and threshold. Returns false if no record
    /// exists for the item.
    pub async fn set_stock(
        conn: &mut SqliteConnection,
        item_id: &str,
        quantity: i64,
        low_stock_threshold: i64,
    ) -> DbResult<bool> {
        debug!(item_id = %item_id, quantity, low_stock_threshold, "Setting stock");

        let result = sqlx::query(
            r#"
            UPDATE inventory SET
                quantity = ?2,
                low_stock_threshold = ?3
            WHERE item_id = ?1
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .bind(low_stock_threshold)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Takes `quantity` units if at least that many are on hand.
    pub async fn try_decrement(
        conn: &mut SqliteConnection,
        item_id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = quantity - ?2
            WHERE item_id = ?1 AND quantity >= ?2
            "#,
        )
        .bind(item_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Gets the inventory record for one item.
    pub async fn get_inventory(
        conn: &mut SqliteConnection,
        item_id: &str,
    ) -> DbResult<Option<InventoryRecord>> {
        let record = sqlx::query_as::<_, InventoryRecord>(
            "SELECT item_id, quantity, low_stock_threshold FROM inventory WHERE item_id = ?1",
        )
        .bind(item_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(record)
    }

    /// All inventory records.
    pub async fn list_inventory(conn: &mut SqliteConnection) -> DbResult<Vec<InventoryRecord>> {
        let records = sqlx::query_as::<_, InventoryRecord>(
            "SELECT item_id, quantity, low_stock_threshold FROM inventory ORDER BY item_id",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(records)
    }

    /// Records at or below their low-stock threshold.
    pub async fn list_low_stock(conn: &mut SqliteConnection) -> DbResult<Vec<InventoryRecord>> {
        let records = sqlx::query_as::<_, InventoryRecord>(
            r#"
            SELECT item_id, quantity, low_stock_threshold
            FROM inventory
            WHERE quantity <= low_stock_threshold
            ORDER BY quantity, item_id
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(records)
    }
}
