//! # Bill Repository
//!
//! Settlement records. A bill is written once by settlement and changed only
//! by the refund flag flip.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use canteen_core::{Bill, OrderStatus, SalesSummary, TopItem};

const BILL_COLUMNS: &str = r#"
    id, order_id, subtotal, discount_amount, loyalty_discount, points_redeemed,
    tax, total, payment_method, issued_by, created_at,
    refunded, refunded_at, refunded_by
"#;

/// Repository for bills.
#[derive(Debug, Clone, Copy, Default)]
pub struct BillRepository;

impl BillRepository {
    /// Inserts a bill. A second bill for the same order is a UNIQUE violation.
    pub async fn insert(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<()> {
        debug!(id = %bill.id, order_id = %bill.order_id, total = %bill.total, "Inserting bill");

        sqlx::query(
            r#"
            INSERT INTO bills (
                id, order_id, subtotal, discount_amount, loyalty_discount, points_redeemed,
                tax, total, payment_method, issued_by, created_at,
                refunded, refunded_at, refunded_by
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14
            )
            "#,
        )
        .bind(&bill.id)
        .bind(&bill.order_id)
        .bind(bill.subtotal)
        .bind(bill.discount_amount)
        .bind(bill.loyalty_discount)
        .bind(bill.points_redeemed)
        .bind(bill.tax)
        .bind(bill.total)
        .bind(bill.payment_method)
        .bind(&bill.issued_by)
        .bind(bill.created_at)
        .bind(bill.refunded)
        .bind(bill.refunded_at)
        .bind(&bill.refunded_by)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Bill>> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = ?1");
        let bill = sqlx::query_as::<_, Bill>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(bill)
    }

    pub async fn get_by_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Option<Bill>> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE order_id = ?1");
        let bill = sqlx::query_as::<_, Bill>(&sql)
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(bill)
    }

    /// All bills, newest first.
    pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<Bill>> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills ORDER BY created_at DESC, id");
        let bills = sqlx::query_as::<_, Bill>(&sql).fetch_all(&mut *conn).await?;

        Ok(bills)
    }

    /// Flips `refunded` to true if it is still false and the bill's order is
    /// in one of `order_statuses`. Returns false otherwise.
    pub async fn mark_refunded(
        conn: &mut SqliteConnection,
        id: &str,
        refunded_by: &str,
        order_statuses: &[OrderStatus],
    ) -> DbResult<bool> {
        if order_statuses.is_empty() {
            return Ok(false);
        }

        let placeholders = (0..order_statuses.len())
            .map(|i| format!("?{}", i + 4))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            r#"
            UPDATE bills SET
                refunded = 1,
                refunded_at = ?2,
                refunded_by = ?3
            WHERE id = ?1
              AND refunded = 0
              AND EXISTS (
                  SELECT 1 FROM orders
                  WHERE orders.id = bills.order_id
                    AND orders.status IN ({placeholders})
              )
            "#
        );

        let mut query = sqlx::query(&sql).bind(id).bind(Utc::now()).bind(refunded_by);
        for status in order_statuses {
            query = query.bind(*status);
        }

        let result = query.execute(&mut *conn).await?;
        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Sum and count of bills that have not been refunded.
    pub async fn sales_summary(conn: &mut SqliteConnection) -> DbResult<SalesSummary> {
        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT
                COALESCE(SUM(total), 0.0) AS total_sales,
                COUNT(*) AS bill_count
            FROM bills
            WHERE refunded = 0
            "#,
        )
        .fetch_one(&mut *conn)
        .await?;

        Ok(summary)
    }

    /// Best-selling items by quantity over non-refunded bills. Names come
    /// from the menu, or from the order snapshot once an item is removed.
    pub async fn top_items(conn: &mut SqliteConnection, limit: i64) -> DbResult<Vec<TopItem>> {
        let items = sqlx::query_as::<_, TopItem>(
            r#"
            SELECT
                l.item_id AS item_id,
                COALESCE(m.name, MAX(l.name)) AS name,
                SUM(l.quantity) AS quantity
            FROM order_lines l
            JOIN bills b ON b.order_id = l.order_id AND b.refunded = 0
            LEFT JOIN menu_items m ON m.id = l.item_id
            GROUP BY l.item_id
            ORDER BY quantity DESC, name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }
}
