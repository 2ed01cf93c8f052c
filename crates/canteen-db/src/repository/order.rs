//! # Order Repository
//!
//! Database operations for orders and order lines.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── insert() → Order { status: Pending } + lines (snapshots)       │
//! │                                                                         │
//! │  2a. SETTLE (one transaction)                                          │
//! │     └── transition(Pending → InProgress)   ← claim, first write        │
//! │     └── ... bill, wallet, loyalty ...                                  │
//! │     └── transition(InProgress → Completed)                             │
//! │                                                                         │
//! │  2b. CANCEL                                                            │
//! │     └── transition(Pending → Canceled)                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every transition is a conditional `UPDATE ... WHERE status = ?from`, so a
//! racing second caller sees zero affected rows instead of a stale read.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use canteen_core::{CustomerRef, Money, Order, OrderLine, OrderStatus};

/// Row shape of the `orders` table.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    customer_id: Option<String>,
    status: OrderStatus,
    total: Money,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            customer: CustomerRef::from_column(self.customer_id),
            status: self.status,
            total: self.total,
            created_at: self.created_at,
            updated_at: self.updated_at,
            lines,
        }
    }
}

/// Repository for order database operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderRepository;

impl OrderRepository {
    /// Inserts an order and all of its lines.
    pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, lines = order.lines.len(), "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (id, customer_id, status, total, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&order.id)
        .bind(order.customer.as_column())
        .bind(order.status)
        .bind(order.total)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        for (line_no, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (order_id, line_no, item_id, name, quantity, unit_price)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&order.id)
            .bind(line_no as i64)
            .bind(&line.item_id)
            .bind(&line.name)
            .bind(line.quantity)
            .bind(line.unit_price)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Gets an order with its lines.
    pub async fn get(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, customer_id, status, total, created_at, updated_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        match row {
            Some(row) => {
                let lines = Self::get_lines(conn, &row.id).await?;
                Ok(Some(row.into_order(lines)))
            }
            None => Ok(None),
        }
    }

    /// Lines of an order in insertion order.
    pub async fn get_lines(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT item_id, name, quantity, unit_price
            FROM order_lines
            WHERE order_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(lines)
    }

    /// Lists orders, newest first, optionally restricted to one status.
    pub async fn list(
        conn: &mut SqliteConnection,
        status: Option<OrderStatus>,
    ) -> DbResult<Vec<Order>> {
        let rows = match status {
            Some(status) => {
                sqlx::query_as::<_, OrderRow>(
                    r#"
                    SELECT id, customer_id, status, total, created_at, updated_at
                    FROM orders
                    WHERE status = ?1
                    ORDER BY created_at DESC, id
                    "#,
                )
                .bind(status)
                .fetch_all(&mut *conn)
                .await?
            }
            None => {
                sqlx::query_as::<_, OrderRow>(
                    r#"
                    SELECT id, customer_id, status, total, created_at, updated_at
                    FROM orders
                    ORDER BY created_at DESC, id
                    "#,
                )
                .fetch_all(&mut *conn)
                .await?
            }
        };

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = Self::get_lines(conn, &row.id).await?;
            orders.push(row.into_order(lines));
        }

        Ok(orders)
    }

    /// Current status of an order, if it exists.
    pub async fn status(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<OrderStatus>> {
        let status = sqlx::query_scalar::<_, OrderStatus>("SELECT status FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(status)
    }

    /// Moves an order from `from` to `to`. Returns false if the order does
    /// not exist or is not in `from`.
    pub async fn transition(
        conn: &mut SqliteConnection,
        id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DbResult<bool> {
        debug!(id = %id, from = %from, to = %to, "Order transition");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?3,
                updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
