//! # Order Service
//!
//! ## Order State Machine
//! ```text
//!                 cancel_order
//!   ┌─────────┐ ─────────────────────────────► ┌──────────┐
//!   │ pending │                                │ canceled │
//!   └─────────┘ ──► ┌─────────────┐ ──► ┌───────────┐
//!        ▲          │ in_progress │     │ completed │
//!        │          └─────────────┘     └───────────┘
//!        └─ rollback ──────┘   (only inside a settlement transaction)
//! ```
//!
//! ## Creation
//! 1. Validate the customer id and lines.
//! 2. Resolve the customer: `guest`, a directory identity, or a wallet owner.
//! 3. Snapshot name and price of every item.
//! 4. One transaction: reserve stock, insert order and lines.
//!
//! Canceling does not return stock.

use chrono::Utc;
use tracing::{info, warn};

use canteen_core::validation::{validate_customer_id, validate_order_lines};
use canteen_core::{
    new_id, Capability, CoreError, CustomerRef, LineRequest, Order, OrderFilter, OrderLine, OrderStatus,
};
use canteen_db::{CatalogRepository, OrderRepository, SqliteConnection, WalletRepository};

use crate::catalog;
use crate::context::Canteen;
use crate::error::EngineResult;

pub struct OrderService<'a> {
    ctx: &'a Canteen,
}

impl<'a> OrderService<'a> {
    pub(crate) fn new(ctx: &'a Canteen) -> Self {
        OrderService { ctx }
    }

    /// Creates a pending order and reserves its stock. Returns the order id.
    pub async fn create_order(
        &self,
        actor: &str,
        customer_id: &str,
        lines: &[LineRequest],
    ) -> EngineResult<String> {
        self.ctx.authorize(actor, Capability::TakeOrders)?;
        validate_customer_id(customer_id)?;
        validate_order_lines(lines)?;

        let customer = CustomerRef::parse(customer_id);

        // Snapshot on a plain connection, released before the write transaction.
        let snapshot = {
            let mut conn = self.ctx.db().acquire().await?;
            self.resolve_customer(&mut conn, &customer).await?;
            snapshot_lines(&mut conn, lines).await?
        };

        let now = Utc::now();
        let order = Order {
            id: new_id(),
            customer,
            status: OrderStatus::Pending,
            total: snapshot.iter().map(OrderLine::line_total).sum(),
            created_at: now,
            updated_at: now,
            lines: snapshot,
        };

        let mut tx = self.ctx.db().begin().await?;
        catalog::reserve_in(&mut tx, lines).await?;
        OrderRepository::insert(&mut tx, &order).await?;
        tx.commit().await?;

        info!(
            order_id = %order.id,
            customer = %order.customer,
            lines = order.lines.len(),
            total = %order.total,
            "Order created"
        );
        self.ctx.record(
            Some(actor),
            format!("Created order {} for {} totalling {}", order.id, order.customer, order.total),
        );

        Ok(order.id)
    }

    /// `pending → canceled`. Stock stays deducted.
    pub async fn cancel_order(&self, actor: &str, order_id: &str) -> EngineResult<()> {
        self.ctx.authorize(actor, Capability::TakeOrders)?;

        let mut tx = self.ctx.db().begin().await?;
        let canceled =
            OrderRepository::transition(&mut tx, order_id, OrderStatus::Pending, OrderStatus::Canceled)
                .await?;
        if !canceled {
            return match OrderRepository::status(&mut tx, order_id).await? {
                None => Err(CoreError::not_found("order", order_id).into()),
                Some(status) => Err(CoreError::OrderNotCancelable {
                    order_id: order_id.to_string(),
                    status,
                }
                .into()),
            };
        }
        tx.commit().await?;

        info!(order_id = %order_id, "Order canceled");
        self.ctx.record(Some(actor), format!("Canceled order {order_id}"));
        Ok(())
    }

    /// One order with its lines.
    pub async fn order(&self, order_id: &str) -> EngineResult<Order> {
        let mut conn = self.ctx.db().acquire().await?;
        OrderRepository::get(&mut conn, order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("order", order_id).into())
    }

    /// Newest first.
    pub async fn orders(&self, filter: OrderFilter) -> EngineResult<Vec<Order>> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(OrderRepository::list(&mut conn, filter.status()).await?)
    }

    async fn resolve_customer(&self, conn: &mut SqliteConnection, customer: &CustomerRef) -> EngineResult<()> {
        let Some(id) = customer.registered_id() else {
            return Ok(());
        };

        if self.ctx.authenticator().is_known_customer(id) {
            return Ok(());
        }
        if WalletRepository::get(conn, id).await?.is_some() {
            return Ok(());
        }

        warn!(customer_id = %id, "Order for unknown customer");
        Err(CoreError::UnknownCustomer(id.to_string()).into())
    }
}

/// Freezes the current name and price of every requested item.
async fn snapshot_lines(conn: &mut SqliteConnection, lines: &[LineRequest]) -> EngineResult<Vec<OrderLine>> {
    let mut snapshot = Vec::with_capacity(lines.len());

    for line in lines {
        let item = CatalogRepository::get_item(conn, &line.item_id)
            .await?
            .ok_or_else(|| CoreError::not_found("menu item", &line.item_id))?;
        if !item.available {
            return Err(CoreError::ItemUnavailable(item.name).into());
        }

        snapshot.push(OrderLine {
            item_id: item.id,
            name: item.name,
            quantity: line.quantity,
            unit_price: item.price,
        });
    }

    Ok(snapshot)
}

/// `in_progress → completed`, on the settlement transaction.
pub(crate) async fn complete_in(conn: &mut SqliteConnection, order_id: &str) -> EngineResult<()> {
    if !OrderRepository::transition(conn, order_id, OrderStatus::InProgress, OrderStatus::Completed).await? {
        let status = OrderRepository::status(conn, order_id).await?;
        return Err(CoreError::OrderNotSettleable {
            order_id: order_id.to_string(),
            status: status.map_or_else(|| "missing".to_string(), |s| s.to_string()),
        }
        .into());
    }
    Ok(())
}
