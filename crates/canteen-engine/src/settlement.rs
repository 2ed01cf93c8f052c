//! # Settlement Service
//!
//! Issues bills for pending orders and refunds them.
//!
//! ## Bill Generation (one transaction)
//! ```text
//! BEGIN
//!  1. UPDATE orders SET status='in_progress'
//!       WHERE id=? AND status='pending'          0 rows → OrderNotSettleable
//!  2. price: redeem points → discount → tax
//!  3. wallet + registered? debit the customer    short  → InsufficientFunds
//!  4. INSERT bill (refunded = 0)
//!  5. UPDATE orders SET status='completed' WHERE status='in_progress'
//!  6. registered customer? earn points on the total
//! COMMIT ──► audit
//!
//! any error before COMMIT: rollback, order back to pending, balances untouched
//! ```
//!
//! ## Refund (one transaction)
//! ```text
//! UPDATE bills SET refunded=1 WHERE id=? AND refunded=0
//!   AND order status IN (policy)        0 rows → NotFound | BillNotRefundable
//! wallet bill? credit the order's customer with bill.total (reason: refund)
//! ```
//! Loyalty and inventory are not reversed.

use chrono::Utc;
use tracing::{info, warn};

use canteen_core::validation::validate_points;
use canteen_core::{
    new_id, Bill, Capability, CoreError, OrderStatus, PaymentMethod, SalesSummary, TopItem,
    WalletEntryReason,
};
use canteen_db::{BillRepository, OrderRepository, SqliteConnection};

use crate::context::Canteen;
use crate::error::EngineResult;
use crate::{ledger, orders, pricing, settings};

pub struct SettlementService<'a> {
    ctx: &'a Canteen,
}

impl<'a> SettlementService<'a> {
    pub(crate) fn new(ctx: &'a Canteen) -> Self {
        SettlementService { ctx }
    }

    /// Settles a pending order. Returns the bill id.
    pub async fn generate_bill(
        &self,
        order_id: &str,
        payment_method: PaymentMethod,
        discount_id: Option<&str>,
        points: i64,
        acting_user_id: &str,
    ) -> EngineResult<String> {
        self.ctx.authorize(acting_user_id, Capability::Settle)?;
        validate_points(points)?;

        let mut tx = self.ctx.db().begin().await?;

        let claimed =
            OrderRepository::transition(&mut tx, order_id, OrderStatus::Pending, OrderStatus::InProgress)
                .await?;
        if !claimed {
            return Err(not_settleable(&mut tx, order_id).await?.into());
        }

        let order = OrderRepository::get(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("order", order_id))?;

        let now = Utc::now();
        let bill_id = new_id();
        let (priced, redeemed) =
            pricing::price_in(&mut tx, &order, discount_id, points, &order.customer, now).await?;

        // Guests have no wallet; a guest wallet bill is issued without a debit.
        if payment_method == PaymentMethod::Wallet {
            if let Some(customer_id) = order.customer.registered_id() {
                ledger::debit_in(&mut tx, customer_id, priced.total, Some(bill_id.as_str())).await?;
            }
        }

        let bill = Bill {
            id: bill_id,
            order_id: order.id.clone(),
            subtotal: priced.taxable,
            discount_amount: priced.discount,
            loyalty_discount: priced.loyalty_discount,
            points_redeemed: redeemed,
            tax: priced.tax,
            total: priced.total,
            payment_method,
            issued_by: acting_user_id.to_string(),
            created_at: now,
            refunded: false,
            refunded_at: None,
            refunded_by: None,
        };
        BillRepository::insert(&mut tx, &bill).await?;

        orders::complete_in(&mut tx, &order.id).await?;

        let earn_rate = settings::read_in(&mut tx).await?.loyalty_earn_rate;
        let earned = ledger::earn_in(&mut tx, &order.customer, bill.total, earn_rate).await?;

        tx.commit().await?;

        info!(
            bill_id = %bill.id,
            order_id = %order.id,
            method = %payment_method,
            total = %bill.total,
            points_redeemed = redeemed,
            points_earned = earned,
            "Bill generated"
        );
        self.ctx.record(
            Some(acting_user_id),
            format!(
                "Generated bill {} for order {} ({} by {})",
                bill.id, order.id, bill.total, payment_method
            ),
        );

        Ok(bill.id)
    }

    /// Marks a bill refunded and returns the wallet payment, if any.
    pub async fn process_refund(&self, bill_id: &str, acting_user_id: &str) -> EngineResult<Bill> {
        self.ctx.authorize(acting_user_id, Capability::Refund)?;
        let policy = self.ctx.config().refund_policy;

        let mut tx = self.ctx.db().begin().await?;

        let flipped =
            BillRepository::mark_refunded(&mut tx, bill_id, acting_user_id, policy.allowed_statuses())
                .await?;
        if !flipped {
            let bill = BillRepository::get(&mut tx, bill_id)
                .await?
                .ok_or_else(|| CoreError::not_found("bill", bill_id))?;

            let reason = if bill.refunded {
                "already refunded".to_string()
            } else {
                let status = OrderRepository::status(&mut tx, &bill.order_id).await?;
                match status {
                    Some(status) if !policy.allows(status) => {
                        format!("order is {status}, refund policy is {policy}")
                    }
                    Some(status) => format!("order changed to {status} during refund"),
                    None => "order is missing".to_string(),
                }
            };

            warn!(bill_id = %bill_id, reason = %reason, "Refund refused");
            return Err(CoreError::BillNotRefundable {
                bill_id: bill_id.to_string(),
                reason,
            }
            .into());
        }

        let bill = BillRepository::get(&mut tx, bill_id)
            .await?
            .ok_or_else(|| CoreError::not_found("bill", bill_id))?;

        if bill.payment_method == PaymentMethod::Wallet {
            let order = OrderRepository::get(&mut tx, &bill.order_id)
                .await?
                .ok_or_else(|| CoreError::not_found("order", &bill.order_id))?;
            if let Some(customer_id) = order.customer.registered_id() {
                ledger::credit_in(
                    &mut tx,
                    customer_id,
                    bill.total,
                    WalletEntryReason::Refund,
                    Some(bill.id.as_str()),
                )
                .await?;
            }
        }

        tx.commit().await?;

        info!(bill_id = %bill.id, method = %bill.payment_method, total = %bill.total, "Bill refunded");
        self.ctx.record(
            Some(acting_user_id),
            format!("Refunded bill {} ({})", bill.id, bill.total),
        );

        Ok(bill)
    }

    pub async fn bill(&self, bill_id: &str) -> EngineResult<Bill> {
        let mut conn = self.ctx.db().acquire().await?;
        BillRepository::get(&mut conn, bill_id)
            .await?
            .ok_or_else(|| CoreError::not_found("bill", bill_id).into())
    }

    /// Newest first.
    pub async fn bills(&self) -> EngineResult<Vec<Bill>> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(BillRepository::list(&mut conn).await?)
    }

    /// The bill of a settled order, if it has one.
    pub async fn bill_for_order(&self, order_id: &str) -> EngineResult<Option<Bill>> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(BillRepository::get_by_order(&mut conn, order_id).await?)
    }

    /// Takings and bill count, refunded bills excluded.
    pub async fn sales_summary(&self) -> EngineResult<SalesSummary> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(BillRepository::sales_summary(&mut conn).await?)
    }

    pub async fn top_items(&self, limit: i64) -> EngineResult<Vec<TopItem>> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(BillRepository::top_items(&mut conn, limit.max(0)).await?)
    }
}

async fn not_settleable(conn: &mut SqliteConnection, order_id: &str) -> EngineResult<CoreError> {
    let status = OrderRepository::status(conn, order_id).await?;
    let status = status.map_or_else(|| "missing".to_string(), |s| s.to_string());

    warn!(order_id = %order_id, status = %status, "Order not settleable");
    Ok(CoreError::OrderNotSettleable {
        order_id: order_id.to_string(),
        status,
    })
}
