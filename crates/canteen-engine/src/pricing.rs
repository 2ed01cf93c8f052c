//! # Pricing Engine
//!
//! Turns an order into a [`PricedTotal`].
//!
//! ```text
//! order.total ──► discount (skipped if missing, expired or combo unmet)
//!                    │
//!                    ▼
//!             loyalty redemption (hard failure)
//!                    │
//!                    ▼
//!             taxable × tax_rate ──► tax ──► total
//! ```
//!
//! The arithmetic lives in `canteen_core::pricing`; this module does the
//! lookups and the redemption.

use chrono::{DateTime, Utc};
use tracing::debug;

use canteen_core::pricing::{compose, discount_reduction};
use canteen_core::validation::validate_points;
use canteen_core::{Capability, CustomerRef, Money, Order, PricedTotal, TaxRate};
use canteen_db::{DiscountRepository, SqliteConnection};

use crate::context::Canteen;
use crate::error::EngineResult;
use crate::ledger;
use crate::settings;

pub struct PricingEngine<'a> {
    ctx: &'a Canteen,
}

impl<'a> PricingEngine<'a> {
    pub(crate) fn new(ctx: &'a Canteen) -> Self {
        PricingEngine { ctx }
    }

    /// Prices `order`, redeeming `points` from `customer` if asked to.
    ///
    /// Redeemed points stay spent once this returns. Settlement prices inside
    /// its own transaction instead.
    pub async fn price(
        &self,
        actor: &str,
        order: &Order,
        discount_id: Option<&str>,
        points: i64,
        customer: &CustomerRef,
    ) -> EngineResult<PricedTotal> {
        self.ctx.authorize(actor, Capability::Settle)?;
        validate_points(points)?;

        let mut tx = self.ctx.db().begin().await?;
        let (priced, _) = price_in(&mut tx, order, discount_id, points, customer, Utc::now()).await?;
        tx.commit().await?;

        Ok(priced)
    }

    /// Preview without redemption. Touches nothing.
    pub async fn quote(&self, order: &Order, discount_id: Option<&str>) -> EngineResult<PricedTotal> {
        let mut conn = self.ctx.db().acquire().await?;
        let (priced, _) = price_in(&mut conn, order, discount_id, 0, &order.customer, Utc::now()).await?;
        Ok(priced)
    }
}

/// Prices on `conn`. Returns the totals and the points actually redeemed.
pub(crate) async fn price_in(
    conn: &mut SqliteConnection,
    order: &Order,
    discount_id: Option<&str>,
    points: i64,
    customer: &CustomerRef,
    now: DateTime<Utc>,
) -> EngineResult<(PricedTotal, i64)> {
    // Redemption is the only write, so it goes first.
    let (loyalty_discount, redeemed) = match customer.registered_id() {
        Some(customer_id) if points > 0 => (ledger::redeem_in(conn, customer_id, points).await?, points),
        _ => (Money::zero(), 0),
    };

    let discount = match discount_id {
        Some(id) => match DiscountRepository::get(conn, id).await? {
            Some(discount) => discount_reduction(&discount, order.total, &order.item_ids(), now),
            None => {
                debug!(discount_id = %id, "Unknown discount, skipped");
                Money::zero()
            }
        },
        None => Money::zero(),
    };

    let settings = settings::read_in(conn).await?;
    let priced = compose(order.total, discount, loyalty_discount, TaxRate::new(settings.tax_rate));

    debug!(
        order_id = %order.id,
        subtotal = %priced.subtotal,
        discount = %priced.discount,
        loyalty = %priced.loyalty_discount,
        total = %priced.total,
        "Order priced"
    );

    Ok((priced, redeemed))
}
