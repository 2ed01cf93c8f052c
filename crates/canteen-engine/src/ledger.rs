//! # Ledger Service
//!
//! Wallet balances and loyalty points, each with an append-only ledger.
//!
//! ## Atomicity
//! ```text
//! debit   UPDATE wallets SET balance = balance - ?amount
//!         WHERE customer_id = ? AND balance >= ?amount        0 rows → InsufficientFunds
//!
//! credit  INSERT INTO wallets ... ON CONFLICT(customer_id)
//!         DO UPDATE SET balance = balance + excluded.balance
//!
//! redeem  UPDATE loyalty_accounts SET points = points - ?n
//!         WHERE customer_id = ? AND points >= ?n              0 rows → InsufficientPoints
//!
//! earn    INSERT INTO loyalty_accounts ... ON CONFLICT DO UPDATE points = points + excluded.points
//! ```
//!
//! Every balance change and its ledger row go through the same connection.
//! The pool-level methods open a transaction per call; settlement and refund
//! use the `*_in` functions on their own transaction instead.

use tracing::{debug, info, warn};

use canteen_core::pricing::{points_earned, points_value};
use canteen_core::validation::{validate_amount, validate_customer_id, validate_phone_number, validate_points};
use canteen_core::{
    Capability, CoreError, CustomerRef, LoyaltyAccount, LoyaltyLedgerEntry, LoyaltyReason, Money,
    ValidationError, WalletAccount, WalletEntryReason, WalletLedgerEntry, MIN_REDEEMABLE_POINTS,
};
use canteen_db::{LoyaltyRepository, SqliteConnection, WalletRepository};

use crate::context::Canteen;
use crate::error::EngineResult;
use crate::settings;

/// Wallet and loyalty operations.
pub struct LedgerService<'a> {
    ctx: &'a Canteen,
}

impl<'a> LedgerService<'a> {
    pub(crate) fn new(ctx: &'a Canteen) -> Self {
        LedgerService { ctx }
    }

    // =========================================================================
    // Wallets
    // =========================================================================

    /// Takes `amount` from the wallet or fails without touching it.
    pub async fn debit_wallet(&self, actor: &str, customer_id: &str, amount: Money) -> EngineResult<()> {
        self.ctx.authorize(actor, Capability::Settle)?;
        let customer_id = registered(customer_id, "wallet debit")?;

        let mut tx = self.ctx.db().begin().await?;
        debit_in(&mut tx, &customer_id, amount, None).await?;
        tx.commit().await?;

        self.ctx
            .record(Some(actor), format!("Debited {amount} from wallet {customer_id}"));
        Ok(())
    }

    /// Tops up a wallet, opening it at `amount` if it does not exist.
    pub async fn credit_wallet(&self, actor: &str, customer_id: &str, amount: Money) -> EngineResult<()> {
        self.ctx.authorize(actor, Capability::TopUpWallets)?;
        let customer_id = registered(customer_id, "wallet top-up")?;

        let mut tx = self.ctx.db().begin().await?;
        credit_in(&mut tx, &customer_id, amount, WalletEntryReason::TopUp, None).await?;
        tx.commit().await?;

        info!(customer_id = %customer_id, amount = %amount, "Wallet topped up");
        self.ctx
            .record(Some(actor), format!("Topped up wallet {customer_id} by {amount}"));
        Ok(())
    }

    /// Opens a wallet for a phone number no one else uses.
    pub async fn create_wallet(
        &self,
        actor: &str,
        phone_number: &str,
        initial_balance: Money,
    ) -> EngineResult<WalletAccount> {
        self.ctx.authorize(actor, Capability::OpenWallets)?;
        validate_phone_number(phone_number)?;
        validate_amount("initial_balance", initial_balance)?;

        if self.ctx.authenticator().is_known_customer(phone_number) {
            return Err(CoreError::DuplicateIdentity(phone_number.to_string()).into());
        }

        let mut tx = self.ctx.db().begin().await?;
        match WalletRepository::insert(&mut tx, phone_number, initial_balance).await {
            Ok(()) => {}
            Err(err) if err.is_unique_violation() => {
                return Err(CoreError::DuplicateIdentity(phone_number.to_string()).into());
            }
            Err(err) => return Err(err.into()),
        }
        WalletRepository::append_entry(
            &mut tx,
            phone_number,
            initial_balance,
            WalletEntryReason::Opening,
            None,
        )
        .await?;
        tx.commit().await?;

        info!(customer_id = %phone_number, balance = %initial_balance, "Wallet created");
        self.ctx.record(
            Some(actor),
            format!("Opened wallet {phone_number} with {initial_balance}"),
        );

        Ok(WalletAccount {
            customer_id: phone_number.to_string(),
            balance: initial_balance,
        })
    }

    /// Closes an empty wallet. Its ledger is kept.
    pub async fn delete_wallet(&self, actor: &str, customer_id: &str) -> EngineResult<()> {
        self.ctx.authorize(actor, Capability::CloseWallets)?;

        let mut tx = self.ctx.db().begin().await?;
        if !WalletRepository::delete_if_empty(&mut tx, customer_id).await? {
            return match WalletRepository::get(&mut tx, customer_id).await? {
                None => Err(CoreError::not_found("wallet", customer_id).into()),
                Some(wallet) => Err(CoreError::WalletNotEmpty {
                    customer_id: customer_id.to_string(),
                    balance: wallet.balance,
                }
                .into()),
            };
        }
        tx.commit().await?;

        info!(customer_id = %customer_id, "Wallet deleted");
        self.ctx.record(Some(actor), format!("Closed wallet {customer_id}"));
        Ok(())
    }

    pub async fn wallet(&self, customer_id: &str) -> EngineResult<WalletAccount> {
        let mut conn = self.ctx.db().acquire().await?;
        WalletRepository::get(&mut conn, customer_id)
            .await?
            .ok_or_else(|| CoreError::not_found("wallet", customer_id).into())
    }

    /// Zero for a customer without a wallet.
    pub async fn wallet_balance(&self, customer_id: &str) -> EngineResult<Money> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(WalletRepository::get(&mut conn, customer_id)
            .await?
            .map(|w| w.balance)
            .unwrap_or_default())
    }

    pub async fn wallets(&self) -> EngineResult<Vec<WalletAccount>> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(WalletRepository::list(&mut conn).await?)
    }

    /// Oldest first.
    pub async fn wallet_history(&self, customer_id: &str) -> EngineResult<Vec<WalletLedgerEntry>> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(WalletRepository::history(&mut conn, customer_id).await?)
    }

    // =========================================================================
    // Loyalty
    // =========================================================================

    /// Spends points and returns their currency value.
    pub async fn redeem_loyalty(&self, actor: &str, customer_id: &str, points: i64) -> EngineResult<Money> {
        self.ctx.authorize(actor, Capability::Settle)?;
        let customer_id = registered(customer_id, "loyalty redemption")?;

        let mut tx = self.ctx.db().begin().await?;
        let value = redeem_in(&mut tx, &customer_id, points).await?;
        tx.commit().await?;

        self.ctx.record(
            Some(actor),
            format!("Redeemed {points} points for {customer_id}"),
        );
        Ok(value)
    }

    /// Awards `floor(bill_total / earn_rate)` points. Guests earn nothing.
    pub async fn earn_loyalty(&self, actor: &str, customer_id: &str, bill_total: Money) -> EngineResult<i64> {
        self.ctx.authorize(actor, Capability::Settle)?;
        validate_customer_id(customer_id)?;
        validate_amount("bill_total", bill_total)?;
        let customer = CustomerRef::parse(customer_id);

        let rate = {
            let mut conn = self.ctx.db().acquire().await?;
            settings::read_in(&mut conn).await?.loyalty_earn_rate
        };

        let mut tx = self.ctx.db().begin().await?;
        let earned = earn_in(&mut tx, &customer, bill_total, rate).await?;
        tx.commit().await?;

        Ok(earned)
    }

    /// Zero for a customer who never earned.
    pub async fn loyalty_points(&self, customer_id: &str) -> EngineResult<i64> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(LoyaltyRepository::points(&mut conn, customer_id).await?)
    }

    pub async fn loyalty_accounts(&self) -> EngineResult<Vec<LoyaltyAccount>> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(LoyaltyRepository::list(&mut conn).await?)
    }

    /// Newest first; everyone's entries when `customer_id` is `None`.
    pub async fn loyalty_history(&self, customer_id: Option<&str>) -> EngineResult<Vec<LoyaltyLedgerEntry>> {
        let mut conn = self.ctx.db().acquire().await?;
        Ok(LoyaltyRepository::history(&mut conn, customer_id).await?)
    }
}

/// Validated registered customer id, or a validation error for guests.
fn registered(customer_id: &str, operation: &str) -> EngineResult<String> {
    validate_customer_id(customer_id)?;
    match CustomerRef::parse(customer_id) {
        CustomerRef::Registered(id) => Ok(id),
        CustomerRef::Guest => Err(ValidationError::GuestNotAllowed {
            operation: operation.to_string(),
        }
        .into()),
    }
}

// =============================================================================
// Connection-scoped operations
// =============================================================================

/// Debits a wallet and appends a `payment` entry. A zero amount is a no-op.
pub(crate) async fn debit_in(
    conn: &mut SqliteConnection,
    customer_id: &str,
    amount: Money,
    reference: Option<&str>,
) -> EngineResult<()> {
    validate_amount("amount", amount)?;
    if amount.is_zero() {
        return Ok(());
    }

    if !WalletRepository::try_debit(conn, customer_id, amount).await? {
        let balance = WalletRepository::get(conn, customer_id)
            .await?
            .map(|w| w.balance)
            .unwrap_or_default();
        warn!(customer_id = %customer_id, balance = %balance, required = %amount, "Wallet debit refused");
        return Err(CoreError::InsufficientFunds {
            customer_id: customer_id.to_string(),
            balance,
            required: amount,
        }
        .into());
    }

    let delta = Money::zero() - amount;
    WalletRepository::append_entry(conn, customer_id, delta, WalletEntryReason::Payment, reference).await?;

    debug!(customer_id = %customer_id, amount = %amount, "Wallet debited");
    Ok(())
}

/// Credits a wallet, creating it if absent, and appends a ledger entry.
pub(crate) async fn credit_in(
    conn: &mut SqliteConnection,
    customer_id: &str,
    amount: Money,
    reason: WalletEntryReason,
    reference: Option<&str>,
) -> EngineResult<()> {
    validate_amount("amount", amount)?;

    WalletRepository::credit(conn, customer_id, amount).await?;
    if !amount.is_zero() {
        WalletRepository::append_entry(conn, customer_id, amount, reason, reference).await?;
    }

    debug!(customer_id = %customer_id, amount = %amount, reason = ?reason, "Wallet credited");
    Ok(())
}

/// Deducts points and appends a `redeemed` entry. Returns the currency value.
pub(crate) async fn redeem_in(conn: &mut SqliteConnection, customer_id: &str, points: i64) -> EngineResult<Money> {
    validate_points(points)?;
    if points < MIN_REDEEMABLE_POINTS {
        return Err(CoreError::BelowRedemptionMinimum {
            requested: points,
            minimum: MIN_REDEEMABLE_POINTS,
        }
        .into());
    }

    if !LoyaltyRepository::try_deduct(conn, customer_id, points).await? {
        let balance = LoyaltyRepository::points(conn, customer_id).await?;
        warn!(customer_id = %customer_id, balance, requested = points, "Redemption refused");
        return Err(CoreError::InsufficientPoints {
            customer_id: customer_id.to_string(),
            balance,
            requested: points,
        }
        .into());
    }

    LoyaltyRepository::append_entry(conn, customer_id, -points, LoyaltyReason::Redeemed).await?;

    let value = points_value(points);
    debug!(customer_id = %customer_id, points, value = %value, "Points redeemed");
    Ok(value)
}

/// Awards points for a paid total. Returns the points awarded.
pub(crate) async fn earn_in(
    conn: &mut SqliteConnection,
    customer: &CustomerRef,
    total: Money,
    earn_rate: f64,
) -> EngineResult<i64> {
    let Some(customer_id) = customer.registered_id() else {
        return Ok(0);
    };

    let points = points_earned(total, earn_rate);
    if points <= 0 {
        return Ok(0);
    }

    LoyaltyRepository::add(conn, customer_id, points).await?;
    LoyaltyRepository::append_entry(conn, customer_id, points, LoyaltyReason::Earned).await?;

    debug!(customer_id = %customer_id, points, "Points earned");
    Ok(points)
}
