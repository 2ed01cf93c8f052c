//! # Wallet Repository
//!
//! Prepaid wallet balances and their append-only ledger.
//!
//! ## Atomic Balance Updates
//! ```text
//! debit:   UPDATE wallets SET balance = balance - ?amt
//!          WHERE customer_id = ?id AND balance >= ?amt        (0 rows → short)
//!
//! credit:  INSERT INTO wallets ... VALUES (?id, ?amt)
//!          ON CONFLICT(customer_id)
//!          DO UPDATE SET balance = balance + excluded.balance
//! ```
//! No balance is ever read, modified in Rust, and written back.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use canteen_core::money::MONEY_EPSILON;
use canteen_core::{Money, WalletAccount, WalletEntryReason, WalletLedgerEntry};

/// Repository for wallets and the wallet ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalletRepository;

impl WalletRepository {
    pub async fn get(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<Option<WalletAccount>> {
        let wallet = sqlx::query_as::<_, WalletAccount>(
            "SELECT customer_id, balance FROM wallets WHERE customer_id = ?1",
        )
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(wallet)
    }

    pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<WalletAccount>> {
        let wallets = sqlx::query_as::<_, WalletAccount>(
            "SELECT customer_id, balance FROM wallets ORDER BY customer_id",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(wallets)
    }

    /// Opens a wallet. Fails with a UNIQUE violation if one already exists.
    pub async fn insert(conn: &mut SqliteConnection, customer_id: &str, balance: Money) -> DbResult<()> {
        debug!(customer_id = %customer_id, balance = %balance, "Opening wallet");
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO wallets (customer_id, balance, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            "#,
        )
        .bind(customer_id)
        .bind(balance)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Subtracts `amount` if the balance covers it.
    pub async fn try_debit(conn: &mut SqliteConnection, customer_id: &str, amount: Money) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE wallets SET
                balance = balance - ?2,
                updated_at = ?3
            WHERE customer_id = ?1 AND balance >= ?2
            "#,
        )
        .bind(customer_id)
        .bind(amount)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Adds `amount`, creating the wallet at `amount` if absent.
    pub async fn credit(conn: &mut SqliteConnection, customer_id: &str, amount: Money) -> DbResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO wallets (customer_id, balance, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT(customer_id) DO UPDATE SET
                balance = balance + excluded.balance,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(customer_id)
        .bind(amount)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Deletes the wallet only if its balance is zero.
    pub async fn delete_if_empty(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM wallets WHERE customer_id = ?1 AND balance < ?2")
            .bind(customer_id)
            .bind(MONEY_EPSILON)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    /// Appends an immutable ledger entry.
    pub async fn append_entry(
        conn: &mut SqliteConnection,
        customer_id: &str,
        delta: Money,
        reason: WalletEntryReason,
        reference: Option<&str>,
    ) -> DbResult<WalletLedgerEntry> {
        let entry = WalletLedgerEntry {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            delta,
            reason,
            reference: reference.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO wallet_ledger (id, customer_id, delta, reason, reference, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.customer_id)
        .bind(entry.delta)
        .bind(entry.reason)
        .bind(&entry.reference)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(entry)
    }

    /// Ledger entries for a customer, oldest first.
    pub async fn history(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<Vec<WalletLedgerEntry>> {
        let entries = sqlx::query_as::<_, WalletLedgerEntry>(
            r#"
            SELECT id, customer_id, delta, reason, reference, created_at
            FROM wallet_ledger
            WHERE customer_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(customer_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(entries)
    }

    /// Σ delta over a customer's ledger.
    pub async fn ledger_sum(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<Money> {
        let sum: f64 = sqlx::query_scalar(
            "SELECT CAST(COALESCE(SUM(delta), 0) AS REAL) FROM wallet_ledger WHERE customer_id = ?1",
        )
        .bind(customer_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Money::new(sum))
    }
}
