//! # Loyalty Repository
//!
//! Loyalty point balances and their append-only ledger. The balance column is
//! a cache of Σ ledger delta and every write changes both in one transaction.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use canteen_core::{LoyaltyAccount, LoyaltyLedgerEntry, LoyaltyReason};

/// Repository for loyalty accounts and the loyalty ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoyaltyRepository;

impl LoyaltyRepository {
    /// Current points; zero for a customer without an account.
    pub async fn points(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<i64> {
        let points: Option<i64> =
            sqlx::query_scalar("SELECT points FROM loyalty_accounts WHERE customer_id = ?1")
                .bind(customer_id)
                .fetch_optional(&mut *conn)
                .await?;

        Ok(points.unwrap_or(0))
    }

    pub async fn list(conn: &mut SqliteConnection) -> DbResult<Vec<LoyaltyAccount>> {
        let accounts = sqlx::query_as::<_, LoyaltyAccount>(
            "SELECT customer_id, points FROM loyalty_accounts ORDER BY points DESC, customer_id",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(accounts)
    }

    /// Removes `points` if the balance covers them.
    pub async fn try_deduct(conn: &mut SqliteConnection, customer_id: &str, points: i64) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE loyalty_accounts SET
                points = points - ?2,
                updated_at = ?3
            WHERE customer_id = ?1 AND points >= ?2
            "#,
        )
        .bind(customer_id)
        .bind(points)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Adds `points`, creating the account if absent.
    pub async fn add(conn: &mut SqliteConnection, customer_id: &str, points: i64) -> DbResult<()> {
        debug!(customer_id = %customer_id, points, "Crediting loyalty points");

        sqlx::query(
            r#"
            INSERT INTO loyalty_accounts (customer_id, points, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(customer_id) DO UPDATE SET
                points = points + excluded.points,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(customer_id)
        .bind(points)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Appends an immutable ledger entry.
    pub async fn append_entry(
        conn: &mut SqliteConnection,
        customer_id: &str,
        delta: i64,
        reason: LoyaltyReason,
    ) -> DbResult<LoyaltyLedgerEntry> {
        let entry = LoyaltyLedgerEntry {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            delta,
            reason,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO loyalty_ledger (id, customer_id, delta, reason, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.customer_id)
        .bind(entry.delta)
        .bind(entry.reason)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(entry)
    }

    /// Ledger entries, newest first, for one customer or everyone.
    pub async fn history(
        conn: &mut SqliteConnection,
        customer_id: Option<&str>,
    ) -> DbResult<Vec<LoyaltyLedgerEntry>> {
        let entries = match customer_id {
            Some(customer_id) => {
                sqlx::query_as::<_, LoyaltyLedgerEntry>(
                    r#"
                    SELECT id, customer_id, delta, reason, created_at
                    FROM loyalty_ledger
                    WHERE customer_id = ?1
                    ORDER BY created_at DESC, rowid DESC
                    "#,
                )
                .bind(customer_id)
                .fetch_all(&mut *conn)
                .await?
            }
            None => {
                sqlx::query_as::<_, LoyaltyLedgerEntry>(
                    r#"
                    SELECT id, customer_id, delta, reason, created_at
                    FROM loyalty_ledger
                    ORDER BY created_at DESC, rowid DESC
                    "#,
                )
                .fetch_all(&mut *conn)
                .await?
            }
        };

        Ok(entries)
    }

    /// Σ delta over a customer's ledger.
    pub async fn ledger_sum(conn: &mut SqliteConnection, customer_id: &str) -> DbResult<i64> {
        let sum: i64 = sqlx::query_scalar(
            "SELECT CAST(COALESCE(SUM(delta), 0) AS INTEGER) FROM loyalty_ledger WHERE customer_id = ?1",
        )
        .bind(customer_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(sum)
    }
}
