//! # Settings Repository
//!
//! Key/value numeric settings (`tax_rate`, `loyalty_earn_rate`).

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;

pub const TAX_RATE_KEY: &str = "tax_rate";
pub const LOYALTY_EARN_RATE_KEY: &str = "loyalty_earn_rate";

/// Repository for the `settings` table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsRepository;

impl SettingsRepository {
    /// Reads a setting. `None` if it was never stored.
    pub async fn get(conn: &mut SqliteConnection, key: &str) -> DbResult<Option<f64>> {
        let value: Option<f64> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(value)
    }

    /// Inserts or replaces a setting.
    pub async fn set(conn: &mut SqliteConnection, key: &str, value: f64) -> DbResult<()> {
        debug!(key = %key, value, "Storing setting");

        sqlx::query(
            r#"
            INSERT INTO settings (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
