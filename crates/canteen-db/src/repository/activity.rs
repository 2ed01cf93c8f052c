//! # Activity Repository
//!
//! Append-only audit trail.

use sqlx::SqliteConnection;

use crate::error::DbResult;
use canteen_core::ActivityEntry;

/// Repository for `activity_log`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityRepository;

impl ActivityRepository {
    pub async fn insert(conn: &mut SqliteConnection, entry: &ActivityEntry) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_log (id, actor_id, message, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.actor_id)
        .bind(&entry.message)
        .bind(entry.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// The newest `limit` entries, newest first.
    pub async fn recent(conn: &mut SqliteConnection, limit: i64) -> DbResult<Vec<ActivityEntry>> {
        let entries = sqlx::query_as::<_, ActivityEntry>(
            r#"
            SELECT id, actor_id, message, created_at
            FROM activity_log
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&mut *conn)
        .await?;

        Ok(entries)
    }
}
