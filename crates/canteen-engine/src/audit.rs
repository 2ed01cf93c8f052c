//! # Audit Trail
//!
//! Two [`AuditSink`] implementations and the read side of the activity log.
//!
//! ```text
//!  service ──commit──► Canteen::record ──► AuditSink::record
//!                                              │
//!                      ┌───────────────────────┼──────────────────────┐
//!                      ▼                                              ▼
//!              TracingAuditSink                              SqliteAuditSink
//!           info!(target = "audit")                 tokio::spawn → activity_log
//!                                                   (failures → warn!, dropped)
//! ```

use tracing::{info, warn};

use canteen_core::{new_id, ActivityEntry, AuditEntry, AuditSink, Capability};
use canteen_db::{ActivityRepository, Database};

use crate::context::Canteen;
use crate::error::EngineResult;

/// Emits audit entries as structured tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, entry: AuditEntry) {
        info!(
            target: "audit",
            actor = entry.actor.as_deref().unwrap_or("-"),
            at = %entry.timestamp,
            "{}",
            entry.message
        );
    }
}

/// Persists audit entries into `activity_log` on a detached task.
#[derive(Debug, Clone)]
pub struct SqliteAuditSink {
    db: Database,
}

impl SqliteAuditSink {
    pub fn new(db: Database) -> Self {
        SqliteAuditSink { db }
    }

    /// Writes one entry and waits for it.
    pub async fn write(&self, entry: AuditEntry) -> EngineResult<()> {
        let row = ActivityEntry {
            id: new_id(),
            actor_id: entry.actor,
            message: entry.message,
            created_at: entry.timestamp,
        };

        let mut conn = self.db.acquire().await?;
        ActivityRepository::insert(&mut conn, &row).await?;
        Ok(())
    }
}

impl AuditSink for SqliteAuditSink {
    fn record(&self, entry: AuditEntry) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(message = %entry.message, "No runtime, audit entry dropped");
                return;
            }
        };

        let sink = self.clone();
        handle.spawn(async move {
            if let Err(err) = sink.write(entry).await {
                warn!(error = %err, "Failed to persist audit entry");
            }
        });
    }
}

/// Read side of the persisted activity log.
pub struct ActivityLog<'a> {
    ctx: &'a Canteen,
}

impl<'a> ActivityLog<'a> {
    pub(crate) fn new(ctx: &'a Canteen) -> Self {
        ActivityLog { ctx }
    }

    /// Newest `limit` entries. Requires `ViewActivity`.
    pub async fn recent(&self, actor: &str, limit: i64) -> EngineResult<Vec<ActivityEntry>> {
        self.ctx.authorize(actor, Capability::ViewActivity)?;

        let mut conn = self.ctx.db().acquire().await?;
        let entries = ActivityRepository::recent(&mut conn, limit.max(0)).await?;
        Ok(entries)
    }
}
