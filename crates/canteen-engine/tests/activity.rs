//! Persisted audit trail.

mod common;

use std::sync::Arc;

use canteen_core::{AuditEntry, ErrorKind, Money};
use canteen_db::{Database, DbConfig};
use canteen_engine::{Canteen, EngineConfig, SqliteAuditSink};
use common::*;

async fn audited_canteen() -> (Canteen, SqliteAuditSink) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let sink = SqliteAuditSink::new(db.clone());
    let canteen = Canteen::new(
        db,
        Arc::new(directory()),
        Arc::new(sink.clone()),
        EngineConfig::default(),
    );
    (canteen, sink)
}

#[tokio::test]
async fn committed_mutations_reach_the_log() {
    let (canteen, _) = audited_canteen().await;
    canteen
        .catalog()
        .add_item(ADMIN, "Tea", Money::new(10.0), true)
        .await
        .unwrap();

    // The sink writes on a detached task.
    let mut entries = Vec::new();
    for _ in 0..100 {
        entries = canteen.activity().recent(MANAGER, 10).await.unwrap();
        if !entries.is_empty() {
            break;
        }
        tokio::task::yield_now().await;
    }

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].actor_id.as_deref(), Some(ADMIN));
    assert!(entries[0].message.contains("Tea"));
}

#[tokio::test]
async fn recent_is_newest_first_and_limited() {
    let (canteen, sink) = audited_canteen().await;
    for n in 0..5 {
        sink.write(AuditEntry::new(Some(ADMIN), format!("entry {n}")))
            .await
            .unwrap();
    }

    let entries = canteen.activity().recent(ADMIN, 3).await.unwrap();
    let messages: Vec<_> = entries.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(messages, vec!["entry 4", "entry 3", "entry 2"]);
}

#[tokio::test]
async fn billers_cannot_read_the_log() {
    let (canteen, _) = audited_canteen().await;
    let err = canteen.activity().recent(BILLER, 10).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn rejected_operations_are_not_logged() {
    let (canteen, _) = audited_canteen().await;
    assert!(canteen
        .catalog()
        .add_item(BILLER, "Tea", Money::new(10.0), true)
        .await
        .is_err());

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(canteen.activity().recent(ADMIN, 10).await.unwrap().is_empty());
}
