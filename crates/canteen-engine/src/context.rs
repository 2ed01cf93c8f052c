//! # Composition Root
//!
//! [`Canteen`] owns the storage handle and the two external collaborators and
//! hands them to each service. Services borrow it, so they are free to create
//! and drop per call.
//!
//! ```text
//! ┌──────────────────────────── Canteen ─────────────────────────────┐
//! │  Database   Arc<dyn Authenticator>   Arc<dyn AuditSink>   Config │
//! └───────┬──────────────┬───────────────────────┬───────────────────┘
//!         │              │                       │
//!   catalog()      orders()  settlement()   ledger()  discounts()  ...
//! ```

use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use canteen_core::{AuditEntry, AuditSink, Authenticator, Capability, CoreError, Role};
use canteen_db::{Database, DbConfig};

use crate::audit::ActivityLog;
use crate::catalog::CatalogStore;
use crate::config::EngineConfig;
use crate::discounts::DiscountBook;
use crate::error::EngineResult;
use crate::ledger::LedgerService;
use crate::orders::OrderService;
use crate::pricing::PricingEngine;
use crate::settings::SettingsService;
use crate::settlement::SettlementService;

/// The canteen engine. Cheap to clone.
#[derive(Clone)]
pub struct Canteen {
    db: Database,
    directory: Arc<dyn Authenticator>,
    audit: Arc<dyn AuditSink>,
    config: EngineConfig,
}

impl Canteen {
    /// Connects to the configured database, applies migrations and builds
    /// the engine.
    pub async fn open(
        config: EngineConfig,
        directory: Arc<dyn Authenticator>,
        audit: Arc<dyn AuditSink>,
    ) -> EngineResult<Self> {
        Self::open_with(config.db_config(), config, directory, audit).await
    }

    /// Like [`Canteen::open`] with an explicit pool configuration
    /// (`DbConfig::in_memory()` in tests).
    pub async fn open_with(
        db_config: DbConfig,
        config: EngineConfig,
        directory: Arc<dyn Authenticator>,
        audit: Arc<dyn AuditSink>,
    ) -> EngineResult<Self> {
        let db = Database::new(db_config).await?;
        info!(refund_policy = %config.refund_policy, "Canteen engine ready");
        Ok(Self::new(db, directory, audit, config))
    }

    /// Builds the engine around an existing database handle.
    pub fn new(
        db: Database,
        directory: Arc<dyn Authenticator>,
        audit: Arc<dyn AuditSink>,
        config: EngineConfig,
    ) -> Self {
        Canteen {
            db,
            directory,
            audit,
            config,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.directory.as_ref()
    }

    // =========================================================================
    // Services
    // =========================================================================

    pub fn catalog(&self) -> CatalogStore<'_> {
        CatalogStore::new(self)
    }

    pub fn ledger(&self) -> LedgerService<'_> {
        LedgerService::new(self)
    }

    pub fn pricing(&self) -> PricingEngine<'_> {
        PricingEngine::new(self)
    }

    pub fn discounts(&self) -> DiscountBook<'_> {
        DiscountBook::new(self)
    }

    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(self)
    }

    pub fn settlement(&self) -> SettlementService<'_> {
        SettlementService::new(self)
    }

    pub fn settings(&self) -> SettingsService<'_> {
        SettingsService::new(self)
    }

    pub fn activity(&self) -> ActivityLog<'_> {
        ActivityLog::new(self)
    }

    // =========================================================================
    // Boundary helpers
    // =========================================================================

    /// Resolves the actor's role and checks it against the capability table.
    pub fn authorize(&self, actor: &str, capability: Capability) -> EngineResult<Role> {
        match self.directory.resolve_role(actor) {
            Some(role) if role.can(capability) => Ok(role),
            role => {
                warn!(actor = %actor, role = ?role, capability = %capability, "Capability denied");
                Err(CoreError::Unauthorized {
                    actor: actor.to_string(),
                    capability: capability.to_string(),
                }
                .into())
            }
        }
    }

    /// Best-effort audit after a committed mutation.
    pub(crate) fn record(&self, actor: Option<&str>, message: impl Into<String>) {
        self.audit.record(AuditEntry::new(actor, message));
    }
}

impl fmt::Debug for Canteen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Canteen")
            .field("db", &self.db)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
