//! # Collaborator Boundaries
//!
//! Traits for the two services the engine consumes but does not own:
//!
//! ```text
//!             ┌──────────────────┐
//!  login UI ─►│  Authenticator   │◄── is this customer known?
//!             │                  │◄── which role does this operator hold?
//!             └──────────────────┘
//!
//!             ┌──────────────────┐
//!  engine ───►│    AuditSink     │──► activity log, tracing, ...
//!             └──────────────────┘   best-effort, never fails the caller
//! ```
//!
//! Both traits are synchronous and object safe so the composition root can
//! hold them as `Arc<dyn _>`.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::roles::Role;

// =============================================================================
// Authenticator
// =============================================================================

/// Identity source. Credential checks happen elsewhere; the engine only asks
/// yes/no questions.
pub trait Authenticator: Send + Sync {
    /// True if `id` is a registered user.
    fn is_known_customer(&self, id: &str) -> bool;

    /// The operator role held by `id`, if any.
    fn resolve_role(&self, id: &str) -> Option<Role>;
}

/// In-memory directory used by the seed binary and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    operators: HashMap<String, Role>,
    customers: HashSet<String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operator. Operators are also known users.
    pub fn with_operator(mut self, id: impl Into<String>, role: Role) -> Self {
        self.operators.insert(id.into(), role);
        self
    }

    /// Adds a registered customer without an operator role.
    pub fn with_customer(mut self, id: impl Into<String>) -> Self {
        self.customers.insert(id.into());
        self
    }
}

impl Authenticator for StaticDirectory {
    fn is_known_customer(&self, id: &str) -> bool {
        self.customers.contains(id) || self.operators.contains_key(id)
    }

    fn resolve_role(&self, id: &str) -> Option<Role> {
        self.operators.get(id).copied()
    }
}

// =============================================================================
// Audit Sink
// =============================================================================

/// One line of the activity trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(actor: Option<&str>, message: impl Into<String>) -> Self {
        AuditEntry {
            actor: actor.map(str::to_string),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Receives audit entries after a mutation has committed.
///
/// Implementations must not block and must swallow their own failures.
pub trait AuditSink: Send + Sync {
    fn record(&self, entry: AuditEntry);
}

/// Discards every entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _entry: AuditEntry) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_directory() {
        let dir = StaticDirectory::new()
            .with_operator("root", Role::Admin)
            .with_customer("0300123456");

        assert!(dir.is_known_customer("root"));
        assert!(dir.is_known_customer("0300123456"));
        assert!(!dir.is_known_customer("nobody"));

        assert_eq!(dir.resolve_role("root"), Some(Role::Admin));
        assert_eq!(dir.resolve_role("0300123456"), None);
    }

    #[test]
    fn test_audit_entry_carries_actor() {
        let entry = AuditEntry::new(Some("root"), "Added item Tea");
        assert_eq!(entry.actor.as_deref(), Some("root"));
        NullAuditSink.record(entry);
    }
}
