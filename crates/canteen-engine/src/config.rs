//! Engine configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                     | Default                 |
//! |------------------------------|-------------------------|
//! | `CANTEEN_DB_PATH`            | `canteen.db`            |
//! | `CANTEEN_DB_MAX_CONNECTIONS` | `5`                     |
//! | `CANTEEN_REFUND_POLICY`      | `completed_or_canceled` |

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use canteen_core::OrderStatus;
use canteen_db::DbConfig;

/// Which order states allow a bill to be refunded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundPolicy {
    /// Only bills whose order was canceled afterwards.
    CanceledOnly,
    /// Bills of completed or canceled orders.
    #[default]
    CompletedOrCanceled,
}

impl RefundPolicy {
    pub fn allowed_statuses(&self) -> &'static [OrderStatus] {
        match self {
            RefundPolicy::CanceledOnly => &[OrderStatus::Canceled],
            RefundPolicy::CompletedOrCanceled => &[OrderStatus::Completed, OrderStatus::Canceled],
        }
    }

    pub fn allows(&self, status: OrderStatus) -> bool {
        self.allowed_statuses().contains(&status)
    }
}

impl FromStr for RefundPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "canceled_only" => Ok(RefundPolicy::CanceledOnly),
            "completed_or_canceled" => Ok(RefundPolicy::CompletedOrCanceled),
            _ => Err(ConfigError::InvalidValue("CANTEEN_REFUND_POLICY".to_string())),
        }
    }
}

impl fmt::Display for RefundPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefundPolicy::CanceledOnly => f.write_str("canceled_only"),
            RefundPolicy::CompletedOrCanceled => f.write_str("completed_or_canceled"),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub max_connections: u32,

    /// Refund gate
    pub refund_policy: RefundPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            database_path: PathBuf::from("canteen.db"),
            max_connections: 5,
            refund_policy: RefundPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary lookup (tests use a map).
    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = EngineConfig {
            database_path: lookup("CANTEEN_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("canteen.db")),

            max_connections: lookup("CANTEEN_DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CANTEEN_DB_MAX_CONNECTIONS".to_string()))?,

            refund_policy: lookup("CANTEEN_REFUND_POLICY")
                .unwrap_or_else(|| "completed_or_canceled".to_string())
                .parse()?,
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("CANTEEN_DB_MAX_CONNECTIONS".to_string()));
        }

        if config.database_path.as_os_str().is_empty() {
            return Err(ConfigError::MissingRequired("CANTEEN_DB_PATH".to_string()));
        }

        Ok(config)
    }

    /// Sets the refund policy.
    pub fn refund_policy(mut self, policy: RefundPolicy) -> Self {
        self.refund_policy = policy;
        self
    }

    /// Pool configuration for this engine.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path.clone()).max_connections(self.max_connections)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::load_from(lookup(&[])).unwrap();
        assert_eq!(config.database_path, PathBuf::from("canteen.db"));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.refund_policy, RefundPolicy::CompletedOrCanceled);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::load_from(lookup(&[
            ("CANTEEN_DB_PATH", "/tmp/x.db"),
            ("CANTEEN_DB_MAX_CONNECTIONS", "2"),
            ("CANTEEN_REFUND_POLICY", "canceled_only"),
        ]))
        .unwrap();
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.refund_policy, RefundPolicy::CanceledOnly);
        assert_eq!(config.db_config().max_connections, 2);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            EngineConfig::load_from(lookup(&[("CANTEEN_DB_MAX_CONNECTIONS", "many")])),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            EngineConfig::load_from(lookup(&[("CANTEEN_REFUND_POLICY", "always")])),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            EngineConfig::load_from(lookup(&[("CANTEEN_DB_PATH", "")])),
            Err(ConfigError::MissingRequired(_))
        ));
    }

    #[test]
    fn test_policy_gate() {
        assert!(RefundPolicy::CanceledOnly.allows(OrderStatus::Canceled));
        assert!(!RefundPolicy::CanceledOnly.allows(OrderStatus::Completed));
        assert!(RefundPolicy::CompletedOrCanceled.allows(OrderStatus::Completed));
        assert!(!RefundPolicy::CompletedOrCanceled.allows(OrderStatus::Pending));
    }
}
