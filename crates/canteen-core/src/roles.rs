//! # Operator Roles
//!
//! Closed set of operator roles and what each one may do.
//!
//! ```text
//! ┌───────────────────┬───────┬─────────┬────────┐
//! │ Capability        │ Admin │ Manager │ Biller │
//! ├───────────────────┼───────┼─────────┼────────┤
//! │ ManageCatalog     │   ✓   │    ✓    │        │
//! │ ManageInventory   │   ✓   │    ✓    │        │
//! │ ManageDiscounts   │   ✓   │    ✓    │        │
//! │ TakeOrders        │   ✓   │    ✓    │   ✓    │
//! │ Settle            │   ✓   │    ✓    │   ✓    │
//! │ Refund            │   ✓   │         │        │
//! │ TopUpWallets      │   ✓   │         │   ✓    │
//! │ OpenWallets       │   ✓   │    ✓    │        │
//! │ CloseWallets      │   ✓   │         │        │
//! │ ViewActivity      │   ✓   │    ✓    │        │
//! │ ManageSettings    │   ✓   │         │        │
//! └───────────────────┴───────┴─────────┴────────┘
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Biller,
}

/// Something an operator can be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ManageCatalog,
    ManageInventory,
    ManageDiscounts,
    TakeOrders,
    Settle,
    Refund,
    TopUpWallets,
    OpenWallets,
    CloseWallets,
    ViewActivity,
    ManageSettings,
}

impl Role {
    /// Looks up the capability table.
    pub fn can(self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            Role::Admin => true,
            Role::Manager => matches!(
                capability,
                ManageCatalog
                    | ManageInventory
                    | ManageDiscounts
                    | TakeOrders
                    | Settle
                    | OpenWallets
                    | ViewActivity
            ),
            Role::Biller => matches!(capability, TakeOrders | Settle | TopUpWallets),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Biller => "biller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "biller" => Ok(Role::Biller),
            other => Err(ValidationError::InvalidFormat {
                field: "role".to_string(),
                reason: format!("unknown role '{other}'"),
            }),
        }
    }
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ManageCatalog => "manage catalog",
            Capability::ManageInventory => "manage inventory",
            Capability::ManageDiscounts => "manage discounts",
            Capability::TakeOrders => "take orders",
            Capability::Settle => "settle bills",
            Capability::Refund => "refund bills",
            Capability::TopUpWallets => "top up wallets",
            Capability::OpenWallets => "open wallets",
            Capability::CloseWallets => "close wallets",
            Capability::ViewActivity => "view activity",
            Capability::ManageSettings => "manage settings",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_can_everything() {
        for cap in [
            Capability::ManageCatalog,
            Capability::Refund,
            Capability::CloseWallets,
            Capability::ManageSettings,
        ] {
            assert!(Role::Admin.can(cap));
        }
    }

    #[test]
    fn test_manager_table() {
        assert!(Role::Manager.can(Capability::ManageCatalog));
        assert!(Role::Manager.can(Capability::OpenWallets));
        assert!(!Role::Manager.can(Capability::Refund));
        assert!(!Role::Manager.can(Capability::TopUpWallets));
        assert!(!Role::Manager.can(Capability::ManageSettings));
    }

    #[test]
    fn test_biller_table() {
        assert!(Role::Biller.can(Capability::TakeOrders));
        assert!(Role::Biller.can(Capability::Settle));
        assert!(Role::Biller.can(Capability::TopUpWallets));
        assert!(!Role::Biller.can(Capability::ManageCatalog));
        assert!(!Role::Biller.can(Capability::ViewActivity));
    }

    #[test]
    fn test_parse_role() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" biller ".parse::<Role>().unwrap(), Role::Biller);
        assert!("cashier".parse::<Role>().is_err());
    }
}
