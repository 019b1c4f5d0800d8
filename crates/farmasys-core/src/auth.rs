//! # Roles and Capabilities
//!
//! Who may do what at the counter.
//!
//! ```text
//! ┌──────────────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┐
//! │                  │ Checkout │ View inv │ Manage   │ View     │ View     │ Manage   │
//! │                  │          │          │ inv      │ receipts │ reports  │ users    │
//! ├──────────────────┼──────────┼──────────┼──────────┼──────────┼──────────┼──────────┤
//! │ admin            │    ✓     │    ✓     │    ✓     │    ✓     │    ✓     │    ✓     │
//! │ cashier          │    ✓     │    ✓     │          │    ✓     │    ✓     │          │
//! └──────────────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┘
//! ```
//!
//! The server builds a [`Principal`] from the bearer token of each request
//! and checks the capability the route needs before calling into the store.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::AccessDenied;

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Cashier,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
        }
    }

    /// Role → capability table.
    pub fn allows(&self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::Cashier => matches!(
                capability,
                Capability::Checkout
                    | Capability::ViewInventory
                    | Capability::ViewReceipts
                    | Capability::ViewReports
            ),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "cashier" => Ok(Role::Cashier),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// An action that needs permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Checkout,
    ViewInventory,
    ManageInventory,
    ViewReceipts,
    ViewReports,
    ManageUsers,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Capability::Checkout => "check out sales",
            Capability::ViewInventory => "view inventory",
            Capability::ManageInventory => "manage inventory",
            Capability::ViewReceipts => "view receipts",
            Capability::ViewReports => "view reports",
            Capability::ManageUsers => "manage users",
        })
    }
}

/// The authenticated caller of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }

    /// Fails with [`AccessDenied`] unless the role grants `capability`.
    ///
    /// ## Example
    /// ```rust
    /// use farmasys_core::auth::{Capability, Principal, Role};
    ///
    /// let cashier = Principal::new("maria", Role::Cashier);
    /// assert!(cashier.require(Capability::Checkout).is_ok());
    /// assert!(cashier.require(Capability::ManageInventory).is_err());
    /// ```
    pub fn require(&self, capability: Capability) -> Result<(), AccessDenied> {
        if self.role.allows(capability) {
            Ok(())
        } else {
            Err(AccessDenied {
                username: self.username.clone(),
                role: self.role,
                capability,
            })
        }
    }
}
