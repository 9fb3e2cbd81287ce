use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::authorize::AuthzError;
use crate::permissions::Permission;
use crate::table::RolePermissionTable;

/// Role identifier used for RBAC.
///
/// The set is closed: a user account is assigned exactly one of these externally.
/// The canonical string form is the variant name (e.g. `"Storekeeper"`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    SuperAdmin,
    Manager,
    Storekeeper,
    Accountant,
    SalesRep,
    Dispatcher,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::SuperAdmin,
        Role::Manager,
        Role::Storekeeper,
        Role::Accountant,
        Role::SalesRep,
        Role::Dispatcher,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::Manager => "Manager",
            Role::Storekeeper => "Storekeeper",
            Role::Accountant => "Accountant",
            Role::SalesRep => "SalesRep",
            Role::Dispatcher => "Dispatcher",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Full system administrator with all permissions",
            Role::Manager => "Operations manager with every business permission",
            Role::Storekeeper => "Yard and warehouse staff recording stock and fuel movements",
            Role::Accountant => "Finance staff with ledger and reporting access",
            Role::SalesRep => "Sales staff managing clients and orders",
            Role::Dispatcher => "Fleet dispatcher managing trucks, fuel and delivery exceptions",
        }
    }

    /// Whether the process-wide table grants `permission` to this role.
    pub fn has(&self, permission: Permission) -> bool {
        RolePermissionTable::global().grants(*self, permission)
    }

    /// Permissions granted to this role, in declaration order.
    pub fn permissions(&self) -> Vec<Permission> {
        RolePermissionTable::global().permissions_of(*self)
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    /// Exact, case-sensitive match against the canonical names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| AuthzError::UnknownRole(s.to_string()))
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
            assert_eq!(serde_json::to_string(&role).unwrap(), format!("\"{role}\""));
        }
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert!("manager".parse::<Role>().is_err());
        assert!(" Manager".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }
}
