//! The static role → permission table.
//!
//! The whole authorization surface lives in [`default_grants`]; there is no runtime
//! grant/revoke. Changing access means changing this table and redeploying.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use crate::{Permission, Role};

static GLOBAL: LazyLock<RolePermissionTable> = LazyLock::new(RolePermissionTable::build);

/// Total mapping from every [`Role`] to its permission set.
///
/// Invariant: every role has an entry (possibly empty). Read-only after construction.
#[derive(Debug, Clone)]
pub struct RolePermissionTable {
    grants: HashMap<Role, HashSet<Permission>>,
}

impl RolePermissionTable {
    /// The process-wide table, built on first use.
    pub fn global() -> &'static RolePermissionTable {
        &GLOBAL
    }

    /// Build a fresh table from [`default_grants`].
    pub fn build() -> Self {
        let grants = Role::ALL
            .into_iter()
            .map(|role| (role, default_grants(role).into_iter().collect()))
            .collect();
        Self { grants }
    }

    pub fn grants(&self, role: Role, permission: Permission) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|set| set.contains(&permission))
    }

    /// Permissions of `role` in declaration order (stable for display).
    pub fn permissions_of(&self, role: Role) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.grants(role, *p))
            .collect()
    }

    /// Roles that hold `permission`, in declaration order.
    pub fn roles_granting(&self, permission: Permission) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.grants(*r, permission))
            .collect()
    }
}

/// Role → permission definitions.
///
/// The match is exhaustive, so adding a role without deciding its grants does not compile.
pub fn default_grants(role: Role) -> Vec<Permission> {
    use Permission::*;

    match role {
        Role::SuperAdmin => Permission::ALL.to_vec(),
        Role::Manager => Permission::ALL
            .into_iter()
            .filter(|p| *p != ManageSystemSettings)
            .collect(),
        Role::Storekeeper => vec![
            ViewInventory,
            ManageInventory,
            RecordStockTransactions,
            ViewProduction,
            ViewFuel,
            RecordFuel,
            ViewExceptions,
        ],
        Role::Accountant => vec![
            ViewStaff,
            ViewInventory,
            ViewFuel,
            ViewFinancials,
            ManageFinancials,
            ViewCrm,
            ViewOrders,
        ],
        Role::SalesRep => vec![ViewInventory, ViewCrm, ManageCrm, ViewOrders, ManageOrders],
        Role::Dispatcher => vec![
            ViewStaff,
            ViewFleet,
            ManageFleet,
            ViewFuel,
            RecordFuel,
            ViewExceptions,
            ManageExceptions,
            ViewOrders,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_has_an_entry() {
        let table = RolePermissionTable::build();
        for role in Role::ALL {
            assert!(table.grants.contains_key(&role), "missing entry for {role}");
        }
    }

    #[test]
    fn super_admin_holds_everything() {
        let table = RolePermissionTable::global();
        assert_eq!(table.permissions_of(Role::SuperAdmin), Permission::ALL.to_vec());
    }

    #[test]
    fn only_super_admin_manages_system_settings() {
        let table = RolePermissionTable::global();
        assert_eq!(
            table.roles_granting(Permission::ManageSystemSettings),
            vec![Role::SuperAdmin]
        );
    }

    #[test]
    fn stock_approval_is_reserved_for_management() {
        let table = RolePermissionTable::global();
        assert!(table.grants(Role::Manager, Permission::ApproveStockTransactions));
        assert!(!table.grants(Role::Storekeeper, Permission::ApproveStockTransactions));
        assert!(table.grants(Role::Storekeeper, Permission::RecordStockTransactions));
    }
}
