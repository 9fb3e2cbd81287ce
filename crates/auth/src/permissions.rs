use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque capability tokens with no internal structure. The token form
/// (e.g. `"approve_stock_transactions"`) is what appears in logs, errors and JSON.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Staff
    ViewStaff,
    ManageStaff,
    // Fleet
    ViewFleet,
    ManageFleet,
    // Inventory
    ViewInventory,
    ManageInventory,
    RecordStockTransactions,
    ApproveStockTransactions,
    // Production
    ViewProduction,
    ManageProduction,
    // Fuel
    ViewFuel,
    RecordFuel,
    // Exceptions
    ViewExceptions,
    ManageExceptions,
    // Financials
    ViewFinancials,
    ManageFinancials,
    // CRM
    ViewCrm,
    ManageCrm,
    // Orders
    ViewOrders,
    ManageOrders,
    ApproveOrders,
    // System
    ManageSystemSettings,
}

impl Permission {
    pub const ALL: [Permission; 22] = [
        Permission::ViewStaff,
        Permission::ManageStaff,
        Permission::ViewFleet,
        Permission::ManageFleet,
        Permission::ViewInventory,
        Permission::ManageInventory,
        Permission::RecordStockTransactions,
        Permission::ApproveStockTransactions,
        Permission::ViewProduction,
        Permission::ManageProduction,
        Permission::ViewFuel,
        Permission::RecordFuel,
        Permission::ViewExceptions,
        Permission::ManageExceptions,
        Permission::ViewFinancials,
        Permission::ManageFinancials,
        Permission::ViewCrm,
        Permission::ManageCrm,
        Permission::ViewOrders,
        Permission::ManageOrders,
        Permission::ApproveOrders,
        Permission::ManageSystemSettings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewStaff => "view_staff",
            Permission::ManageStaff => "manage_staff",
            Permission::ViewFleet => "view_fleet",
            Permission::ManageFleet => "manage_fleet",
            Permission::ViewInventory => "view_inventory",
            Permission::ManageInventory => "manage_inventory",
            Permission::RecordStockTransactions => "record_stock_transactions",
            Permission::ApproveStockTransactions => "approve_stock_transactions",
            Permission::ViewProduction => "view_production",
            Permission::ManageProduction => "manage_production",
            Permission::ViewFuel => "view_fuel",
            Permission::RecordFuel => "record_fuel",
            Permission::ViewExceptions => "view_exceptions",
            Permission::ManageExceptions => "manage_exceptions",
            Permission::ViewFinancials => "view_financials",
            Permission::ManageFinancials => "manage_financials",
            Permission::ViewCrm => "view_crm",
            Permission::ManageCrm => "manage_crm",
            Permission::ViewOrders => "view_orders",
            Permission::ManageOrders => "manage_orders",
            Permission::ApproveOrders => "approve_orders",
            Permission::ManageSystemSettings => "manage_system_settings",
        }
    }

    /// Domain area the permission belongs to (for audit/display grouping).
    pub fn category(&self) -> &'static str {
        match self {
            Permission::ViewStaff | Permission::ManageStaff => "staff",
            Permission::ViewFleet | Permission::ManageFleet => "fleet",
            Permission::ViewInventory
            | Permission::ManageInventory
            | Permission::RecordStockTransactions
            | Permission::ApproveStockTransactions => "inventory",
            Permission::ViewProduction | Permission::ManageProduction => "production",
            Permission::ViewFuel | Permission::RecordFuel => "fuel",
            Permission::ViewExceptions | Permission::ManageExceptions => "exceptions",
            Permission::ViewFinancials | Permission::ManageFinancials => "financials",
            Permission::ViewCrm | Permission::ManageCrm => "crm",
            Permission::ViewOrders | Permission::ManageOrders | Permission::ApproveOrders => {
                "orders"
            }
            Permission::ManageSystemSettings => "system",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Permission::ViewStaff => "View staff records",
            Permission::ManageStaff => "Create/update/deactivate staff records",
            Permission::ViewFleet => "View trucks, mixers and maintenance history",
            Permission::ManageFleet => "Create/update fleet vehicles and maintenance",
            Permission::ViewInventory => "View inventory items and stock levels",
            Permission::ManageInventory => "Create/update inventory items",
            Permission::RecordStockTransactions => "Record stock receipts and issues",
            Permission::ApproveStockTransactions => "Approve pending stock transactions",
            Permission::ViewProduction => "View production batches",
            Permission::ManageProduction => "Create/update production batches",
            Permission::ViewFuel => "View fuel logs",
            Permission::RecordFuel => "Record fuel fills",
            Permission::ViewExceptions => "View delivery/operational exceptions",
            Permission::ManageExceptions => "Raise and close operational exceptions",
            Permission::ViewFinancials => "View financial reports",
            Permission::ManageFinancials => "Edit expenses, payments and financial records",
            Permission::ViewCrm => "View clients and leads",
            Permission::ManageCrm => "Create/update clients and leads",
            Permission::ViewOrders => "View sales orders",
            Permission::ManageOrders => "Create/update sales orders",
            Permission::ApproveOrders => "Approve sales orders",
            Permission::ManageSystemSettings => "Manage system settings and data-quality tools",
        }
    }
}

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A permission token that is not part of the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown permission '{0}'")]
pub struct UnknownPermission(pub String);

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn tokens_are_unique_and_round_trip() {
        let tokens: HashSet<&str> = Permission::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(tokens.len(), Permission::ALL.len());

        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
            assert_eq!(serde_json::to_string(&p).unwrap(), format!("\"{}\"", p.as_str()));
        }
    }

    #[test]
    fn unknown_token_is_rejected() {
        assert_eq!(
            "launch_rockets".parse::<Permission>(),
            Err(UnknownPermission("launch_rockets".to_string()))
        );
    }
}
