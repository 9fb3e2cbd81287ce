use serde::Serialize;
use thiserror::Error;

use crate::{Permission, Role, RolePermissionTable};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{permission}'")]
    Forbidden { permission: Permission },

    #[error("unknown role '{0}'")]
    UnknownRole(String),
}

impl AuthzError {
    pub fn forbidden(permission: Permission) -> Self {
        Self::Forbidden { permission }
    }
}

/// Whether `role` is granted `permission`.
///
/// `role` is untrusted session data. Anything outside the closed [`Role`] set is denied.
///
/// - No IO
/// - No panics
pub fn has_permission(role: &str, permission: Permission) -> bool {
    match role.parse::<Role>() {
        Ok(role) => RolePermissionTable::global().grants(role, permission),
        Err(_) => {
            tracing::debug!(role, permission = %permission, "unknown role denied");
            false
        }
    }
}

/// Enforce `permission` at an action boundary.
///
/// Fails with [`AuthzError::Forbidden`] exactly when [`has_permission`] is `false`
/// (an unknown role lacks every permission). Callers must abort the operation and
/// report the denial; nothing should have been written yet.
pub fn check_permission(role: &str, permission: Permission) -> Result<(), AuthzError> {
    if has_permission(role, permission) {
        Ok(())
    } else {
        tracing::warn!(role, permission = %permission, "permission denied");
        Err(AuthzError::forbidden(permission))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
///
/// Answers "why was this request allowed/denied?" without changing the decision itself.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub required_permission: Permission,
    pub granted: bool,
    pub reason: String,
    pub role: RoleState,
    pub denial_reason: Option<DenialReason>,
}

/// The role as presented by the caller, and what it resolves to.
#[derive(Debug, Clone, Serialize)]
pub struct RoleState {
    pub presented: String,
    pub recognized: bool,
    pub effective_permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    UnknownRole,
    MissingPermission,
}

/// Explain why `role` is (or is not) granted `required`.
///
/// The `granted` flag always agrees with [`has_permission`].
pub fn explain_authorization(role: &str, required: Permission) -> AuthorizationExplanation {
    let table = RolePermissionTable::global();

    let parsed = match role.parse::<Role>() {
        Ok(r) => r,
        Err(_) => {
            return AuthorizationExplanation {
                required_permission: required,
                granted: false,
                reason: format!("'{role}' is not a recognized role; unknown roles are denied"),
                role: RoleState {
                    presented: role.to_string(),
                    recognized: false,
                    effective_permissions: Vec::new(),
                },
                denial_reason: Some(DenialReason {
                    kind: DenialKind::UnknownRole,
                    message: format!("Role '{role}' is not one of the defined roles"),
                    suggestions: vec![
                        format!(
                            "Assign one of: {}",
                            Role::ALL.map(|r| r.as_str()).join(", ")
                        ),
                        "Check the session for stale or corrupted role data".to_string(),
                    ],
                }),
            };
        }
    };

    let effective = table.permissions_of(parsed);
    let role_state = RoleState {
        presented: role.to_string(),
        recognized: true,
        effective_permissions: effective,
    };

    if table.grants(parsed, required) {
        return AuthorizationExplanation {
            required_permission: required,
            granted: true,
            reason: format!("Role '{parsed}' grants permission '{required}'"),
            role: role_state,
            denial_reason: None,
        };
    }

    let granting: Vec<&str> = table
        .roles_granting(required)
        .into_iter()
        .map(|r| r.as_str())
        .collect();

    let mut suggestions = Vec::new();
    if !granting.is_empty() {
        suggestions.push(format!(
            "Roles that grant '{required}': {}",
            granting.join(", ")
        ));
    }
    suggestions.push("Ask an administrator to change the account's role".to_string());

    AuthorizationExplanation {
        required_permission: required,
        granted: false,
        reason: format!("Role '{parsed}' does not grant permission '{required}'"),
        role: role_state,
        denial_reason: Some(DenialReason {
            kind: DenialKind::MissingPermission,
            message: format!("Missing required permission: '{required}'"),
            suggestions,
        }),
    }
}

/// Role definition with its granted permissions (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: Role,
    pub description: &'static str,
    pub permissions: Vec<Permission>,
}

/// Permission definition (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct PermissionDefinition {
    pub name: Permission,
    pub category: &'static str,
    pub description: &'static str,
    pub granted_to: Vec<Role>,
}

/// Registry of all roles and permissions.
///
/// Provides the complete RBAC surface in one reviewable view.
#[derive(Debug, Clone, Serialize)]
pub struct RbacRegistry {
    pub roles: Vec<RoleDefinition>,
    pub permissions: Vec<PermissionDefinition>,
}

impl RbacRegistry {
    pub fn from_table(table: &RolePermissionTable) -> Self {
        let roles = Role::ALL
            .into_iter()
            .map(|role| RoleDefinition {
                name: role,
                description: role.description(),
                permissions: table.permissions_of(role),
            })
            .collect();

        let permissions = Permission::ALL
            .into_iter()
            .map(|p| PermissionDefinition {
                name: p,
                category: p.category(),
                description: p.description(),
                granted_to: table.roles_granting(p),
            })
            .collect();

        Self { roles, permissions }
    }

    pub fn role(&self, name: &str) -> Option<&RoleDefinition> {
        self.roles.iter().find(|r| r.name.as_str() == name)
    }
}
