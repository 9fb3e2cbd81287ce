use serde::{Deserialize, Serialize};

use crate::{AuthzError, Permission, Role, check_permission, has_permission};

/// The acting user, as resolved from session state by the caller.
///
/// `role` is kept as the raw session string: it is validated against the closed
/// [`Role`] set on every check rather than once at construction, so stale or corrupted
/// session data simply fails closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: Option<String>,
    pub display_name: String,
    pub role: String,
}

impl Actor {
    pub fn new(display_name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: None,
            display_name: display_name.into(),
            role: role.into(),
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// In-process actor for scheduled jobs.
    pub fn system(display_name: impl Into<String>) -> Self {
        Self::new(display_name, Role::SuperAdmin.as_str())
    }

    /// The role, if the session value names one.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        has_permission(&self.role, permission)
    }

    pub fn require(&self, permission: Permission) -> Result<(), AuthzError> {
        check_permission(&self.role, permission)
    }

    /// Effective permissions (empty for unknown roles).
    pub fn permissions(&self) -> Vec<Permission> {
        self.role().map(|r| r.permissions()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_actor_can_manage_settings() {
        let actor = Actor::system("nightly-scan");
        assert!(actor.require(Permission::ManageSystemSettings).is_ok());
    }

    #[test]
    fn stale_role_fails_closed() {
        let actor = Actor::new("Old Account", "Supervisor").with_user_id("u-7");
        assert_eq!(actor.role(), None);
        assert!(actor.permissions().is_empty());
        assert!(!actor.has_permission(Permission::ViewOrders));
    }
}
