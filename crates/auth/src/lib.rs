//! `mixerp-auth`: role-based authorization boundary.
//!
//! Roles and permissions are closed enumerations, and the mapping between them is a
//! single static table. This crate is intentionally decoupled from HTTP, sessions and
//! storage: callers hand in the role string they resolved from session state.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod table;

pub use authorize::{
    AuthorizationExplanation, AuthzError, RbacRegistry, check_permission, explain_authorization,
    has_permission,
};
pub use permissions::Permission;
pub use principal::Actor;
pub use roles::Role;
pub use table::RolePermissionTable;
