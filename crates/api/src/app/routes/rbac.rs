//! RBAC audit endpoints for authorization debugging.
//!
//! Listing roles and permissions is an admin task; `explain` is open to every actor and
//! only ever explains the caller's own access.

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use mixerp_auth::{Permission, explain_authorization};

use crate::app::{errors, services::AppServices};
use crate::context::ActorContext;

// ─────────────────────────────────────────────────────────────────────────────
// Query Parameters
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ExplainQuery {
    pub permission: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/roles/:name", get(get_role))
        .route("/permissions", get(list_permissions))
        .route("/explain", get(explain))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /admin/rbac/roles - every role with its description and permissions
pub async fn list_roles(
    Extension(services): Extension<AppServices>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(e) = ctx.actor().require(Permission::ManageSystemSettings) {
        return errors::authz_error_to_response(e);
    }

    (StatusCode::OK, Json(serde_json::json!({ "roles": services.rbac.roles }))).into_response()
}

/// GET /admin/rbac/roles/:name - one role
pub async fn get_role(
    Extension(services): Extension<AppServices>,
    Extension(ctx): Extension<ActorContext>,
    Path(name): Path<String>,
) -> axum::response::Response {
    if let Err(e) = ctx.actor().require(Permission::ManageSystemSettings) {
        return errors::authz_error_to_response(e);
    }

    match services.rbac.role(&name) {
        Some(role) => (StatusCode::OK, Json(serde_json::json!({ "role": role }))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", format!("role '{name}' not found")),
    }
}

/// GET /admin/rbac/permissions - every permission with category and granting roles
pub async fn list_permissions(
    Extension(services): Extension<AppServices>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    if let Err(e) = ctx.actor().require(Permission::ManageSystemSettings) {
        return errors::authz_error_to_response(e);
    }

    (
        StatusCode::OK,
        Json(serde_json::json!({ "permissions": services.rbac.permissions })),
    )
        .into_response()
}

/// GET /admin/rbac/explain?permission=X - why the caller can or cannot use X
pub async fn explain(
    Extension(ctx): Extension<ActorContext>,
    Query(query): Query<ExplainQuery>,
) -> axum::response::Response {
    let Some(raw) = query.permission.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "permission query parameter is required",
        );
    };

    let permission = match raw.parse::<Permission>() {
        Ok(p) => p,
        Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
    };

    let explanation = explain_authorization(&ctx.actor().role, permission);
    (StatusCode::OK, Json(serde_json::json!({ "explanation": explanation }))).into_response()
}
