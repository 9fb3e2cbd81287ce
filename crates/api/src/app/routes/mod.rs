use axum::{Router, routing::get};

pub mod duplicates;
pub mod rbac;
pub mod system;

/// Router for all endpoints that need an acting user.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/admin/rbac", rbac::router())
        .nest("/admin/duplicates", duplicates::router())
}
