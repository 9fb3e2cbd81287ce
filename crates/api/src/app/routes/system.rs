use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::context::ActorContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(ctx): Extension<ActorContext>) -> impl IntoResponse {
    let actor = ctx.actor();
    Json(serde_json::json!({
        "user_id": actor.user_id,
        "display_name": actor.display_name,
        "role": actor.role,
        "role_recognized": ctx.role().is_some(),
        "permissions": ctx.permissions(),
    }))
}
