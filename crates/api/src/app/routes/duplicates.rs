//! Duplicate alert triage endpoints.

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use mixerp_core::{AlertId, PageRequest};
use mixerp_dedup::AlertStatus;

use crate::app::{errors, services::AppServices};
use crate::context::ActorContext;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_alerts))
        .route("/scan", post(scan))
        .route("/open-count", get(open_count))
        .route("/:id/resolve", post(resolve))
        .route("/:id/ignore", post(ignore))
}

/// POST /admin/duplicates/scan
pub async fn scan(
    Extension(services): Extension<AppServices>,
    Extension(ctx): Extension<ActorContext>,
) -> axum::response::Response {
    match services.detector.scan(ctx.actor()).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => errors::dedup_error_to_response(e),
    }
}

/// GET /admin/duplicates?status=&page=&page_size=
///
/// Informational: a store outage yields an empty page rather than an error.
pub async fn list_alerts(
    Extension(services): Extension<AppServices>,
    Extension(ctx): Extension<ActorContext>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => None,
        Some(raw) => match raw.parse::<AlertStatus>() {
            Ok(s) => Some(s),
            Err(e) => return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", e.to_string()),
        },
    };

    let page = match errors::parse_query_number("page", query.page.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let page_size = match errors::parse_query_number("page_size", query.page_size.as_deref()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services
        .detector
        .list_alerts_or_empty(ctx.actor(), status, PageRequest::new(page, page_size))
        .await
    {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => errors::dedup_error_to_response(e),
    }
}

/// GET /admin/duplicates/open-count
pub async fn open_count(
    Extension(services): Extension<AppServices>,
    Extension(ctx): Extension<ActorContext>,
) -> impl IntoResponse {
    let open = services.detector.open_alert_count(ctx.actor()).await;
    Json(serde_json::json!({ "open": open }))
}

/// POST /admin/duplicates/:id/resolve
pub async fn resolve(
    Extension(services): Extension<AppServices>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_alert_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.detector.resolve(ctx.actor(), id).await {
        Ok(alert) => (StatusCode::OK, Json(alert)).into_response(),
        Err(e) => errors::dedup_error_to_response(e),
    }
}

/// POST /admin/duplicates/:id/ignore
pub async fn ignore(
    Extension(services): Extension<AppServices>,
    Extension(ctx): Extension<ActorContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id = match parse_alert_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.detector.ignore(ctx.actor(), id).await {
        Ok(alert) => (StatusCode::OK, Json(alert)).into_response(),
        Err(e) => errors::dedup_error_to_response(e),
    }
}

fn parse_alert_id(raw: &str) -> Result<AlertId, axum::response::Response> {
    raw.parse::<AlertId>()
        .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}
