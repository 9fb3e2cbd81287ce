use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use mixerp_auth::AuthzError;
use mixerp_infra::dedup::DedupError;

pub fn dedup_error_to_response(err: DedupError) -> axum::response::Response {
    match err {
        DedupError::Unauthorized(e) => authz_error_to_response(e),
        DedupError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DedupError::NotFound(id) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("alert {id} not found"))
        }
        DedupError::InvalidState(msg) => json_error(StatusCode::CONFLICT, "invalid_state", msg),
        DedupError::Store(e) => {
            tracing::error!(error = %e, "duplicate alert store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
    }
}

pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse an optional numeric query value; the error names the parameter.
pub fn parse_query_number(
    name: &'static str,
    raw: Option<&str>,
) -> Result<Option<u32>, axum::response::Response> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse::<u32>().map(Some).map_err(|_| {
            json_error(
                StatusCode::BAD_REQUEST,
                "validation_error",
                format!("{name} must be a positive integer"),
            )
        }),
    }
}
