use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use mixerp_auth::Actor;

use crate::context::ActorContext;

pub const ROLE_HEADER: &str = "x-actor-role";
pub const NAME_HEADER: &str = "x-actor-name";
pub const ID_HEADER: &str = "x-actor-id";

/// Resolve the acting user from the session headers and attach an [`ActorContext`].
///
/// A missing role or display name is a 401. Unknown role strings are passed through;
/// the permission engine denies them.
pub async fn actor_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let actor = extract_actor(req.headers())?;
    req.extensions_mut().insert(ActorContext::new(actor));
    Ok(next.run(req).await)
}

fn extract_actor(headers: &HeaderMap) -> Result<Actor, StatusCode> {
    let role = required_header(headers, ROLE_HEADER)?;
    let name = required_header(headers, NAME_HEADER)?;

    let actor = Actor::new(name, role);
    Ok(match optional_header(headers, ID_HEADER) {
        Some(id) => actor.with_user_id(id),
        None => actor,
    })
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, StatusCode> {
    optional_header(headers, name).ok_or(StatusCode::UNAUTHORIZED)
}

fn optional_header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
