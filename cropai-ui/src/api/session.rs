//! Session cookie middleware
//!
//! Resolves the `cropai_session` cookie to a [`Session`], creating one (and
//! setting the cookie) when the browser has none or an unknown id. The
//! session is handed to handlers as `Extension<Arc<Session>>`.

use crate::session::Session;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "cropai_session";

/// Session id from the request's cookies, if present and well-formed
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

fn session_cookie(id: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id)
}

pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let requested = session_id_from_headers(request.headers());
    let (session, created): (Arc<Session>, bool) = state.sessions.get_or_create(requested).await;
    let id = session.id();

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;

    if created {
        match HeaderValue::from_str(&session_cookie(id)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Failed to build session cookie: {}", e),
        }
    }
    response
}
