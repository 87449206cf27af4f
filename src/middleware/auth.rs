//! Session-cookie authentication
//!
//! Identity travels in an `sid` cookie holding an opaque server-side
//! session token. `CurrentUser` rejects unauthenticated requests with a
//! JSON 401; `MaybeUser` never rejects and is used by the WebSocket
//! endpoint, where unauthenticated peers are relayed but not persisted.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::server::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sid";

/// JSON error body for auth failures
#[derive(Debug, Serialize)]
struct AuthErrorResponse {
    error: String,
}

/// Rejection for unauthenticated requests
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(AuthErrorResponse {
                error: "unauthorized".to_string(),
            }),
        )
            .into_response()
    }
}

/// Extractor that requires an authenticated caller.
pub struct CurrentUser(pub i64);

/// Extractor that resolves the caller if a valid session exists, and
/// yields `None` otherwise.
pub struct MaybeUser(pub Option<i64>);

/// Pull the session token out of a request's Cookie headers.
pub fn session_token_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    let prefix = format!("{SESSION_COOKIE}=");
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .map(str::trim)
        .find_map(|cookie| cookie.strip_prefix(prefix.as_str()))
        .map(str::to_string)
}

async fn resolve_user(parts: &Parts, state: &AppState) -> Option<i64> {
    let token = session_token_from_headers(&parts.headers)?;
    match state.store.user_id_for_token(&token).await {
        Ok(user_id) => user_id,
        Err(e) => {
            warn!(error = %e, "session lookup failed");
            None
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state)
            .await
            .map(CurrentUser)
            .ok_or(AuthRejection)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve_user(parts, state).await))
    }
}
