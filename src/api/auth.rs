//! Account and session endpoints

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::middleware::auth::{session_token_from_headers, CurrentUser, SESSION_COOKIE};
use crate::server::AppState;

use super::ApiError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/register", post(register))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/me", get(me))
}

#[derive(Debug, Deserialize)]
struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Debug, Serialize)]
struct UserView {
    id: i64,
    email: String,
}

/// Hex-encoded SHA-256 of the password.
fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Response, ApiError> {
    let email = normalize_email(&body.email);
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let user_id = match state
        .store
        .create_user(&email, &hash_password(&body.password))
        .await
    {
        Ok(id) => id,
        Err(e) if shodo_store::is_unique_violation(&e) => {
            return Err(ApiError::conflict("email already registered"));
        }
        Err(e) => return Err(e.into()),
    };

    let token = state.store.create_session(user_id).await?;
    info!(user_id, "registered new user");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(UserView { id: user_id, email }),
    )
        .into_response())
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<Response, ApiError> {
    let email = normalize_email(&body.email);
    let user = state
        .store
        .user_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("invalid email or password"))?;

    if user.password_hash != hash_password(&body.password) {
        return Err(ApiError::unauthorized("invalid email or password"));
    }

    let token = state.store.create_session(user.id).await?;
    info!(user_id = user.id, "user logged in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&token))],
        Json(UserView {
            id: user.id,
            email: user.email,
        }),
    )
        .into_response())
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token_from_headers(&headers) {
        state.store.delete_session(&token).await?;
    }

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, expired_session_cookie())],
        Json(serde_json::json!({ "ok": true })),
    )
        .into_response())
}

async fn me(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<UserView>, ApiError> {
    let user = state
        .store
        .user_by_id(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("unknown user"))?;

    Ok(Json(UserView {
        id: user.id,
        email: user.email,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_is_hex_sha256() {
        // sha256("password") is a well-known digest
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
        assert_eq!(hash_password("password").len(), 64);
        assert_ne!(hash_password("a"), hash_password("b"));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ink@Example.COM "), "ink@example.com");
        assert_eq!(normalize_email("   "), "");
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok123");
        assert!(cookie.starts_with("sid=tok123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));

        let expired = expired_session_cookie();
        assert!(expired.contains("Max-Age=0"));
    }
}
