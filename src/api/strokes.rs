//! Stored-stroke endpoints
//!
//! Every endpoint here is owner-scoped: callers only ever see or touch
//! their own strokes.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use shodo_board::{Stroke, StrokeStore};
use tracing::info;

use crate::middleware::auth::CurrentUser;
use crate::server::AppState;

use super::ApiError;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/strokes", get(list))
        .route("/api/strokes/clear", post(clear))
        .route("/api/strokes/delete", post(delete))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Stroke>>, ApiError> {
    let strokes = state.store.list_strokes(user_id).await?;
    Ok(Json(strokes))
}

async fn clear(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    state.store.clear_strokes(user_id).await?;
    info!(user_id, "cleared strokes");
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    #[serde(default)]
    id: i64,
}

async fn delete(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, ApiError> {
    if params.id <= 0 {
        return Err(ApiError::bad_request("id must be a positive integer"));
    }
    state.store.delete_stroke(user_id, params.id).await?;
    Ok(Json(json!({ "ok": true, "id": params.id })))
}
