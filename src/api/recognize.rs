//! Handwriting recognition endpoint
//!
//! Rasterizes the caller's stored strokes and ranks candidate
//! characters. The caller can bound the candidate list with `topN` and
//! override the raster dimensions; non-positive values fall back to the
//! server defaults.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use shodo_board::StrokeStore;
use shodo_recognize::{Candidate, Point, Stroke};
use tracing::debug;

use crate::middleware::auth::CurrentUser;
use crate::server::AppState;

use super::ApiError;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/recognize", post(handle))
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeRequest {
    #[serde(default, rename = "topN")]
    top_n: i64,
    #[serde(default)]
    width: i64,
    #[serde(default)]
    height: i64,
}

#[derive(Debug, Serialize)]
struct RecognizeResponse {
    candidates: Vec<Candidate>,
}

async fn handle(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    body: Option<Json<RecognizeRequest>>,
) -> Result<Json<RecognizeResponse>, ApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();

    let width = if req.width > 0 {
        req.width as usize
    } else {
        state.raster_width
    };
    let height = if req.height > 0 {
        req.height as usize
    } else {
        state.raster_height
    };

    let stored = state.store.list_strokes(user_id).await?;
    let strokes: Vec<Stroke> = stored
        .iter()
        .map(|s| Stroke {
            points: s
                .points
                .iter()
                .map(|p| Point { x: p.x, y: p.y })
                .collect(),
        })
        .collect();

    let candidates = shodo_recognize::recognize(&strokes, width, height, req.top_n);
    debug!(
        user_id,
        stroke_count = strokes.len(),
        candidate_count = candidates.len(),
        "recognition complete"
    );

    Ok(Json(RecognizeResponse { candidates }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shodo_board::{BoardConfig, BoardState, StrokeStore};
    use shodo_store::Store;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    async fn test_state() -> AppState {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = Arc::new(Store::new(pool));
        store.init().await.unwrap();
        let board = Arc::new(BoardState::new(store.clone(), BoardConfig::default()));
        AppState {
            store,
            board,
            raster_width: 300,
            raster_height: 300,
        }
    }

    #[tokio::test]
    async fn test_recognizes_stored_horizontal_stroke() {
        let state = test_state().await;
        let uid = state.store.create_user("me@example.com", "h").await.unwrap();
        state
            .store
            .save_stroke(
                uid,
                "#111",
                3,
                1000,
                &[
                    shodo_board::Point { x: 10.0, y: 150.0 },
                    shodo_board::Point { x: 290.0, y: 150.0 },
                ],
            )
            .await
            .unwrap();

        let Json(response) = handle(State(state), CurrentUser(uid), None).await.unwrap();
        assert_eq!(response.candidates[0].text, "一");
    }

    #[tokio::test]
    async fn test_no_strokes_yields_empty_candidates() {
        let state = test_state().await;
        let uid = state.store.create_user("me@example.com", "h").await.unwrap();

        let body = Json(RecognizeRequest {
            top_n: 5,
            width: 0,
            height: 0,
        });
        let Json(response) = handle(State(state), CurrentUser(uid), Some(body))
            .await
            .unwrap();
        assert!(response.candidates.is_empty());
    }
}
