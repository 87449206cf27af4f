//! WebSocket endpoint
//!
//! Authenticated peers get their strokes persisted; anonymous peers are
//! still relayed to the board in real time.

use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tracing::info;

use crate::middleware::auth::MaybeUser;
use crate::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/ws", get(upgrade))
}

async fn upgrade(
    State(state): State<AppState>,
    MaybeUser(user_id): MaybeUser,
    ws: WebSocketUpgrade,
) -> Response {
    info!(?user_id, "websocket upgrade");
    ws.on_upgrade(move |socket| shodo_board::run_session(socket, user_id, state.board.clone()))
}
