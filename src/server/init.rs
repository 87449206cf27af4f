//! Server startup
//!
//! Builds the application state, assembles the router with its layers,
//! and serves until the process is stopped.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use shodo_board::BoardState;
use shodo_store::Store;

use crate::api;
use crate::server::config::ServerConfig;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// SQLite store (users, sessions, strokes)
    pub store: Arc<Store>,
    /// Real-time hub state (registry + liveness config)
    pub board: Arc<BoardState>,
    /// Raster width for classification
    pub raster_width: usize,
    /// Raster height for classification
    pub raster_height: usize,
}

/// Open the store, assemble the router, and serve.
pub async fn run(config: ServerConfig) -> Result<()> {
    let store = Arc::new(
        Store::connect(&config.database_url)
            .await
            .with_context(|| format!("open database {}", config.database_url))?,
    );
    let board = Arc::new(BoardState::new(store.clone(), config.board));

    let state = AppState {
        store,
        board,
        raster_width: config.raster_width,
        raster_height: config.raster_height,
    };

    // The frontend sends the session cookie cross-origin during local
    // development, so origins are mirrored and credentials allowed.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_headers([header::CONTENT_TYPE])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS]);

    let mut app: Router = Router::new()
        .merge(api::auth::routes())
        .merge(api::strokes::routes())
        .merge(api::recognize::routes())
        .merge(api::ws::routes())
        .merge(api::health::routes())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    if let Some(dir) = &config.static_dir {
        info!(dir = %dir.display(), "serving static files");
        app = app.fallback_service(ServeDir::new(dir));
    }

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .with_context(|| format!("bind {}", config.addr))?;
    info!(addr = %config.addr, "listening");

    axum::serve(listener, app).await.context("server error")
}
