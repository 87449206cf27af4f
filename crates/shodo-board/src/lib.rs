//! Shodo Board - Real-Time Drawing Hub
//!
//! This crate provides the real-time core of the shared drawing board:
//! - Protocol: the tagged JSON envelope format (strokes and deletes)
//! - Hub: the connection registry with failure-isolated fan-out
//! - Session: per-connection receive loop with persist-then-broadcast
//! - Connection: the sink trait abstracting the WebSocket write half
//! - Store: the owner-scoped persistence contract the hub consumes
//! - Config: liveness timing (read deadline, heartbeat, write deadline)
//!
//! A connection stays ACTIVE while frames keep arriving within the read
//! timeout and heartbeat probes keep succeeding; either failing marks it
//! DEAD, which is terminal — the peer must reconnect.
//!
//! ## Usage
//!
//! ```ignore
//! use shodo_board::{run_session, BoardConfig, BoardState};
//! use std::sync::Arc;
//!
//! let state = Arc::new(BoardState::new(store, BoardConfig::default()));
//! // inside an axum upgrade handler:
//! // ws.on_upgrade(move |socket| run_session(socket, user_id, state))
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod error;
pub mod hub;
pub mod protocol;
pub mod session;
pub mod store;

// Re-export main types
pub use config::BoardConfig;
pub use connection::{BoardSink, WsSink};
pub use error::{Error, Result};
pub use hub::Hub;
pub use protocol::{Envelope, Point, Stroke};
pub use session::{run_session, BoardState};
pub use store::StrokeStore;
