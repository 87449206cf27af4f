//! Error types for shodo-board
//!
//! Covers transport, protocol, and persistence failures seen by the hub.
//! Benign close conditions (peer went away normally) are classified here
//! so the session loop can keep them out of the error logs.

use thiserror::Error;

/// Board error type
#[derive(Debug, Error)]
pub enum Error {
    /// WebSocket transport error
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// Connection closed
    #[error("connection closed")]
    ConnectionClosed,

    /// Send did not complete within the write deadline
    #[error("write deadline exceeded")]
    WriteDeadline,

    /// Malformed or inconsistent wire message
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Database error from the stroke store
    #[error("database error: {0}")]
    Database(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Create a WebSocket error
    #[must_use]
    pub fn websocket(msg: impl Into<String>) -> Self {
        Self::WebSocket(msg.into())
    }

    /// Create a database error
    #[must_use]
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create an invalid message error
    #[must_use]
    pub fn invalid_message(msg: impl Into<String>) -> Self {
        Self::InvalidMessage(msg.into())
    }

    /// Whether this is a benign transport condition (peer closed normally,
    /// connection reset, broken pipe). Benign errors terminate the session
    /// but are logged at debug level only.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        match self {
            Self::ConnectionClosed => true,
            Self::WebSocket(msg) => {
                let msg = msg.to_ascii_lowercase();
                msg.contains("reset")
                    || msg.contains("broken pipe")
                    || msg.contains("closed")
                    || msg.contains("going away")
            }
            _ => false,
        }
    }

    /// Short machine-readable code for logs and protocol errors
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::WebSocket(_) => "websocket_error",
            Self::ConnectionClosed => "connection_closed",
            Self::WriteDeadline => "write_deadline",
            Self::InvalidMessage(_) => "invalid_message",
            Self::Database(_) => "database_error",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<axum::Error> for Error {
    fn from(err: axum::Error) -> Self {
        Self::WebSocket(err.to_string())
    }
}

/// Result type alias for board operations
pub type Result<T> = std::result::Result<T, Error>;
