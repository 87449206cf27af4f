//! Connection Sink
//!
//! The registry owns each live connection through the [`BoardSink`] trait
//! rather than the concrete axum sink, so fan-out and liveness behavior
//! can be exercised in tests with deterministic doubles.

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;

use crate::error::{Error, Result};

/// Write half of a live push-channel connection.
///
/// Once a sink is registered with the hub, the hub owns it exclusively;
/// no other component retains a reference.
#[async_trait]
pub trait BoardSink: Send {
    /// Send a text frame to the peer.
    async fn send_text(&mut self, text: &str) -> Result<()>;

    /// Send a heartbeat probe to the peer.
    async fn send_ping(&mut self) -> Result<()>;

    /// Close the connection. Errors are irrelevant at this point.
    async fn close(&mut self);
}

/// [`BoardSink`] over the write half of an axum WebSocket.
pub struct WsSink {
    sink: SplitSink<WebSocket, Message>,
}

impl WsSink {
    /// Wrap a split WebSocket sink.
    #[must_use]
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl BoardSink for WsSink {
    async fn send_text(&mut self, text: &str) -> Result<()> {
        self.sink
            .send(Message::Text(text.to_string()))
            .await
            .map_err(Error::from)
    }

    async fn send_ping(&mut self) -> Result<()> {
        self.sink
            .send(Message::Ping(b"ping".to_vec()))
            .await
            .map_err(Error::from)
    }

    async fn close(&mut self) {
        let _ = self.sink.send(Message::Close(None)).await;
        let _ = self.sink.close().await;
    }
}
