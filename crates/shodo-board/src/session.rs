//! Session Loop and Liveness Supervision
//!
//! One session loop per accepted connection, receiving envelopes,
//! persisting owner-scoped mutations, and relaying every processed
//! envelope through the hub exactly once. A companion heartbeat task
//! probes the peer on a fixed interval; the two tasks share a
//! cancellation token so tearing down one tears down both.
//!
//! Liveness state machine per connection: ACTIVE until either the read
//! deadline expires with no traffic or a heartbeat probe fails, then
//! DEAD — closed, unregistered, terminal.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use chrono::Utc;
use futures::{Stream, StreamExt};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BoardConfig;
use crate::connection::WsSink;
use crate::error::Error;
use crate::hub::Hub;
use crate::protocol::Envelope;
use crate::store::StrokeStore;

/// Shared state threaded into every session loop.
pub struct BoardState {
    /// Connection registry
    pub hub: Hub,
    /// Stroke persistence
    pub store: Arc<dyn StrokeStore>,
    /// Liveness tuning
    pub config: BoardConfig,
}

impl BoardState {
    /// Build board state from a store and liveness config.
    #[must_use]
    pub fn new(store: Arc<dyn StrokeStore>, config: BoardConfig) -> Self {
        Self {
            hub: Hub::new(config.write_deadline),
            store,
            config,
        }
    }
}

/// Drive one accepted WebSocket until the peer disconnects or goes dead.
///
/// `user_id` is the caller identity resolved at upgrade time; `None`
/// means the connection is relayed live but never persisted.
pub async fn run_session(socket: WebSocket, user_id: Option<i64>, state: Arc<BoardState>) {
    let connection_id = Uuid::new_v4();
    info!(connection_id = %connection_id, authenticated = user_id.is_some(), "board connected");

    let (sender, receiver) = socket.split();
    state
        .hub
        .register(connection_id, Box::new(WsSink::new(sender)))
        .await;

    let cancel = CancellationToken::new();
    let heartbeat_handle = tokio::spawn(heartbeat(state.clone(), connection_id, cancel.clone()));

    read_loop(receiver, user_id, &state, connection_id, &cancel).await;

    cancel.cancel();
    state.hub.unregister(connection_id).await;
    let _ = heartbeat_handle.await;
    info!(connection_id = %connection_id, "board disconnected");
}

/// Receive frames until the peer disconnects, the read deadline expires
/// with no traffic, or the session is cancelled. Any received frame,
/// pong included, re-arms the deadline by completing the receive.
async fn read_loop<S>(
    mut receiver: S,
    user_id: Option<i64>,
    state: &BoardState,
    connection_id: Uuid,
    cancel: &CancellationToken,
) where
    S: Stream<Item = std::result::Result<Message, axum::Error>> + Unpin,
{
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break,
            read = timeout(state.config.read_timeout, receiver.next()) => match read {
                Err(_) => {
                    debug!(connection_id = %connection_id, "read deadline expired");
                    break;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    let err = Error::from(e);
                    if err.is_benign() {
                        debug!(connection_id = %connection_id, error = %err, "peer went away");
                    } else {
                        warn!(connection_id = %connection_id, error = %err, "read error");
                    }
                    break;
                }
                Ok(Some(Ok(msg))) => msg,
            },
        };

        match msg {
            Message::Text(text) => handle_envelope(&text, user_id, state).await,
            Message::Close(_) => {
                debug!(connection_id = %connection_id, "close frame received");
                break;
            }
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }
}

/// Periodic heartbeat probe. A failed probe marks the connection dead:
/// the hub closes and removes it, and the session loop is cancelled.
async fn heartbeat(state: Arc<BoardState>, connection_id: Uuid, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(state.config.heartbeat_interval);
    ticker.tick().await; // the first tick completes immediately

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {
                if !state.hub.ping(connection_id).await {
                    debug!(connection_id = %connection_id, "heartbeat failed, tearing down");
                    cancel.cancel();
                    return;
                }
            }
        }
    }
}

/// Process one received text frame: decode, persist if the caller is
/// authenticated, then hand the (possibly enriched) envelope to the hub
/// exactly once. Decode failures are logged and the session continues.
pub(crate) async fn handle_envelope(text: &str, user_id: Option<i64>, state: &BoardState) {
    let envelope = match Envelope::decode(text) {
        Ok(Some(envelope)) => envelope,
        Ok(None) => {
            debug!("ignoring envelope with unknown type");
            return;
        }
        Err(e) => {
            warn!(error = %e, "malformed envelope");
            return;
        }
    };

    match envelope {
        Envelope::Stroke(mut stroke) => {
            if stroke.started_at_unix_ms == 0 {
                stroke.started_at_unix_ms = Utc::now().timestamp_millis();
            }
            // Empty strokes are relayed but never persisted; identity
            // gates persistence only, the live relay always proceeds.
            if !stroke.points.is_empty() {
                if let Some(uid) = user_id {
                    match state
                        .store
                        .save_stroke(
                            uid,
                            &stroke.color,
                            stroke.width,
                            stroke.started_at_unix_ms,
                            &stroke.points,
                        )
                        .await
                    {
                        Ok(id) => stroke.id = id,
                        Err(e) => warn!(error = %e, "failed to persist stroke"),
                    }
                }
            }
            state.hub.broadcast(&Envelope::Stroke(stroke)).await;
        }
        Envelope::Delete(stroke_id) => {
            if let Some(uid) = user_id {
                if let Err(e) = state.store.delete_stroke(uid, stroke_id).await {
                    warn!(error = %e, stroke_id, "failed to delete stroke");
                }
            }
            state.hub.broadcast(&Envelope::Delete(stroke_id)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::connection::BoardSink;
    use crate::error::Result;
    use crate::protocol::{Point, Stroke};
    use crate::store::StrokeStore;

    #[derive(Clone, Default)]
    struct RecordingSink {
        sent: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl BoardSink for RecordingSink {
        async fn send_text(&mut self, text: &str) -> Result<()> {
            self.sent.lock().await.push(text.to_string());
            Ok(())
        }

        async fn send_ping(&mut self) -> Result<()> {
            Ok(())
        }

        async fn close(&mut self) {}
    }

    #[derive(Default)]
    struct FakeStore {
        saved: Mutex<Vec<(i64, Vec<Point>)>>,
        deleted: Mutex<Vec<(i64, i64)>>,
        fail_saves: AtomicBool,
    }

    #[async_trait]
    impl StrokeStore for FakeStore {
        async fn save_stroke(
            &self,
            user_id: i64,
            _color: &str,
            _width: i32,
            _started_at_unix_ms: i64,
            points: &[Point],
        ) -> Result<i64> {
            if self.fail_saves.load(Ordering::SeqCst) {
                return Err(Error::database("disk full"));
            }
            let mut saved = self.saved.lock().await;
            saved.push((user_id, points.to_vec()));
            Ok(saved.len() as i64)
        }

        async fn list_strokes(&self, _user_id: i64) -> Result<Vec<Stroke>> {
            Ok(Vec::new())
        }

        async fn delete_stroke(&self, user_id: i64, stroke_id: i64) -> Result<()> {
            self.deleted.lock().await.push((user_id, stroke_id));
            Ok(())
        }

        async fn clear_strokes(&self, _user_id: i64) -> Result<()> {
            Ok(())
        }
    }

    async fn state_with_sink() -> (Arc<BoardState>, Arc<FakeStore>, RecordingSink) {
        let store = Arc::new(FakeStore::default());
        let config = BoardConfig::default().with_write_deadline(Duration::from_secs(1));
        let state = Arc::new(BoardState::new(store.clone(), config));
        let sink = RecordingSink::default();
        state
            .hub
            .register(Uuid::new_v4(), Box::new(sink.clone()))
            .await;
        (state, store, sink)
    }

    fn stroke_text() -> String {
        r##"{"type":"stroke","stroke":{"points":[{"x":1,"y":2},{"x":3,"y":4}],"color":"#111","width":3,"clientId":"c9","startedAtUnixMs":1700000000000}}"##.to_string()
    }

    #[tokio::test]
    async fn test_authenticated_stroke_is_persisted_then_broadcast_with_id() {
        let (state, store, sink) = state_with_sink().await;

        handle_envelope(&stroke_text(), Some(42), &state).await;

        let saved = store.saved.lock().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, 42);

        let sent = sink.sent.lock().await;
        assert_eq!(sent.len(), 1);
        match Envelope::decode(&sent[0]).unwrap().unwrap() {
            Envelope::Stroke(stroke) => {
                assert_eq!(stroke.id, 1);
                assert_eq!(stroke.client_id, "c9");
            }
            other => unreachable!("expected stroke, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_anonymous_stroke_relayed_unpersisted_with_zero_id() {
        let (state, store, sink) = state_with_sink().await;

        handle_envelope(&stroke_text(), None, &state).await;

        assert!(store.saved.lock().await.is_empty());
        let sent = sink.sent.lock().await;
        assert_eq!(sent.len(), 1);
        match Envelope::decode(&sent[0]).unwrap().unwrap() {
            Envelope::Stroke(stroke) => assert_eq!(stroke.id, 0),
            other => unreachable!("expected stroke, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_does_not_block_broadcast() {
        let (state, store, sink) = state_with_sink().await;
        store.fail_saves.store(true, Ordering::SeqCst);

        handle_envelope(&stroke_text(), Some(7), &state).await;

        let sent = sink.sent.lock().await;
        assert_eq!(sent.len(), 1);
        match Envelope::decode(&sent[0]).unwrap().unwrap() {
            Envelope::Stroke(stroke) => assert_eq!(stroke.id, 0),
            other => unreachable!("expected stroke, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_stroke_relayed_without_persistence() {
        let (state, store, sink) = state_with_sink().await;
        let text = r##"{"type":"stroke","stroke":{"points":[],"color":"#111","width":3}}"##;

        handle_envelope(text, Some(7), &state).await;

        assert!(store.saved.lock().await.is_empty());
        assert_eq!(sink.sent.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_timestamp_filled_in() {
        let (state, _store, sink) = state_with_sink().await;
        let text = r##"{"type":"stroke","stroke":{"points":[{"x":1,"y":1}],"color":"#111","width":1}}"##;

        handle_envelope(text, None, &state).await;

        let sent = sink.sent.lock().await;
        match Envelope::decode(&sent[0]).unwrap().unwrap() {
            Envelope::Stroke(stroke) => assert!(stroke.started_at_unix_ms > 0),
            other => unreachable!("expected stroke, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delete_is_owner_scoped_and_always_broadcast() {
        let (state, store, sink) = state_with_sink().await;

        handle_envelope(r#"{"type":"delete","delete":55}"#, Some(3), &state).await;
        handle_envelope(r#"{"type":"delete","delete":56}"#, None, &state).await;

        let deleted = store.deleted.lock().await;
        assert_eq!(*deleted, vec![(3, 55)]);

        let sent = sink.sent.lock().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], r#"{"type":"delete","delete":56}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_deadline_expiry_ends_the_session() {
        let (state, _store, _sink) = state_with_sink().await;
        let cancel = CancellationToken::new();
        let started = tokio::time::Instant::now();

        // A peer that never sends anything: the loop must give up once
        // the read timeout elapses rather than wait forever.
        let silence = futures::stream::pending::<std::result::Result<Message, axum::Error>>();
        read_loop(silence, None, &state, Uuid::new_v4(), &cancel).await;

        assert!(started.elapsed() >= state.config.read_timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_received_frame_rearms_the_read_deadline() {
        let (state, store, sink) = state_with_sink().await;
        let cancel = CancellationToken::new();
        let started = tokio::time::Instant::now();

        let frames = futures::stream::iter(vec![Ok(Message::Text(stroke_text()))])
            .chain(futures::stream::pending::<std::result::Result<Message, axum::Error>>());
        read_loop(frames, Some(1), &state, Uuid::new_v4(), &cancel).await;

        // The frame was processed, then the deadline ran out afresh.
        assert_eq!(store.saved.lock().await.len(), 1);
        assert_eq!(sink.sent.lock().await.len(), 1);
        assert!(started.elapsed() >= state.config.read_timeout);
    }

    #[tokio::test]
    async fn test_close_frame_ends_the_session() {
        let (state, _store, sink) = state_with_sink().await;
        let cancel = CancellationToken::new();

        let frames = futures::stream::iter(vec![Ok(Message::Close(None))])
            .chain(futures::stream::pending::<std::result::Result<Message, axum::Error>>());
        read_loop(frames, None, &state, Uuid::new_v4(), &cancel).await;

        assert!(sink.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_and_unknown_frames_are_dropped() {
        let (state, store, sink) = state_with_sink().await;

        handle_envelope("not json", Some(1), &state).await;
        handle_envelope(r#"{"type":"cursor","delete":1}"#, Some(1), &state).await;

        assert!(store.saved.lock().await.is_empty());
        assert!(sink.sent.lock().await.is_empty());
    }
}
