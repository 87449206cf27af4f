//! Connection Registry
//!
//! Thread-safe set of live push-channel connections with fan-out
//! broadcast. Register, unregister, and broadcast are safe under
//! arbitrary concurrent invocation from many session loops; the
//! registry lock is held for the whole fan-out pass so no connection
//! is added or removed mid-broadcast.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::connection::BoardSink;
use crate::protocol::Envelope;

/// Registry of live connections and the broadcast fan-out path.
///
/// One instance per process, constructed explicitly and threaded through
/// every session loop by reference.
pub struct Hub {
    connections: Mutex<HashMap<Uuid, Box<dyn BoardSink>>>,
    write_deadline: Duration,
}

impl Hub {
    /// Create an empty registry with the given per-send write deadline.
    #[must_use]
    pub fn new(write_deadline: Duration) -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
            write_deadline,
        }
    }

    /// Add a connection to the live set. The hub takes exclusive
    /// ownership of the sink.
    pub async fn register(&self, id: Uuid, sink: Box<dyn BoardSink>) {
        self.connections.lock().await.insert(id, sink);
    }

    /// Remove a connection, closing its sink. Removing an absent
    /// connection is a no-op.
    pub async fn unregister(&self, id: Uuid) {
        let removed = self.connections.lock().await.remove(&id);
        if let Some(mut sink) = removed {
            sink.close().await;
        }
    }

    /// Number of currently registered connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Serialize the envelope once and send it to every registered
    /// connection. A connection whose send fails or exceeds the write
    /// deadline is closed and removed within the same pass; one bad peer
    /// never blocks delivery to the others beyond its own deadline.
    pub async fn broadcast(&self, envelope: &Envelope) {
        let text = match envelope.encode() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to encode envelope, dropping broadcast");
                return;
            }
        };

        let mut connections = self.connections.lock().await;
        let ids: Vec<Uuid> = connections.keys().copied().collect();
        for id in ids {
            let Some(sink) = connections.get_mut(&id) else {
                continue;
            };
            let sent = match timeout(self.write_deadline, sink.send_text(&text)).await {
                Ok(Ok(())) => true,
                Ok(Err(e)) => {
                    if e.is_benign() {
                        debug!(connection_id = %id, error = %e, "dropping closed peer");
                    } else {
                        warn!(connection_id = %id, error = %e, "broadcast send failed");
                    }
                    false
                }
                Err(_) => {
                    warn!(connection_id = %id, "broadcast send exceeded write deadline");
                    false
                }
            };
            if !sent {
                if let Some(mut sink) = connections.remove(&id) {
                    sink.close().await;
                }
            }
        }
    }

    /// Send a heartbeat probe to one connection. Returns `false` if the
    /// connection is gone or the probe failed; a failed probe closes and
    /// removes the connection immediately.
    pub async fn ping(&self, id: Uuid) -> bool {
        let mut connections = self.connections.lock().await;
        let Some(sink) = connections.get_mut(&id) else {
            return false;
        };
        let sent = match timeout(self.write_deadline, sink.send_ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                if e.is_benign() {
                    debug!(connection_id = %id, error = %e, "heartbeat peer gone");
                } else {
                    warn!(connection_id = %id, error = %e, "heartbeat send failed");
                }
                false
            }
            Err(_) => {
                warn!(connection_id = %id, "heartbeat exceeded write deadline");
                false
            }
        };
        if !sent {
            if let Some(mut sink) = connections.remove(&id) {
                sink.close().await;
            }
        }
        sent
    }
}
