//! Liveness configuration
//!
//! Timing knobs for connection supervision. The defaults match the
//! deployed values: a peer that produces no traffic for the read timeout
//! is considered dead, probes go out on the heartbeat interval, and a
//! broadcast send that exceeds the write deadline counts as a failure.

use std::time::Duration;

/// Timing configuration for connection liveness
#[derive(Debug, Clone, Copy)]
pub struct BoardConfig {
    /// Read deadline: the session dies if nothing arrives within this window
    pub read_timeout: Duration,
    /// Interval between heartbeat probes
    pub heartbeat_interval: Duration,
    /// Upper bound on any single send before it is treated as failed
    pub write_deadline: Duration,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(60),
            heartbeat_interval: Duration::from_secs(30),
            write_deadline: Duration::from_secs(5),
        }
    }
}

impl BoardConfig {
    /// Override the read timeout
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Override the heartbeat interval
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Override the write deadline
    #[must_use]
    pub fn with_write_deadline(mut self, deadline: Duration) -> Self {
        self.write_deadline = deadline;
        self
    }
}
