//! Stroke persistence contract
//!
//! The hub consumes persistence through this trait; the SQLite
//! implementation lives in `shodo-store`. All operations are scoped to
//! an owning user id — deleting a stroke the caller does not own is a
//! silent no-op at the store level.

use async_trait::async_trait;

use crate::error::Result;
use crate::protocol::{Point, Stroke};

/// Owner-scoped stroke persistence consumed by the session loop and the
/// HTTP API.
#[async_trait]
pub trait StrokeStore: Send + Sync {
    /// Persist a stroke and its points, returning the assigned stroke id.
    async fn save_stroke(
        &self,
        user_id: i64,
        color: &str,
        width: i32,
        started_at_unix_ms: i64,
        points: &[Point],
    ) -> Result<i64>;

    /// List the user's strokes in insertion order, points included.
    async fn list_strokes(&self, user_id: i64) -> Result<Vec<Stroke>>;

    /// Delete one stroke by id, scoped to the owner.
    async fn delete_stroke(&self, user_id: i64, stroke_id: i64) -> Result<()>;

    /// Delete all of the user's strokes.
    async fn clear_strokes(&self, user_id: i64) -> Result<()>;
}
