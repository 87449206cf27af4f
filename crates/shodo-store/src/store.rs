//! SQLite store
//!
//! Schema and queries for users, session tokens, and strokes. Stroke
//! points live in a child table and are written transactionally with
//! their stroke. All stroke operations are scoped by owner id in the
//! WHERE clause, which is what makes cross-user deletes silent no-ops.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use rand::RngCore;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::debug;

use shodo_board::protocol::{Point, Stroke};
use shodo_board::{Error as BoardError, StrokeStore};

/// A registered user row.
#[derive(Debug, Clone)]
pub struct User {
    /// Row id
    pub id: i64,
    /// Normalized email address (unique)
    pub email: String,
    /// SHA-256 hex digest of the password
    pub password_hash: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed store for users, sessions, and strokes.
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Wrap an existing pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a pool for the given SQLite URL and initialize the schema.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect(url)
            .await?;
        let store = Self::new(pool);
        store.init().await?;
        Ok(store)
    }

    /// Apply pragmas and create the schema if missing.
    pub async fn init(&self) -> Result<(), sqlx::Error> {
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA busy_timeout=5000;")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA foreign_keys=ON;")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS strokes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                color TEXT NOT NULL,
                width INTEGER NOT NULL,
                started_at_unix_ms INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS stroke_points (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                stroke_id INTEGER NOT NULL REFERENCES strokes(id) ON DELETE CASCADE,
                x REAL NOT NULL,
                y REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
            CREATE INDEX IF NOT EXISTS idx_strokes_user ON strokes(user_id);
            CREATE INDEX IF NOT EXISTS idx_stroke_points_stroke ON stroke_points(stroke_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("sqlite schema ready");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Insert a user, returning the assigned id. Fails with a unique
    /// violation if the email is taken.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Look up a user by normalized email.
    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    /// Look up a user by id.
    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(user_from_row))
    }

    // ------------------------------------------------------------------
    // Session tokens
    // ------------------------------------------------------------------

    /// Create a session for the user, returning the opaque token placed
    /// in the client's cookie.
    pub async fn create_session(&self, user_id: i64) -> Result<String, sqlx::Error> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&token)
            .bind(user_id)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        debug!(user_id, "session created");
        Ok(token)
    }

    /// Resolve a session token to its user id.
    pub async fn user_id_for_token(&self, token: &str) -> Result<Option<i64>, sqlx::Error> {
        let row = sqlx::query("SELECT user_id FROM sessions WHERE token = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("user_id")))
    }

    /// Remove a session. Removing an absent token is a no-op.
    pub async fn delete_session(&self, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn user_from_row(row: sqlx::sqlite::SqliteRow) -> User {
    let created_at: String = row.get("created_at");
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now()),
    }
}

/// Whether an error is a unique-constraint violation (duplicate email).
#[must_use]
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.message().contains("UNIQUE"))
}

#[async_trait]
impl StrokeStore for Store {
    async fn save_stroke(
        &self,
        user_id: i64,
        color: &str,
        width: i32,
        started_at_unix_ms: i64,
        points: &[Point],
    ) -> Result<i64, BoardError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BoardError::database(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO strokes (user_id, color, width, started_at_unix_ms, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(color)
        .bind(width)
        .bind(started_at_unix_ms)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await
        .map_err(|e| BoardError::database(e.to_string()))?;
        let stroke_id = result.last_insert_rowid();

        for point in points {
            sqlx::query("INSERT INTO stroke_points (stroke_id, x, y) VALUES (?, ?, ?)")
                .bind(stroke_id)
                .bind(point.x)
                .bind(point.y)
                .execute(&mut *tx)
                .await
                .map_err(|e| BoardError::database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| BoardError::database(e.to_string()))?;
        Ok(stroke_id)
    }

    async fn list_strokes(&self, user_id: i64) -> Result<Vec<Stroke>, BoardError> {
        let rows = sqlx::query(
            "SELECT id, color, width, started_at_unix_ms FROM strokes \
             WHERE user_id = ? ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BoardError::database(e.to_string()))?;

        let mut strokes = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.get("id");
            let point_rows =
                sqlx::query("SELECT x, y FROM stroke_points WHERE stroke_id = ? ORDER BY id")
                    .bind(id)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| BoardError::database(e.to_string()))?;

            strokes.push(Stroke {
                id,
                points: point_rows
                    .iter()
                    .map(|p| Point {
                        x: p.get("x"),
                        y: p.get("y"),
                    })
                    .collect(),
                color: row.get("color"),
                width: row.get("width"),
                client_id: String::new(),
                started_at_unix_ms: row.get("started_at_unix_ms"),
            });
        }
        Ok(strokes)
    }

    async fn delete_stroke(&self, user_id: i64, stroke_id: i64) -> Result<(), BoardError> {
        sqlx::query("DELETE FROM strokes WHERE id = ? AND user_id = ?")
            .bind(stroke_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| BoardError::database(e.to_string()))?;
        Ok(())
    }

    async fn clear_strokes(&self, user_id: i64) -> Result<(), BoardError> {
        sqlx::query("DELETE FROM strokes WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| BoardError::database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_store() -> Store {
        // A single connection keeps every query on the same in-memory DB.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = Store::new(pool);
        store.init().await.unwrap();
        store
    }

    async fn test_user(store: &Store, email: &str) -> i64 {
        store.create_user(email, "deadbeef").await.unwrap()
    }

    fn point(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    #[tokio::test]
    async fn test_create_and_look_up_user() {
        let store = setup_test_store().await;
        let id = test_user(&store, "a@example.com").await;

        let by_email = store.user_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, id);
        assert_eq!(by_email.password_hash, "deadbeef");

        let by_id = store.user_by_id(id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@example.com");

        assert!(store.user_by_email("missing@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_unique_violation() {
        let store = setup_test_store().await;
        test_user(&store, "a@example.com").await;
        let err = store.create_user("a@example.com", "x").await.unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[tokio::test]
    async fn test_session_token_roundtrip() {
        let store = setup_test_store().await;
        let uid = test_user(&store, "a@example.com").await;

        let token = store.create_session(uid).await.unwrap();
        assert_eq!(store.user_id_for_token(&token).await.unwrap(), Some(uid));

        store.delete_session(&token).await.unwrap();
        assert_eq!(store.user_id_for_token(&token).await.unwrap(), None);

        // Deleting again is a no-op.
        store.delete_session(&token).await.unwrap();
    }

    #[tokio::test]
    async fn test_save_and_list_strokes_in_order() {
        let store = setup_test_store().await;
        let uid = test_user(&store, "a@example.com").await;

        let first = store
            .save_stroke(uid, "#111", 3, 1000, &[point(1.0, 2.0), point(3.0, 4.0)])
            .await
            .unwrap();
        let second = store
            .save_stroke(uid, "#222", 5, 2000, &[point(5.0, 6.0)])
            .await
            .unwrap();
        assert!(second > first);

        let strokes = store.list_strokes(uid).await.unwrap();
        assert_eq!(strokes.len(), 2);
        assert_eq!(strokes[0].id, first);
        assert_eq!(strokes[0].points, vec![point(1.0, 2.0), point(3.0, 4.0)]);
        assert_eq!(strokes[0].color, "#111");
        assert_eq!(strokes[1].width, 5);
        assert_eq!(strokes[1].started_at_unix_ms, 2000);
    }

    #[tokio::test]
    async fn test_delete_is_scoped_to_owner() {
        let store = setup_test_store().await;
        let owner = test_user(&store, "owner@example.com").await;
        let intruder = test_user(&store, "intruder@example.com").await;

        let stroke_id = store
            .save_stroke(owner, "#111", 3, 1000, &[point(1.0, 2.0)])
            .await
            .unwrap();

        // A non-owning user's delete is a silent no-op.
        store.delete_stroke(intruder, stroke_id).await.unwrap();
        assert_eq!(store.list_strokes(owner).await.unwrap().len(), 1);

        store.delete_stroke(owner, stroke_id).await.unwrap();
        assert!(store.list_strokes(owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_strokes_removes_only_that_owner() {
        let store = setup_test_store().await;
        let a = test_user(&store, "a@example.com").await;
        let b = test_user(&store, "b@example.com").await;

        store.save_stroke(a, "#111", 1, 1, &[point(1.0, 1.0)]).await.unwrap();
        store.save_stroke(a, "#111", 1, 2, &[point(2.0, 2.0)]).await.unwrap();
        store.save_stroke(b, "#222", 1, 3, &[point(3.0, 3.0)]).await.unwrap();

        store.clear_strokes(a).await.unwrap();
        assert!(store.list_strokes(a).await.unwrap().is_empty());
        assert_eq!(store.list_strokes(b).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_point_stroke_persists_empty_path() {
        let store = setup_test_store().await;
        let uid = test_user(&store, "a@example.com").await;

        let id = store.save_stroke(uid, "#111", 1, 1, &[]).await.unwrap();
        let strokes = store.list_strokes(uid).await.unwrap();
        assert_eq!(strokes[0].id, id);
        assert!(strokes[0].points.is_empty());
    }
}
