//! Shodo Store - SQLite Persistence
//!
//! Relational persistence for the drawing board:
//! - users with unique normalized emails and hashed passwords
//! - server-side session tokens backing the `sid` cookie
//! - strokes with their points in a child table, owner-scoped throughout
//!
//! Implements the [`shodo_board::StrokeStore`] contract consumed by the
//! real-time hub and the HTTP API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod store;

pub use store::{is_unique_violation, Store, User};
