//! Server assembly: configuration and startup.

pub mod config;
pub mod init;

pub use init::AppState;
