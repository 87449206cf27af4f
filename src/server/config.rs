//! Server configuration
//!
//! Flat CLI + environment configuration with working defaults. CLI
//! flags win over environment variables, which win over defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use shodo_board::BoardConfig;
use shodo_recognize::{DEFAULT_RASTER_HEIGHT, DEFAULT_RASTER_WIDTH};

use crate::cli::Cli;

/// Resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen address
    pub addr: String,
    /// SQLite database URL
    pub database_url: String,
    /// Optional directory of built frontend files
    pub static_dir: Option<PathBuf>,
    /// Connection liveness tuning for the board hub
    pub board: BoardConfig,
    /// Raster width for classification requests
    pub raster_width: usize,
    /// Raster height for classification requests
    pub raster_height: usize,
}

impl ServerConfig {
    /// Merge CLI flags, environment variables, and defaults.
    pub fn load(cli: &Cli) -> Self {
        let board = BoardConfig::default()
            .with_read_timeout(env_duration("READ_TIMEOUT_SECS", 60))
            .with_heartbeat_interval(env_duration("HEARTBEAT_INTERVAL_SECS", 30))
            .with_write_deadline(env_duration("WRITE_DEADLINE_SECS", 5));

        Self {
            addr: cli
                .addr
                .clone()
                .or_else(|| env::var("ADDR").ok())
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            database_url: cli
                .db
                .clone()
                .or_else(|| env::var("DATABASE_URL").ok())
                .unwrap_or_else(|| "sqlite:shodo.db?mode=rwc".to_string()),
            static_dir: cli
                .static_dir
                .clone()
                .or_else(|| env::var("STATIC_DIR").ok().map(PathBuf::from)),
            board,
            raster_width: env_usize("RASTER_WIDTH", DEFAULT_RASTER_WIDTH),
            raster_height: env_usize("RASTER_HEIGHT", DEFAULT_RASTER_HEIGHT),
        }
    }
}

fn env_duration(key: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_parse(key).unwrap_or(default_secs))
}

fn env_usize(key: &str, default: usize) -> usize {
    env_parse(key).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
