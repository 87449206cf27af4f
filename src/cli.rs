//! Command-line flags
//!
//! Every flag has an environment-variable fallback applied in
//! `ServerConfig::load`, so the server can be driven entirely from the
//! environment in containerized deployments.

use std::path::PathBuf;

use clap::Parser;

/// Collaborative drawing board server
#[derive(Debug, Parser)]
#[command(name = "shodo", version)]
pub struct Cli {
    /// HTTP listen address (env: ADDR)
    #[arg(long)]
    pub addr: Option<String>,

    /// SQLite database URL (env: DATABASE_URL)
    #[arg(long)]
    pub db: Option<String>,

    /// Directory to serve static frontend files from (env: STATIC_DIR)
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}
