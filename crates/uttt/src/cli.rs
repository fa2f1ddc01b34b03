//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments. Every override beats the configuration file.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Ultimate Tic-Tac-Toe session server", long_about = None)]
pub struct CliArgs {
    /// Configuration file path
    ///
    /// If the file doesn't exist, a default configuration is written there.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Bind address override (e.g. "0.0.0.0:8080")
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Output logs in JSON format
    #[arg(long)]
    pub json_logs: bool,

    /// Maximum number of concurrent connections
    #[arg(long)]
    pub max_connections: Option<usize>,
}
