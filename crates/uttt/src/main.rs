//! Ultimate Tic-Tac-Toe session server
//!
//! Loads configuration, installs logging and runs the WebSocket server until
//! a shutdown signal arrives.

mod cli;
mod config;
mod logging;
mod signals;

use anyhow::{anyhow, Result};
use clap::Parser;
use game_server::GameServer;
use std::sync::Arc;
use tracing::{error, info};

use cli::CliArgs;
use config::AppConfig;
use logging::setup_logging;
use signals::shutdown_signal;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    // Configuration is loaded before logging exists.
    let mut config = AppConfig::load_from_file(&args.config).await?;
    config.apply_cli_overrides(&args);
    config
        .validate()
        .map_err(|e| anyhow!("Configuration validation failed: {e}"))?;

    setup_logging(&config.logging)?;

    let server = Arc::new(GameServer::new(config.to_server_config()?));

    info!("🎮 Ultimate Tic-Tac-Toe server v{}", env!("CARGO_PKG_VERSION"));
    info!("📋 Configuration Summary:");
    info!("  📂 Config file: {}", args.config.display());
    info!("  🌐 Bind address: {}", config.server.bind_address);
    info!("  👥 Max connections: {}", config.server.max_connections);
    info!("  🧹 Room sweep: {}ms", config.server.sweep_interval_ms);

    let running = server.clone();
    let mut server_handle = tokio::spawn(async move { running.start().await });

    let reason = tokio::select! {
        finished = &mut server_handle => {
            // The server only stops on its own when it failed to start.
            let result = finished?;
            if let Err(e) = &result {
                error!("❌ Server error: {}", e);
            }
            return result.map_err(Into::into);
        }
        reason = shutdown_signal() => reason?,
    };

    info!("🛑 {} received, initiating graceful shutdown...", reason);
    server.shutdown().await?;
    server_handle.await??;

    let stats = server.get_server_stats();
    info!(
        "📊 Final state after {}: {} room(s), {} connection(s)",
        reason, stats.room_count, stats.connection_count
    );
    info!("👋 Server shutdown complete");
    Ok(())
}
