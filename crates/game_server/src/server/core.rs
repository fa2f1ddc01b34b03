//! Core game server implementation.
//!
//! `GameServer` wires the room registry, the protocol handler and the
//! connection tracker together and runs the accept loop until shutdown.

use crate::{
    config::ServerConfig,
    connection::{handle_connection, ConnectionManager},
    error::ServerError,
    protocol::ProtocolHandler,
    room::RoomManager,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

/// Point-in-time counters for monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerStats {
    pub room_count: usize,
    pub connection_count: usize,
}

/// The Ultimate Tic-Tac-Toe session server.
///
/// Owns exactly one [`RoomManager`], shared with the protocol handler. All
/// game logic lives in the rooms; the server only moves sockets around.
pub struct GameServer {
    /// Server configuration settings
    config: ServerConfig,

    /// Registry of live rooms
    room_manager: Arc<RoomManager>,

    /// Translates frames into room operations
    handler: Arc<ProtocolHandler>,

    /// Open WebSocket connections
    connection_manager: Arc<ConnectionManager>,

    /// Flips to `true` once shutdown is requested
    shutdown_signal: watch::Sender<bool>,
}

impl GameServer {
    /// Creates a server with an empty room registry.
    ///
    /// Nothing is bound until [`GameServer::start`] or [`GameServer::serve`]
    /// is called.
    ///
    /// # Arguments
    ///
    /// * `config` - Listen address, connection limit and sweep interval
    pub fn new(config: ServerConfig) -> Self {
        let room_manager = Arc::new(RoomManager::new());
        let handler = Arc::new(ProtocolHandler::new(room_manager.clone()));
        let connection_manager = Arc::new(ConnectionManager::new(config.max_connections));
        let (shutdown_signal, _) = watch::channel(false);

        Self {
            config,
            room_manager,
            handler,
            connection_manager,
            shutdown_signal,
        }
    }

    /// Binds the configured address and serves until [`GameServer::shutdown`].
    pub async fn start(&self) -> Result<(), ServerError> {
        self.config.validate()?;
        info!("🚀 Starting game server on {}", self.config.bind_address);

        let listener = TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Network(format!("Bind failed: {e}")))?;

        self.serve(listener).await
    }

    /// Runs the accept loop on an already bound listener.
    ///
    /// Returns once shutdown is requested, after every open connection has
    /// been asked to close.
    ///
    /// # Arguments
    ///
    /// * `listener` - A bound listener; its address overrides the configured one
    ///
    /// # Returns
    ///
    /// `Ok(())` after a clean shutdown. Accept errors are logged and the loop
    /// keeps running.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use game_server::{GameServer, ServerConfig};
    /// use std::sync::Arc;
    /// use tokio::net::TcpListener;
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let server = Arc::new(GameServer::new(ServerConfig::default()));
    /// let listener = TcpListener::bind("127.0.0.1:0").await?;
    ///
    /// let running = server.clone();
    /// let handle = tokio::spawn(async move { running.serve(listener).await });
    ///
    /// server.shutdown().await?;
    /// handle.await??;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Network(format!("Listener has no local address: {e}")))?;
        info!("✅ Listening on {}", local_addr);

        let sweeper = self.start_room_sweep();
        let mut shutdown_receiver = self.shutdown_signal.subscribe();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        debug!("Accepted TCP connection from {}", addr);
                        let connections = self.connection_manager.clone();
                        let handler = self.handler.clone();

                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, addr, connections, handler).await {
                                error!("Connection error: {}", e);
                            }
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                },
                _ = shutdown_receiver.wait_for(|stopped| *stopped) => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!("🧹 Performing server cleanup...");
        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        let closed = self.connection_manager.shutdown_all();
        info!("✅ Asked {} connection(s) to close", closed);
        info!("Server stopped");
        Ok(())
    }

    /// Periodically drops rooms nobody occupies. Disabled at interval 0.
    fn start_room_sweep(&self) -> Option<JoinHandle<()>> {
        if self.config.sweep_interval_ms == 0 {
            info!("⏸️ Room sweep disabled (interval: 0ms)");
            return None;
        }

        let rooms = self.room_manager.clone();
        let period = Duration::from_millis(self.config.sweep_interval_ms);
        info!("🕒 Room sweep every {}ms", self.config.sweep_interval_ms);

        Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            loop {
                ticker.tick().await;
                let swept = rooms.clean_empty_rooms();
                if swept > 0 {
                    info!("🧹 Swept {} empty room(s)", swept);
                }
            }
        }))
    }

    /// Signals the accept loop to stop. Safe to call before or during `serve`.
    ///
    /// The flag is sticky: a `serve` that starts afterwards returns at once.
    /// Open connections are closed by the accept loop on its way out.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        info!("🛑 Shutting down server...");
        self.shutdown_signal.send_replace(true);
        Ok(())
    }

    pub fn room_manager(&self) -> Arc<RoomManager> {
        self.room_manager.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Snapshot of the live room and connection counts.
    ///
    /// # Returns
    ///
    /// A [`ServerStats`] read without blocking; the two counts are taken one
    /// after the other and may be momentarily inconsistent under load.
    pub fn get_server_stats(&self) -> ServerStats {
        ServerStats {
            room_count: self.room_manager.room_count(),
            connection_count: self.connection_manager.connection_count(),
        }
    }
}
