//! # Game Server - Ultimate Tic-Tac-Toe sessions over WebSocket
//!
//! Hosts any number of independent two-player rooms. Each room holds one
//! authoritative [`uttt_rules::GameState`]; clients only send intents and
//! render the state the server broadcasts back.
//!
//! ## Architecture Overview
//!
//! * **Rooms** ([`room`]) - seats, symbol assignment, move validation under
//!   the room lock, broadcasts
//! * **Room Manager** ([`RoomManager`]) - the registry, one per server,
//!   passed explicitly to whoever needs it
//! * **Protocol Handler** ([`ProtocolHandler`]) - parses frames, tracks which
//!   room each peer is in, answers with typed messages
//! * **Connections** ([`connection`]) - WebSocket binding of the
//!   [`Peer`] abstraction and per-connection read/write loops
//! * **Server** ([`GameServer`]) - accept loop, room sweep, shutdown
//!
//! ### Message Flow
//!
//! 1. Client sends a `{type, payload}` text frame
//! 2. The handler decodes it; malformed input gets an `ERROR` reply
//! 3. The peer's room is locked and the operation runs to completion
//! 4. Replies and broadcasts are queued on each peer's outbound channel
//!
//! ## Thread Safety
//!
//! * The registry is a `DashMap` of `Arc<Mutex<Room>>`; each room is its own
//!   mutual-exclusion domain
//! * Locks are taken registry shard first, then room, never the reverse
//! * Sending to a peer never blocks, so broadcasting under a room lock is safe

pub use config::ServerConfig;
pub use connection::ConnectionManager;
pub use error::ServerError;
pub use peer::{Peer, PeerError, PeerId};
pub use protocol::{ClientMessage, ProtocolError, ProtocolHandler, ServerMessage};
pub use room::{RegistryError, Room, RoomManager, SharedRoom};
pub use server::{GameServer, ServerStats};

pub mod config;
pub mod connection;
pub mod error;
pub mod peer;
pub mod protocol;
pub mod room;
pub mod server;

#[cfg(test)]
mod testing;

/// Creates a server with default configuration.
pub fn create_server() -> GameServer {
    GameServer::new(ServerConfig::default())
}

pub fn create_server_with_config(config: ServerConfig) -> GameServer {
    GameServer::new(config)
}
