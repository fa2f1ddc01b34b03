//! Client protocol: wire messages and the event handler that drives rooms.

pub mod handler;
pub mod messages;

pub use handler::ProtocolHandler;
pub use messages::{ClientMessage, JoinRoomPayload, MakeMovePayload, ProtocolError, ServerMessage};

use crate::peer::Peer;
use tracing::{error, warn};

/// Serializes `message` and queues it on `peer`, logging any failure.
pub fn send_message(peer: &dyn Peer, message: &ServerMessage<'_>) {
    match message.to_text() {
        Ok(text) => {
            if let Err(e) = peer.send(text) {
                warn!("Dropped message for peer {}: {}", peer.id(), e);
            }
        }
        Err(e) => error!("Failed to serialize message for peer {}: {}", peer.id(), e),
    }
}
