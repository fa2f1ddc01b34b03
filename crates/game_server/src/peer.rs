//! Transport-agnostic view of a connected participant.
//!
//! Rooms and the protocol handler only ever see `Arc<dyn Peer>`: something
//! with an identity that can be sent text frames and asked to close. The
//! WebSocket binding lives in [`crate::connection`]; tests substitute an
//! in-memory recorder.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a connected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub Uuid);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("Peer {0} is no longer connected")]
    Disconnected(PeerId),
}

/// A connected participant.
///
/// `send` must not block: implementations queue the frame and return. A
/// failure means the peer is gone; callers log it and carry on.
pub trait Peer: Send + Sync + fmt::Debug {
    fn id(&self) -> PeerId;

    /// Queues one self-contained text frame.
    fn send(&self, message: String) -> Result<(), PeerError>;

    /// Asks the transport to close the connection after pending frames.
    fn close(&self);
}
