//! WebSocket connections.
//!
//! Each accepted socket becomes a [`WsPeer`]: a handle that queues outbound
//! frames on a bounded channel drained by a dedicated writer task. Sending
//! never waits. A peer whose queue is full is treated as gone: the send
//! fails and the connection task is told to drop the socket.

pub mod manager;

pub use manager::{handle_connection, ConnectionManager};

use crate::peer::{Peer, PeerError, PeerId};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;
use tracing::warn;

/// Frames a client may fall behind by before it is disconnected.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct WsPeer {
    id: PeerId,
    remote_addr: SocketAddr,
    outbound: mpsc::Sender<Message>,
    /// Flips to `true` when the outbound queue overflows
    overflow: Arc<watch::Sender<bool>>,
}

impl WsPeer {
    /// Creates the peer handle and the receiving end its writer task drains.
    pub fn new(remote_addr: SocketAddr) -> (Self, mpsc::Receiver<Message>) {
        Self::with_capacity(remote_addr, OUTBOUND_QUEUE_CAPACITY)
    }

    /// Same as [`WsPeer::new`] with an explicit queue bound.
    ///
    /// # Arguments
    ///
    /// * `remote_addr` - Address of the connected client
    /// * `capacity` - Frames that may wait for the writer before the peer
    ///   counts as disconnected
    pub fn with_capacity(remote_addr: SocketAddr, capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (outbound, receiver) = mpsc::channel(capacity);
        let peer = Self {
            id: PeerId::new(),
            remote_addr,
            outbound,
            overflow: Arc::new(watch::channel(false).0),
        };
        (peer, receiver)
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Watches for this peer's queue overflowing.
    pub fn overflow_signal(&self) -> watch::Receiver<bool> {
        self.overflow.subscribe()
    }

    fn enqueue(&self, message: Message) -> Result<(), PeerError> {
        match self.outbound.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                warn!("Outbound queue of peer {} is full, disconnecting", self.id);
                self.overflow.send_replace(true);
                Err(PeerError::Disconnected(self.id))
            }
            Err(TrySendError::Closed(_)) => Err(PeerError::Disconnected(self.id)),
        }
    }
}

impl Peer for WsPeer {
    fn id(&self) -> PeerId {
        self.id
    }

    fn send(&self, message: String) -> Result<(), PeerError> {
        self.enqueue(Message::Text(message.into()))
    }

    fn close(&self) {
        // The writer stops after forwarding the close frame.
        let _ = self.enqueue(Message::Close(None));
    }
}
