//! In-memory peer used by unit tests.

use crate::peer::{Peer, PeerError, PeerId};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Records every frame it is sent and whether it was closed.
#[derive(Debug, Default)]
pub struct RecordingPeer {
    id: PeerId,
    sent: Mutex<Vec<String>>,
    closed: AtomicBool,
}

impl RecordingPeer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Sent frames decoded as JSON, oldest first.
    pub fn messages(&self) -> Vec<Value> {
        self.sent
            .lock()
            .iter()
            .map(|text| serde_json::from_str(text).expect("frames are JSON"))
            .collect()
    }

    /// Sent frames of one `type`.
    pub fn messages_of(&self, kind: &str) -> Vec<Value> {
        self.messages()
            .into_iter()
            .filter(|m| m["type"] == kind)
            .collect()
    }

    pub fn last(&self) -> Option<Value> {
        self.messages().pop()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Peer for RecordingPeer {
    fn id(&self) -> PeerId {
        self.id
    }

    fn send(&self, message: String) -> Result<(), PeerError> {
        if self.is_closed() {
            return Err(PeerError::Disconnected(self.id));
        }
        self.sent.lock().push(message);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
