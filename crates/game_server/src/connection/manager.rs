//! Connection tracking and the per-connection read/write loops.

use super::WsPeer;
use crate::error::ServerError;
use crate::peer::{Peer, PeerId};
use crate::protocol::{send_message, ProtocolHandler, ServerMessage};
use dashmap::DashMap;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};
use tracing::{debug, info, warn};

/// Type alias for the outgoing half of a WebSocket
type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Tracks every open connection so the server can count and close them.
///
/// Capacity is reserved with a single atomic step before a peer is stored,
/// so concurrent accepts can never push the count past `max_connections`.
#[derive(Debug)]
pub struct ConnectionManager {
    connections: DashMap<PeerId, Arc<dyn Peer>>,
    /// Slots currently held, always equal to or ahead of `connections.len()`
    reserved: AtomicUsize,
    max_connections: usize,
}

impl ConnectionManager {
    pub fn new(max_connections: usize) -> Self {
        Self {
            connections: DashMap::new(),
            reserved: AtomicUsize::new(0),
            max_connections,
        }
    }

    /// Starts tracking `peer`, refusing it once the limit is reached.
    ///
    /// # Arguments
    ///
    /// * `peer` - The freshly handshaken connection
    ///
    /// # Returns
    ///
    /// `Ok(())` if a slot was free, or `ServerError::Network` when the server
    /// is already at `max_connections`. Registering a peer twice keeps one slot.
    pub fn register(&self, peer: Arc<dyn Peer>) -> Result<(), ServerError> {
        let max = self.max_connections;
        self.reserved
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                (held < max).then_some(held + 1)
            })
            .map_err(|_| ServerError::Network(format!("Connection limit of {max} reached")))?;

        if self.connections.insert(peer.id(), peer).is_some() {
            self.reserved.fetch_sub(1, Ordering::AcqRel);
        }
        Ok(())
    }

    pub fn unregister(&self, peer: PeerId) -> bool {
        let removed = self.connections.remove(&peer).is_some();
        if removed {
            self.reserved.fetch_sub(1, Ordering::AcqRel);
        }
        removed
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Asks every tracked connection to close. Returns how many were asked.
    pub fn shutdown_all(&self) -> usize {
        let mut closed = 0;
        for entry in self.connections.iter() {
            entry.value().close();
            closed += 1;
        }
        closed
    }
}

/// Drives one client from handshake to disconnect.
///
/// Inbound text frames go to the protocol handler in arrival order. The
/// handler's disconnect hook runs exactly once, when the read side ends.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    connections: Arc<ConnectionManager>,
    handler: Arc<ProtocolHandler>,
) -> Result<(), ServerError> {
    let ws_stream = accept_async(stream)
        .await
        .map_err(|e| ServerError::Network(format!("WebSocket handshake failed for {addr}: {e}")))?;

    let (ws_sink, mut ws_receiver) = ws_stream.split();
    let (ws_peer, outbound) = WsPeer::new(addr);
    let mut overflow = ws_peer.overflow_signal();
    let peer: Arc<dyn Peer> = Arc::new(ws_peer);
    let peer_id = peer.id();

    let mut writer = tokio::spawn(write_loop(ws_sink, outbound));

    if let Err(e) = connections.register(peer.clone()) {
        warn!("🚫 Refusing connection from {}: {}", addr, e);
        send_message(peer.as_ref(), &ServerMessage::Error("Server is full"));
        peer.close();
        return Ok(());
    }
    info!("🔗 Connection {} established from {}", peer_id, addr);
    handler.on_connect(&peer);

    let mut transport_error = None;
    loop {
        tokio::select! {
            frame = ws_receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => handler.on_message(&peer, text.as_str()),
                Some(Ok(Message::Binary(_))) => {
                    warn!("Binary frame from {} ignored", peer_id);
                    send_message(peer.as_ref(), &ServerMessage::Error("Only text frames are supported"));
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Ping/pong is answered by tungstenite itself.
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    transport_error = Some(e.to_string());
                    break;
                }
            },
            _ = &mut writer => {
                debug!("Writer for {} finished", peer_id);
                break;
            }
            _ = overflow.wait_for(|full| *full) => {
                // The client stopped reading; pending frames are discarded.
                writer.abort();
                break;
            }
        }
    }

    match transport_error {
        Some(reason) => handler.on_error(&peer, &reason),
        None => handler.on_disconnect(&peer),
    }
    connections.unregister(peer_id);
    info!("🔌 Connection {} from {} closed", peer_id, addr);
    Ok(())
}

/// Forwards queued frames to the socket until the queue closes or a close
/// frame has been written.
async fn write_loop(mut sink: WsSink, mut outbound: mpsc::Receiver<Message>) {
    while let Some(message) = outbound.recv().await {
        let closing = matches!(message, Message::Close(_));
        if let Err(e) = sink.send(message).await {
            debug!("Dropping outbound frames: {}", e);
            return;
        }
        if closing {
            return;
        }
    }
    let _ = sink.close().await;
}
