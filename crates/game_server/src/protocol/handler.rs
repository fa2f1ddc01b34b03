//! Translates transport events into room operations.
//!
//! The handler is the composition point of the server: it parses inbound
//! frames, resolves the sender's room through its own peer → room map, runs
//! the room operation under the room lock and queues the replies. Every
//! failure is scoped to the offending peer or room; nothing here can take the
//! process down.

use super::messages::{ClientMessage, MakeMovePayload, ServerMessage};
use super::send_message;
use crate::peer::{Peer, PeerId};
use crate::room::{RegistryError, RoomManager, SharedRoom};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uttt_rules::GameStatus;

pub struct ProtocolHandler {
    rooms: Arc<RoomManager>,
    /// Which room each seated peer belongs to. Set on join, cleared on disconnect.
    associations: DashMap<PeerId, String>,
}

impl ProtocolHandler {
    pub fn new(rooms: Arc<RoomManager>) -> Self {
        Self {
            rooms,
            associations: DashMap::new(),
        }
    }

    pub fn room_manager(&self) -> &Arc<RoomManager> {
        &self.rooms
    }

    /// Room the peer is currently seated in.
    pub fn association(&self, peer: PeerId) -> Option<String> {
        self.associations.get(&peer).map(|entry| entry.value().clone())
    }

    /// Nothing happens until the peer asks to join a room.
    pub fn on_connect(&self, peer: &Arc<dyn Peer>) {
        info!("👋 Peer {} connected", peer.id());
    }

    pub fn on_message(&self, peer: &Arc<dyn Peer>, text: &str) {
        match ClientMessage::parse(text) {
            Ok(ClientMessage::JoinRoom(payload)) => self.handle_join_room(peer, &payload.room_id),
            Ok(ClientMessage::MakeMove(payload)) => self.handle_make_move(peer.as_ref(), payload),
            Err(e) => {
                warn!("⚠️ Bad message from peer {}: {}", peer.id(), e);
                send_message(peer.as_ref(), &ServerMessage::Error(&e.to_string()));
            }
        }
    }

    pub fn on_disconnect(&self, peer: &Arc<dyn Peer>) {
        info!("👋 Peer {} disconnected", peer.id());
        self.release_peer(peer.id());
    }

    pub fn on_error(&self, peer: &Arc<dyn Peer>, reason: &str) {
        error!("Transport error for peer {}: {}", peer.id(), reason);
        self.release_peer(peer.id());
    }

    fn handle_join_room(&self, peer: &Arc<dyn Peer>, room_id: &str) {
        let peer_id = peer.id();
        if let Some(current) = self.association(peer_id) {
            warn!("⚠️ Peer {} tried to join {} while seated in {}", peer_id, room_id, current);
            send_message(
                peer.as_ref(),
                &ServerMessage::Error(&format!("Already joined room {current}")),
            );
            return;
        }

        loop {
            let shared = match self.lookup_or_create(room_id) {
                Ok(shared) => shared,
                Err(e) => {
                    warn!("⚠️ Join from peer {} refused: {}", peer_id, e);
                    send_message(peer.as_ref(), &ServerMessage::Error(&e.to_string()));
                    return;
                }
            };

            let mut room = shared.lock();
            if room.is_retired() {
                debug!("Room {} was removed during join, retrying", room_id);
                continue;
            }

            let Some(symbol) = room.add_client(peer.clone()) else {
                info!("🚫 Room {} is full, turning away peer {}", room_id, peer_id);
                send_message(peer.as_ref(), &ServerMessage::GameFull("Room is full"));
                peer.close();
                return;
            };

            self.associations.insert(peer_id, room_id.to_string());
            send_message(
                peer.as_ref(),
                &ServerMessage::PlayerAssigned {
                    symbol,
                    game_state: room.game_state(),
                },
            );
            room.broadcast_player_count();
            info!(
                "🎮 Peer {} joined room {} as {} ({} player(s))",
                peer_id,
                room_id,
                symbol,
                room.client_count()
            );
            return;
        }
    }

    /// "Not found" on join means "create it"; losing a creation race means
    /// someone else just created it.
    fn lookup_or_create(&self, room_id: &str) -> Result<SharedRoom, RegistryError> {
        loop {
            match self.rooms.get_room(room_id) {
                Ok(room) => return Ok(room),
                Err(RegistryError::RoomNotFound(_)) => {}
                Err(e) => return Err(e),
            }
            match self.rooms.create_room(room_id) {
                Err(RegistryError::RoomExists(_)) => continue,
                result => return result,
            }
        }
    }

    fn handle_make_move(&self, peer: &dyn Peer, payload: MakeMovePayload) {
        let peer_id = peer.id();
        let Some(room_id) = self.association(peer_id) else {
            warn!("⚠️ Move from peer {} without a room", peer_id);
            send_message(peer, &ServerMessage::Error("Join a room before making moves"));
            return;
        };

        let shared = match self.rooms.get_room(&room_id) {
            Ok(shared) => shared,
            Err(e) => {
                warn!("⚠️ Move from peer {} dropped: {}", peer_id, e);
                return;
            }
        };

        let mut room = shared.lock();
        let MakeMovePayload {
            board_id,
            square_id,
            player,
        } = payload;

        let symbol = match room.validate_move(peer_id, board_id, square_id, player) {
            Ok(symbol) => symbol,
            Err(rejection) => {
                debug!(
                    "Invalid move in room {} by peer {}: board {} square {}: {}",
                    room_id, peer_id, board_id, square_id, rejection
                );
                send_message(peer, &ServerMessage::InvalidMove(&rejection.to_string()));
                return;
            }
        };

        match room.execute_move(board_id, square_id, symbol) {
            Ok(outcome) => {
                debug!(
                    "Move executed in room {}: {} on board {} square {} ({:?})",
                    room_id, symbol, board_id, square_id, outcome.sub_board
                );
                match outcome.status {
                    GameStatus::Won(winner) => info!("🏆 Room {} won by {}", room_id, winner),
                    GameStatus::Drawn => info!("🤝 Room {} ended in a draw", room_id),
                    GameStatus::InProgress => {}
                }
                room.broadcast_game_state();
            }
            Err(rejection) => {
                send_message(peer, &ServerMessage::InvalidMove(&rejection.to_string()));
            }
        }
    }

    /// Frees the peer's seat. Safe to call more than once per peer.
    fn release_peer(&self, peer_id: PeerId) {
        if let Some((_, room_id)) = self.associations.remove(&peer_id) {
            match self.rooms.get_room(&room_id) {
                Ok(shared) => {
                    let remaining = {
                        let mut room = shared.lock();
                        room.remove_client(peer_id);
                        let remaining = room.client_count();
                        if remaining > 0 {
                            room.broadcast_player_count();
                            room.broadcast_game_state();
                        }
                        remaining
                    };
                    info!(
                        "🚪 Peer {} left room {} ({} player(s) remaining)",
                        peer_id, room_id, remaining
                    );
                    if remaining == 0 {
                        self.rooms.remove_room_if_empty(&room_id);
                    }
                }
                Err(e) => warn!("⚠️ Could not release peer {}: {}", peer_id, e),
            }
        }

        let swept = self.rooms.clean_empty_rooms();
        if swept > 0 {
            debug!("🧹 Swept {} empty room(s)", swept);
        }
    }
}
