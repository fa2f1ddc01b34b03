//! Game rooms: one authoritative game state shared by at most two peers.
//!
//! A [`Room`] is never touched without holding its mutex (see
//! [`manager::SharedRoom`]), which makes validate-then-execute atomic with
//! respect to every other mutation of the same room.

pub mod manager;

pub use manager::{RegistryError, RoomManager, SharedRoom};

use crate::peer::{Peer, PeerId};
use crate::protocol::ServerMessage;
use std::sync::Arc;
use tracing::{debug, error, warn};
use uttt_rules::{GameState, MoveOutcome, MoveRejection, Symbol};

/// Seats per room.
pub const MAX_CLIENTS: usize = 2;

/// A connected peer and the symbol it plays for the room's lifetime.
#[derive(Debug)]
struct Seat {
    peer: Arc<dyn Peer>,
    symbol: Symbol,
}

/// An isolated two-player session.
///
/// The seat list is the sole authority on which symbol a connection plays.
/// Peers are referenced, never owned: dropping or retiring a room does not
/// close anyone's connection.
#[derive(Debug)]
pub struct Room {
    room_id: String,
    game_state: GameState,
    seats: Vec<Seat>,
    retired: bool,
}

impl Room {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            game_state: GameState::new(),
            seats: Vec::with_capacity(MAX_CLIENTS),
            retired: false,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn game_state(&self) -> &GameState {
        &self.game_state
    }

    pub fn client_count(&self) -> usize {
        self.seats.len()
    }

    pub fn is_full(&self) -> bool {
        self.seats.len() >= MAX_CLIENTS
    }

    pub fn symbol_of(&self, peer: PeerId) -> Option<Symbol> {
        self.seats
            .iter()
            .find(|seat| seat.peer.id() == peer)
            .map(|seat| seat.symbol)
    }

    /// Seats `peer` and returns its symbol, or `None` if the room is full.
    ///
    /// The first peer gets X; later peers get whichever symbol is free.
    /// Seating a peer that already holds a seat returns its existing symbol.
    pub fn add_client(&mut self, peer: Arc<dyn Peer>) -> Option<Symbol> {
        if let Some(symbol) = self.symbol_of(peer.id()) {
            return Some(symbol);
        }
        if self.is_full() {
            return None;
        }

        let symbol = match self.seats.first() {
            None => Symbol::X,
            Some(seat) => seat.symbol.opponent(),
        };
        self.seats.push(Seat { peer, symbol });
        Some(symbol)
    }

    /// Drops the peer's seat. Returns false if it held none.
    ///
    /// Falling below two occupants discards the game in progress.
    pub fn remove_client(&mut self, peer: PeerId) -> bool {
        let before = self.seats.len();
        self.seats.retain(|seat| seat.peer.id() != peer);
        let removed = self.seats.len() != before;

        if removed && self.seats.len() < MAX_CLIENTS {
            self.reset();
        }
        removed
    }

    /// Replaces the game with a fresh one.
    pub fn reset(&mut self) {
        debug!("Room {} game state reset", self.room_id);
        self.game_state = GameState::new();
    }

    /// Checks that `peer` may make this move right now.
    ///
    /// The acting symbol is the one seated for the connection. A `claimed`
    /// symbol from the payload must agree with it, and it must be that
    /// symbol's turn.
    pub fn validate_move(
        &self,
        peer: PeerId,
        board_id: usize,
        square_id: usize,
        claimed: Option<Symbol>,
    ) -> Result<Symbol, MoveRejection> {
        let seated = self.symbol_of(peer).ok_or(MoveRejection::NotSeated)?;
        if let Some(claimed) = claimed {
            if claimed != seated {
                return Err(MoveRejection::SymbolMismatch { seated, claimed });
            }
        }
        if self.game_state.is_terminal() {
            return Err(MoveRejection::GameOver);
        }
        let current = self.game_state.current_symbol();
        if seated != current {
            return Err(MoveRejection::NotYourTurn { seated, current });
        }
        self.game_state.validate_move(board_id, square_id)?;
        Ok(seated)
    }

    pub fn is_valid_move(&self, peer: PeerId, board_id: usize, square_id: usize, symbol: Symbol) -> bool {
        self.validate_move(peer, board_id, square_id, Some(symbol)).is_ok()
    }

    /// Applies a move already cleared by [`Room::validate_move`].
    ///
    /// Game rules are still enforced by the state itself, so a terminal game
    /// rejects the move without mutating.
    pub fn execute_move(
        &mut self,
        board_id: usize,
        square_id: usize,
        symbol: Symbol,
    ) -> Result<MoveOutcome, MoveRejection> {
        self.game_state.apply_move(board_id, square_id, symbol)
    }

    pub fn broadcast_game_state(&self) {
        self.broadcast(&ServerMessage::GameStateUpdate(&self.game_state));
    }

    pub fn broadcast_player_count(&self) {
        self.broadcast(&ServerMessage::PlayersConnected(self.client_count()));
    }

    /// Sends one frame to every seated peer. A failed send is logged and
    /// does not stop delivery to the others.
    pub fn broadcast(&self, message: &ServerMessage<'_>) {
        let text = match message.to_text() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize broadcast for room {}: {}", self.room_id, e);
                return;
            }
        };
        for seat in &self.seats {
            if let Err(e) = seat.peer.send(text.clone()) {
                warn!("Broadcast in room {} skipped a peer: {}", self.room_id, e);
            }
        }
    }

    /// Marks the room as unregistered. Joins that still hold a handle to a
    /// retired room must look it up again.
    pub(crate) fn retire(&mut self) {
        self.retired = true;
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }
}
