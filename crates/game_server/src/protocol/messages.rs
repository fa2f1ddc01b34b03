//! Wire messages exchanged with clients.
//!
//! Every frame in either direction is a JSON envelope `{type, payload}`.
//! Inbound frames are decoded in two steps so that an unknown `type` and a
//! payload that does not fit its `type` are reported separately.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uttt_rules::{GameState, Symbol};

/// Why an inbound frame could not be understood.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Invalid {kind} payload: {source}")]
    InvalidPayload {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw inbound envelope before the payload is interpreted.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomPayload {
    pub room_id: String,
}

/// A move request.
///
/// `player` is optional and never trusted: the server acts with the symbol
/// seated for the sending connection and only checks that a supplied value
/// agrees with it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MakeMovePayload {
    pub board_id: usize,
    pub square_id: usize,
    #[serde(default)]
    pub player: Option<Symbol>,
}

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    JoinRoom(JoinRoomPayload),
    MakeMove(MakeMovePayload),
}

impl ClientMessage {
    pub const JOIN_ROOM: &'static str = "JOIN_ROOM";
    pub const MAKE_MOVE: &'static str = "MAKE_MOVE";

    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;

        match envelope.kind.as_str() {
            Self::JOIN_ROOM => serde_json::from_value(envelope.payload)
                .map(ClientMessage::JoinRoom)
                .map_err(|source| ProtocolError::InvalidPayload {
                    kind: Self::JOIN_ROOM,
                    source,
                }),
            Self::MAKE_MOVE => serde_json::from_value(envelope.payload)
                .map(ClientMessage::MakeMove)
                .map_err(|source| ProtocolError::InvalidPayload {
                    kind: Self::MAKE_MOVE,
                    source,
                }),
            _ => Err(ProtocolError::UnknownType(envelope.kind)),
        }
    }
}

/// Outbound messages. Scalar payloads are bare values on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage<'a> {
    /// Sent once to a peer that was just seated
    PlayerAssigned {
        symbol: Symbol,
        #[serde(rename = "gameState")]
        game_state: &'a GameState,
    },
    /// Sent to a peer turned away from a full room, right before closing it
    GameFull(&'a str),
    /// Broadcast on every occupancy change
    PlayersConnected(usize),
    /// Broadcast after every accepted move and after a reset
    GameStateUpdate(&'a GameState),
    InvalidMove(&'a str),
    Error(&'a str),
}

impl ServerMessage<'_> {
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_parse_join_room() {
        let message = ClientMessage::parse(r#"{"type":"JOIN_ROOM","payload":{"roomId":"r1"}}"#).unwrap();
        assert_eq!(
            message,
            ClientMessage::JoinRoom(JoinRoomPayload {
                room_id: "r1".to_string()
            })
        );
    }

    #[test]
    fn test_parse_make_move_with_and_without_player() {
        let with_player = ClientMessage::parse(
            r#"{"type":"MAKE_MOVE","payload":{"boardId":4,"squareId":0,"player":"X"}}"#,
        )
        .unwrap();
        assert_eq!(
            with_player,
            ClientMessage::MakeMove(MakeMovePayload {
                board_id: 4,
                square_id: 0,
                player: Some(Symbol::X),
            })
        );

        let without_player =
            ClientMessage::parse(r#"{"type":"MAKE_MOVE","payload":{"boardId":1,"squareId":2}}"#).unwrap();
        assert!(matches!(
            without_player,
            ClientMessage::MakeMove(MakeMovePayload { player: None, .. })
        ));
    }

    #[test]
    fn test_parse_errors_are_classified() {
        assert!(matches!(ClientMessage::parse("not json"), Err(ProtocolError::Malformed(_))));
        assert!(matches!(
            ClientMessage::parse(r#"{"type":"CHAT","payload":"hi"}"#),
            Err(ProtocolError::UnknownType(kind)) if kind == "CHAT"
        ));
        assert!(matches!(
            ClientMessage::parse(r#"{"type":"MAKE_MOVE","payload":{"boardId":-1,"squareId":0}}"#),
            Err(ProtocolError::InvalidPayload { kind: "MAKE_MOVE", .. })
        ));
        assert!(matches!(
            ClientMessage::parse(r#"{"type":"JOIN_ROOM"}"#),
            Err(ProtocolError::InvalidPayload { kind: "JOIN_ROOM", .. })
        ));
    }

    #[test]
    fn test_outbound_envelopes() {
        let state = GameState::new();

        let assigned: Value = serde_json::from_str(
            &ServerMessage::PlayerAssigned {
                symbol: Symbol::O,
                game_state: &state,
            }
            .to_text()
            .unwrap(),
        )
        .unwrap();
        assert_eq!(assigned["type"], "PLAYER_ASSIGNED");
        assert_eq!(assigned["payload"]["symbol"], "O");
        assert_eq!(assigned["payload"]["gameState"]["currentPlayerIndex"], 0);

        let count: Value = serde_json::from_str(&ServerMessage::PlayersConnected(2).to_text().unwrap()).unwrap();
        assert_eq!(count, json!({"type": "PLAYERS_CONNECTED", "payload": 2}));

        let full: Value = serde_json::from_str(&ServerMessage::GameFull("Room is full").to_text().unwrap()).unwrap();
        assert_eq!(full, json!({"type": "GAME_FULL", "payload": "Room is full"}));

        let update: Value = serde_json::from_str(&ServerMessage::GameStateUpdate(&state).to_text().unwrap()).unwrap();
        assert_eq!(update["type"], "GAME_STATE_UPDATE");
        assert_eq!(update["payload"]["availableBoards"], json!([0, 1, 2, 3, 4, 5, 6, 7, 8]));
    }
}
