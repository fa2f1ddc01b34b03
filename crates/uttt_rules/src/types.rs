//! Board primitives shared by the rules engine and the game state.
//!
//! The serialized shape of these types is what clients render, so field
//! names follow the camelCase wire format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cells on any 3×3 board, and number of sub-boards on the meta-board.
pub const BOARD_CELLS: usize = 9;

// ============================================================================
// Symbols and players
// ============================================================================

/// One of the two marks a player can own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbol {
    X,
    O,
}

impl Symbol {
    /// Maps a turn index to its symbol: 0 is X, anything else is O.
    pub fn from_index(index: u8) -> Self {
        if index == 0 {
            Symbol::X
        } else {
            Symbol::O
        }
    }

    /// Inverse of [`Symbol::from_index`].
    pub fn index(self) -> u8 {
        match self {
            Symbol::X => 0,
            Symbol::O => 1,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Symbol::X => Symbol::O,
            Symbol::O => Symbol::X,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::X => write!(f, "X"),
            Symbol::O => write!(f, "O"),
        }
    }
}

/// Owner record attached to squares and won sub-boards.
///
/// Serialized as `{"symbol": "X"}` so clients can read `owner.symbol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub symbol: Symbol,
}

impl From<Symbol> for Player {
    fn from(symbol: Symbol) -> Self {
        Self { symbol }
    }
}

// ============================================================================
// Squares and sub-boards
// ============================================================================

/// A single cell of a sub-board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Square {
    /// Position 0-8 within the owning sub-board
    pub id: usize,
    /// Owning player, `None` while the square is empty
    pub owner: Option<Player>,
}

impl Square {
    pub fn empty(id: usize) -> Self {
        Self { id, owner: None }
    }

    pub fn is_empty(&self) -> bool {
        self.owner.is_none()
    }
}

/// One of the nine 3×3 boards composing the meta-board.
///
/// `winner` and `is_draw` are mutually exclusive; once either is set the
/// sub-board is terminal and accepts no further moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubBoard {
    /// Position 0-8 on the meta-board
    pub id: usize,
    pub squares: Vec<Square>,
    pub winner: Option<Player>,
    pub is_draw: bool,
}

impl SubBoard {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            squares: (0..BOARD_CELLS).map(Square::empty).collect(),
            winner: None,
            is_draw: false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.winner.is_some() || self.is_draw
    }

    /// Owner marks of the nine squares, in square order.
    pub fn marks(&self) -> [Option<Symbol>; BOARD_CELLS] {
        let mut marks = [None; BOARD_CELLS];
        for (mark, square) in marks.iter_mut().zip(&self.squares) {
            *mark = square.owner.map(|p| p.symbol);
        }
        marks
    }
}
