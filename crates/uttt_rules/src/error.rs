//! Reasons a move can be refused.

use crate::types::Symbol;
use thiserror::Error;

/// Why a move was rejected. The display text is what the mover is told.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveRejection {
    #[error("Game is already over")]
    GameOver,

    #[error("Board {0} does not exist")]
    BoardOutOfRange(usize),

    #[error("Square {0} does not exist")]
    SquareOutOfRange(usize),

    #[error("Must play in board {expected}, not board {requested}")]
    WrongBoard { expected: usize, requested: usize },

    #[error("Board {0} is already decided")]
    BoardClosed(usize),

    #[error("Square {square} of board {board} is already taken")]
    SquareTaken { board: usize, square: usize },

    #[error("Not seated in this room")]
    NotSeated,

    #[error("Seated as {seated}, cannot play as {claimed}")]
    SymbolMismatch { seated: Symbol, claimed: Symbol },

    #[error("Not your turn: {current} is to move, you are {seated}")]
    NotYourTurn { seated: Symbol, current: Symbol },
}
