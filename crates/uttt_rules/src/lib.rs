//! # Ultimate Tic-Tac-Toe rules
//!
//! Pure game logic with no I/O: the shared board types, the win/draw rules
//! engine used at both board levels, and the authoritative [`GameState`]
//! machine that applies moves and recomputes every derived field.
//!
//! ## Layers
//!
//! * [`rules`] - `check_winner` / `check_draw` over nine marks
//! * [`state`] - the full position, move validation and move application
//! * [`error`] - [`MoveRejection`], the reason a move was refused
//!
//! Presentation-only data (hovered squares, next-board previews) is not part
//! of the state. [`GameState::preview_next_boards`] derives the preview on
//! demand instead.

pub mod error;
pub mod rules;
pub mod state;
pub mod types;

pub use error::MoveRejection;
pub use rules::{check_draw, check_winner, winning_symbol, WINNING_LINES};
pub use state::{GameState, GameStatus, MoveOutcome, SubBoardResult};
pub use types::{Player, Square, SubBoard, Symbol, BOARD_CELLS};
