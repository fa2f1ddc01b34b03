//! The authoritative Ultimate Tic-Tac-Toe position and its only mutation.
//!
//! A [`GameState`] is created fresh, mutated exclusively through
//! [`GameState::apply_move`], and replaced wholesale when a room resets.
//! Every broadcast sends the full structure, never a diff.

use crate::error::MoveRejection;
use crate::rules::{check_draw, check_winner};
use crate::types::{Player, SubBoard, Symbol, BOARD_CELLS};
use serde::{Deserialize, Serialize};

/// Coarse lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Won(Symbol),
    Drawn,
}

/// What happened to the targeted sub-board as a result of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubBoardResult {
    Open,
    Won(Symbol),
    Drawn,
}

/// Summary of an applied move, mostly useful for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub sub_board: SubBoardResult,
    pub status: GameStatus,
}

/// Full game position.
///
/// The game is terminal iff `winner` is set or `is_draw` is true; a terminal
/// state rejects every further move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    /// 0 when X is to move, 1 when O is to move
    pub current_player_index: u8,
    pub winner: Option<Player>,
    pub is_draw: bool,
    /// Sub-board the next move is confined to; `None` means any available board
    pub active_board: Option<usize>,
    /// Sub-boards that are neither won nor drawn, in ascending order
    pub available_boards: Vec<usize>,
    pub board: Vec<SubBoard>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            current_player_index: 0,
            winner: None,
            is_draw: false,
            active_board: None,
            available_boards: (0..BOARD_CELLS).collect(),
            board: (0..BOARD_CELLS).map(SubBoard::new).collect(),
        }
    }

    pub fn status(&self) -> GameStatus {
        match (self.winner, self.is_draw) {
            (Some(player), _) => GameStatus::Won(player.symbol),
            (None, true) => GameStatus::Drawn,
            (None, false) => GameStatus::InProgress,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status() != GameStatus::InProgress
    }

    /// Symbol whose turn it is.
    pub fn current_symbol(&self) -> Symbol {
        Symbol::from_index(self.current_player_index)
    }

    /// Meta-board marks: the winner of each sub-board, empty otherwise.
    pub fn meta_marks(&self) -> [Option<Symbol>; BOARD_CELLS] {
        let mut marks = [None; BOARD_CELLS];
        for (mark, sub) in marks.iter_mut().zip(&self.board) {
            *mark = sub.winner.map(|p| p.symbol);
        }
        marks
    }

    /// Sub-boards the next move may target.
    pub fn legal_boards(&self) -> Vec<usize> {
        if self.is_terminal() {
            return Vec::new();
        }
        match self.active_board {
            Some(board_id) => vec![board_id],
            None => self.available_boards.clone(),
        }
    }

    /// Checks a move against the rules without touching the state.
    ///
    /// Turn ownership is not checked here; the room knows which symbol the
    /// mover is seated as.
    pub fn validate_move(&self, board_id: usize, square_id: usize) -> Result<(), MoveRejection> {
        if self.is_terminal() {
            return Err(MoveRejection::GameOver);
        }
        let sub = self
            .board
            .get(board_id)
            .ok_or(MoveRejection::BoardOutOfRange(board_id))?;
        let square = sub
            .squares
            .get(square_id)
            .ok_or(MoveRejection::SquareOutOfRange(square_id))?;

        if let Some(expected) = self.active_board {
            if expected != board_id {
                return Err(MoveRejection::WrongBoard {
                    expected,
                    requested: board_id,
                });
            }
        }
        if sub.is_terminal() {
            return Err(MoveRejection::BoardClosed(board_id));
        }
        if !square.is_empty() {
            return Err(MoveRejection::SquareTaken {
                board: board_id,
                square: square_id,
            });
        }
        Ok(())
    }

    pub fn is_legal_target(&self, board_id: usize, square_id: usize) -> bool {
        self.validate_move(board_id, square_id).is_ok()
    }

    /// Places `symbol` and recomputes every derived field.
    ///
    /// The rule checks of [`GameState::validate_move`] are re-run first, so a
    /// terminal or otherwise illegal target leaves the state untouched.
    pub fn apply_move(
        &mut self,
        board_id: usize,
        square_id: usize,
        symbol: Symbol,
    ) -> Result<MoveOutcome, MoveRejection> {
        self.validate_move(board_id, square_id)?;

        let sub = self
            .board
            .get_mut(board_id)
            .ok_or(MoveRejection::BoardOutOfRange(board_id))?;
        let square = sub
            .squares
            .get_mut(square_id)
            .ok_or(MoveRejection::SquareOutOfRange(square_id))?;
        square.owner = Some(symbol.into());

        let marks = sub.marks();
        let sub_board = if check_winner(&marks) {
            sub.winner = Some(symbol.into());
            SubBoardResult::Won(symbol)
        } else if check_draw(&marks) {
            sub.is_draw = true;
            SubBoardResult::Drawn
        } else {
            SubBoardResult::Open
        };

        if sub_board != SubBoardResult::Open {
            self.available_boards.retain(|&id| id != board_id);

            if check_winner(&self.meta_marks()) {
                self.winner = Some(symbol.into());
            } else if self.board.iter().all(SubBoard::is_terminal) {
                self.is_draw = true;
            }
        }

        if self.is_terminal() {
            self.active_board = None;
        } else if self.available_boards.contains(&square_id) {
            self.active_board = Some(square_id);
        } else {
            self.active_board = None;
        }

        self.current_player_index = (self.current_player_index + 1) % 2;

        Ok(MoveOutcome {
            sub_board,
            status: self.status(),
        })
    }

    /// Boards that would become active if `square_id` were played next.
    ///
    /// Derived hint for client-side previews; never part of the
    /// authoritative snapshot.
    pub fn preview_next_boards(&self, square_id: usize) -> Vec<usize> {
        if self.available_boards.contains(&square_id) {
            vec![square_id]
        } else {
            self.available_boards.clone()
        }
    }
}
