//! Win and draw evaluation over a 3×3 grid of marks.
//!
//! The same two checks run at both levels of the game: a sub-board feeds in
//! its square owners, the meta-board feeds in the winner of each sub-board
//! (an undecided or drawn sub-board counts as an empty cell).

use crate::types::{Symbol, BOARD_CELLS};

/// Rows, columns and both diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Returns the symbol owning the first complete line, if any.
pub fn winning_symbol(marks: &[Option<Symbol>; BOARD_CELLS]) -> Option<Symbol> {
    WINNING_LINES.iter().find_map(|&[a, b, c]| match (marks[a], marks[b], marks[c]) {
        (Some(x), Some(y), Some(z)) if x == y && y == z => Some(x),
        _ => None,
    })
}

/// True iff some winning line is fully owned by a single symbol.
pub fn check_winner(marks: &[Option<Symbol>; BOARD_CELLS]) -> bool {
    winning_symbol(marks).is_some()
}

/// True iff every cell is owned.
///
/// Does not look at lines: callers must check for a winner first, since a
/// full grid with a winning line is a win rather than a draw.
pub fn check_draw(marks: &[Option<Symbol>; BOARD_CELLS]) -> bool {
    marks.iter().all(Option::is_some)
}
