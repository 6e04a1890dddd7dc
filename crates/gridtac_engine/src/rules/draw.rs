//! Draw detection logic.

use super::super::{Board, Outcome, Square};
use super::win::check_winner;
use tracing::instrument;

/// Checks if the board is full (all squares occupied).
pub fn is_full(board: &Board) -> bool {
    board.squares().iter().all(|s| *s != Square::Empty)
}

/// A full board with no winner.
#[instrument(skip(board), fields(size = board.size()))]
pub fn is_draw(board: &Board) -> bool {
    is_full(board) && check_winner(board).is_none()
}

/// Terminal outcome of the board, `None` while play can continue.
pub fn outcome(board: &Board) -> Option<Outcome> {
    if let Some(winner) = check_winner(board) {
        return Some(Outcome::Winner(winner));
    }
    if is_full(board) {
        return Some(Outcome::Draw);
    }
    None
}
