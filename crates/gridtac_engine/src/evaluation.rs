//! Static evaluation of boards the search cannot look past.
//!
//! Scores are from O's point of view: positive favors O (the maximizing
//! computer), negative favors X.

use crate::Board;
use crate::rules::Line;
use serde::{Deserialize, Serialize};

/// Score added per line that is one mark away from completion.
pub const NEAR_WIN_BONUS: i32 = 5;

/// Which lines the evaluator inspects.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Heuristic {
    /// Only rows are scored.
    #[default]
    Rows,
    /// Rows, columns and both diagonals are scored.
    AllLines,
}

impl Heuristic {
    /// Scores a non-terminal board.
    ///
    /// Each scored line holding exactly `n - 1` marks of one player and none of
    /// the other moves the score [`NEAR_WIN_BONUS`] toward that player.
    pub fn evaluate(self, board: &Board) -> i32 {
        let size = board.size();
        match self {
            Heuristic::Rows => score_lines(board, Line::rows(size)),
            Heuristic::AllLines => score_lines(board, Line::all(size)),
        }
    }
}

fn score_lines(board: &Board, lines: impl Iterator<Item = Line>) -> i32 {
    let near = board.size() - 1;
    lines
        .map(|line| match line.tally(board) {
            (x, 0) if x == near => -NEAR_WIN_BONUS,
            (0, o) if o == near => NEAR_WIN_BONUS,
            _ => 0,
        })
        .sum()
}
