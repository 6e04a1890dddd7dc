//! Win detection logic, generalized to any board size.

use super::super::{Board, Mark, Square};

/// A winning line. Only these four families count; broken diagonals do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Line {
    /// A full row.
    Row(usize),
    /// A full column.
    Column(usize),
    /// Top-left to bottom-right.
    Diagonal,
    /// Top-right to bottom-left.
    AntiDiagonal,
}

impl Line {
    /// Every line of a board, rows first, then columns, then both diagonals.
    ///
    /// [`check_winner`] reports the first uniform line in this order.
    pub fn all(size: usize) -> impl Iterator<Item = Line> {
        (0..size)
            .map(Line::Row)
            .chain((0..size).map(Line::Column))
            .chain([Line::Diagonal, Line::AntiDiagonal])
    }

    /// Only the rows of a board.
    pub fn rows(size: usize) -> impl Iterator<Item = Line> {
        (0..size).map(Line::Row)
    }

    /// Row-major square indices along the line.
    pub fn indices(self, size: usize) -> impl Iterator<Item = usize> {
        (0..size).map(move |i| match self {
            Line::Row(r) => r * size + i,
            Line::Column(c) => i * size + c,
            Line::Diagonal => i * size + i,
            Line::AntiDiagonal => i * size + (size - 1 - i),
        })
    }

    /// Counts of X and O marks along the line.
    pub fn tally(self, board: &Board) -> (usize, usize) {
        let squares = board.squares();
        self.indices(board.size())
            .fold((0, 0), |(x, o), index| match squares[index] {
                Square::Occupied(Mark::X) => (x + 1, o),
                Square::Occupied(Mark::O) => (x, o + 1),
                Square::Empty => (x, o),
            })
    }

    /// The mark filling the whole line, if one does.
    pub fn owner(self, board: &Board) -> Option<Mark> {
        let squares = board.squares();
        let mut indices = self.indices(board.size());
        let first = squares[indices.next()?].mark()?;
        indices
            .all(|index| squares[index] == Square::Occupied(first))
            .then_some(first)
    }
}

/// Checks if there is a winner on the board.
///
/// Returns `Some(mark)` if a row, column or either main diagonal is uniformly
/// that mark, `None` otherwise.
pub fn check_winner(board: &Board) -> Option<Mark> {
    Line::all(board.size()).find_map(|line| line.owner(board))
}
