//! Core domain types for N×N tic-tac-toe.

use crate::action::EngineError;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Smallest board edge the rules accept.
pub const MIN_SIZE: usize = 3;

/// A player's mark.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum Mark {
    /// Player X (the human, moves first).
    X,
    /// Player O (the computer when computer play is enabled).
    O,
}

impl Mark {
    /// Returns the opposing mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

/// A square on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Square {
    /// Nobody has played here.
    Empty,
    /// Square holds a mark.
    Occupied(Mark),
}

impl Square {
    /// Returns the mark in this square, if any.
    pub fn mark(self) -> Option<Mark> {
        match self {
            Square::Empty => None,
            Square::Occupied(mark) => Some(mark),
        }
    }
}

/// A cell coordinate, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Row, counted from the top.
    pub row: usize,
    /// Column, counted from the left.
    pub col: usize,
}

impl Position {
    /// Creates a position.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Row-major index on a board of the given size.
    pub fn to_index(self, size: usize) -> usize {
        self.row * size + self.col
    }

    /// Position for a row-major index on a board of the given size.
    pub fn from_index(index: usize, size: usize) -> Self {
        Self {
            row: index / size,
            col: index % size,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Square N×N board, squares stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    size: usize,
    squares: Vec<Square>,
}

impl Board {
    /// Creates an empty board with `size` rows and columns.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSize`] if `size` is below [`MIN_SIZE`]
    /// or the square count overflows.
    #[instrument]
    pub fn new(size: usize) -> Result<Self, EngineError> {
        if size < MIN_SIZE {
            return Err(EngineError::InvalidSize(size));
        }
        let squares = size
            .checked_mul(size)
            .ok_or(EngineError::InvalidSize(size))?;
        Ok(Self {
            size,
            squares: vec![Square::Empty; squares],
        })
    }

    /// Edge length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if the position lies on the board.
    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    /// Gets the square at the given position, `None` when off the board.
    pub fn get(&self, pos: Position) -> Option<Square> {
        if !self.contains(pos) {
            return None;
        }
        self.squares.get(pos.to_index(self.size)).copied()
    }

    /// Checks if a square is on the board and empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        matches!(self.get(pos), Some(Square::Empty))
    }

    /// Places a mark on an empty square.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfBounds`] or [`EngineError::CellOccupied`]
    /// and leaves the board untouched.
    pub fn place(&mut self, pos: Position, mark: Mark) -> Result<(), EngineError> {
        match self.get(pos) {
            None => Err(EngineError::OutOfBounds {
                row: pos.row,
                col: pos.col,
                size: self.size,
            }),
            Some(Square::Occupied(_)) => Err(EngineError::CellOccupied(pos)),
            Some(Square::Empty) => {
                let index = pos.to_index(self.size);
                self.squares[index] = Square::Occupied(mark);
                Ok(())
            }
        }
    }

    /// Unchecked write used by the search for place/undo on known-empty squares.
    pub(crate) fn set_index(&mut self, index: usize, square: Square) {
        self.squares[index] = square;
    }

    /// Returns all squares as a row-major slice.
    pub fn squares(&self) -> &[Square] {
        &self.squares
    }

    /// Iterates over rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Square]> {
        self.squares.chunks(self.size)
    }

    /// Empty positions in row-major order.
    pub fn empty_positions(&self) -> impl Iterator<Item = Position> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter(|(_, square)| **square == Square::Empty)
            .map(|(index, _)| Position::from_index(index, self.size))
    }

    /// Number of squares holding `mark`.
    pub fn count(&self, mark: Mark) -> usize {
        self.squares
            .iter()
            .filter(|square| **square == Square::Occupied(mark))
            .count()
    }

    /// Rows of nullable marks, the shape callers exchange over the wire.
    pub fn to_grid(&self) -> Vec<Vec<Option<Mark>>> {
        self.rows()
            .map(|row| row.iter().map(|square| square.mark()).collect())
            .collect()
    }
}
