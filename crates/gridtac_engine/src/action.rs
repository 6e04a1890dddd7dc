//! First-class move and rejection types.
//!
//! Moves are domain events: they carry the sequence number that orders them
//! within a game, so a log of moves can be replayed to rebuild the board.

use super::{Mark, Position};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A mark placed at a position, numbered within its game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    /// The player making the move.
    pub player: Mark,
    /// Where the mark was placed.
    pub position: Position,
    /// One-based, strictly increasing per game.
    pub sequence: u32,
}

impl Move {
    /// Creates a new move.
    #[instrument]
    pub fn new(player: Mark, position: Position, sequence: u32) -> Self {
        Self {
            player,
            position,
            sequence,
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} -> {}", self.sequence, self.player, self.position)
    }
}

/// Why the engine refused a request.
///
/// Every variant leaves the board exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum EngineError {
    /// Board edge below the minimum.
    #[display("Board size {} is not supported", _0)]
    InvalidSize(usize),

    /// Coordinates fall outside the grid.
    #[display("Position ({row}, {col}) is outside the {size}x{size} board")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Edge length of the board.
        size: usize,
    },

    /// The target square already holds a mark.
    #[display("Square {} is already occupied", _0)]
    CellOccupied(Position),

    /// A winner or draw has already been recorded.
    #[display("Game is already finished")]
    GameAlreadyFinished,

    /// The mover is not the player whose turn it is.
    #[display("It's not {}'s turn", _0)]
    WrongTurn(Mark),

    /// A replayed move log skips or repeats a sequence number.
    #[display("Expected move #{expected}, found #{found}")]
    OutOfSequence {
        /// Sequence number the game expected next.
        expected: u32,
        /// Sequence number carried by the move.
        found: u32,
    },
}

impl std::error::Error for EngineError {}
