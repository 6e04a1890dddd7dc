//! Persistence boundary consumed by the session manager.

use gridtac_engine::{Move, Outcome};

use crate::db::{DbError, GameId, GameRecord};

/// Durable storage for games and their moves.
///
/// Calls are blocking. Implementations must be shareable across threads since
/// one store serves every session.
pub trait GameStore: Send + Sync + std::fmt::Debug {
    /// Allocates an identifier for a new game of the given size.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be written.
    fn create_game(&self, size: usize) -> Result<GameId, DbError>;

    /// Number of moves stored for `game_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be read.
    fn count_moves(&self, game_id: GameId) -> Result<u32, DbError>;

    /// Appends one move to the game's log.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be written or the sequence
    /// number is already taken.
    fn append_move(&self, game_id: GameId, mv: &Move) -> Result<(), DbError>;

    /// Records the finished game's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be written.
    fn set_winner(&self, game_id: GameId, outcome: Outcome) -> Result<(), DbError>;

    /// Loads a game and its ordered moves, `None` if no such game is stored.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be read.
    fn load_game(&self, game_id: GameId) -> Result<Option<GameRecord>, DbError>;

    /// Every stored game, newest first, each with its ordered moves.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be read.
    fn list_games(&self) -> Result<Vec<GameRecord>, DbError>;

    /// Deletes all moves, then all games.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the store cannot be written.
    fn clear_history(&self) -> Result<(), DbError>;
}
