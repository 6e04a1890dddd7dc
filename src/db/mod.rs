//! Persistence layer: games, their moves and the stores that hold them.

mod error;
mod memory;
mod models;
mod repository;
mod schema;
mod store;

pub use error::DbError;
pub use memory::InMemoryStore;
pub use models::{GameId, GameRecord, GameRow, HistorySummary, MoveRow, NewGame, NewMove};
pub use repository::{GameRepository, MIGRATIONS};
pub use store::GameStore;
