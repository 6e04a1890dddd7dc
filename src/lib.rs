//! Gridtac library - N×N tic-tac-toe against a minimax opponent
//!
//! Game rules and the search live in the `gridtac_engine` crate. This crate
//! adds what turns them into a service.
//!
//! # Architecture
//!
//! - **Session**: turn controller keyed by game id, one lock per game
//! - **Db**: [`GameStore`] trait with SQLite and in-memory implementations
//! - **Server**: axum REST routes for moves, history and replay
//! - **Config**: TOML settings for the opponent and the store
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use gridtac::{InMemoryStore, Mark, MoveRequest, PlaySettings, SessionManager};
//!
//! let manager = SessionManager::new(Arc::new(InMemoryStore::new()), PlaySettings::default());
//! let outcome = manager
//!     .submit_move(MoveRequest {
//!         game_id: None,
//!         size: Some(3),
//!         row: 1,
//!         col: 1,
//!         player: Mark::X,
//!         computer_enabled: true,
//!     })
//!     .unwrap();
//! assert!(outcome.computer_move.is_some());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
mod config;
mod db;
mod server;
mod session;

pub use config::{ConfigError, DATABASE_URL_ENV, GridtacConfig};
pub use db::{
    DbError, GameId, GameRecord, GameRepository, GameStore, HistorySummary, InMemoryStore,
    MIGRATIONS,
};
pub use server::{ErrorBody, ReplayQuery, ResetRequest, router};
pub use session::{
    BoardView, COMPUTER, GameError, GameSession, Grid, HUMAN, History, MoveOutcome, MoveRequest,
    PlaySettings, Replay, SessionManager,
};

pub use gridtac_engine::{Heuristic, Mark, Minimax, Move, Outcome, Position};
