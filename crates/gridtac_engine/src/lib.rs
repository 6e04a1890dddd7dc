//! N×N tic-tac-toe rules and a minimax opponent.
//!
//! The board, win and draw detection, the static evaluator and the alpha-beta
//! search are pure and synchronous. [`Game`] ties them into a per-game state
//! machine that numbers moves and records the outcome.
//!
//! # Example
//!
//! ```
//! use gridtac_engine::{Game, Mark, Minimax, Position};
//!
//! let mut game = Game::start(3).unwrap();
//! game.play(Position::new(1, 1), Mark::X).unwrap();
//! let reply = Minimax::default().find_best_move(game.board()).unwrap();
//! game.play(reply, Mark::O).unwrap();
//! assert_eq!(game.history().len(), 2);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
mod evaluation;
mod game;
mod phases;
pub mod rules;
mod search;
mod types;

pub use action::{EngineError, Move};
pub use evaluation::{Heuristic, NEAR_WIN_BONUS};
pub use game::{FIRST_PLAYER, Game};
pub use phases::{Outcome, Phase};
pub use rules::{Line, check_winner, is_draw, is_full, outcome};
pub use search::{DEFAULT_MAX_DEPTH, Minimax, SearchReport, WIN_SCORE};
pub use types::{Board, MIN_SIZE, Mark, Position, Square};
