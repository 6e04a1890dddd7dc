//! Game rules for N×N tic-tac-toe.
//!
//! This module contains pure functions for evaluating game state
//! according to tic-tac-toe rules. Rules are separated from board
//! storage so the search and the session can share them.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full, outcome};
pub use win::{Line, check_winner};
