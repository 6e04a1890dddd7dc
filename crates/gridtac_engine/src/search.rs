//! Depth-limited minimax with alpha-beta pruning.
//!
//! O is always the maximizing player and X the minimizing one. Wins are
//! scored `±(WIN_SCORE - depth)` so a win nearer the root outweighs a deeper
//! one; boards at the depth cutoff are scored by a [`Heuristic`].

use crate::evaluation::Heuristic;
use crate::rules::{check_winner, is_full};
use crate::{Board, Mark, Position, Square};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument};

/// Magnitude of a win found at the root.
pub const WIN_SCORE: i32 = 10;

/// Plies searched below each root candidate when not configured otherwise.
pub const DEFAULT_MAX_DEPTH: u32 = 3;

/// Result of one search invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchReport {
    /// Chosen move, `None` when the board has no empty square.
    pub best: Option<Position>,
    /// Minimax value of the chosen move.
    pub score: Option<i32>,
    /// Depth limit of the deepest iteration that ran to completion.
    pub depth: u32,
    /// Minimax nodes visited, all iterations included.
    pub nodes: u64,
}

/// Minimax opponent playing O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Minimax {
    max_depth: u32,
    heuristic: Heuristic,
}

impl Default for Minimax {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, Heuristic::default())
    }
}

impl Minimax {
    /// Creates a searcher with the given depth limit and cutoff heuristic.
    pub fn new(max_depth: u32, heuristic: Heuristic) -> Self {
        Self {
            max_depth,
            heuristic,
        }
    }

    /// Depth at which the heuristic replaces further search.
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Heuristic used at the depth cutoff.
    pub fn heuristic(&self) -> Heuristic {
        self.heuristic
    }

    /// Picks O's move on `board`.
    ///
    /// Empty squares are tried in row-major order and the first one reaching
    /// the strictly greatest score is kept. Returns `None` on a full board.
    pub fn find_best_move(&self, board: &Board) -> Option<Position> {
        self.search(board).best
    }

    /// Runs the search to completion at the configured depth.
    #[instrument(skip(self, board), fields(size = board.size(), max_depth = self.max_depth))]
    pub fn search(&self, board: &Board) -> SearchReport {
        let mut searcher = Searcher::new(board, self.heuristic);
        let (best, score) = searcher
            .root(self.max_depth, None)
            .unwrap_or((None, None));
        let report = SearchReport {
            best,
            score,
            depth: self.max_depth,
            nodes: searcher.nodes,
        };
        debug!(?report, "Search finished");
        report
    }

    /// Iteratively deepens from depth 0 until the configured depth or `deadline`.
    ///
    /// Returns the move of the deepest iteration that finished before the
    /// deadline. The depth-0 iteration always runs to completion.
    #[instrument(skip(self, board), fields(size = board.size(), max_depth = self.max_depth))]
    pub fn search_until(&self, board: &Board, deadline: Instant) -> SearchReport {
        let mut searcher = Searcher::new(board, self.heuristic);
        let mut report = SearchReport {
            best: None,
            score: None,
            depth: 0,
            nodes: 0,
        };

        for limit in 0..=self.max_depth {
            let cutoff = (limit > 0).then_some(deadline);
            match searcher.root(limit, cutoff) {
                Some((best, score)) => {
                    report.best = best;
                    report.score = score;
                    report.depth = limit;
                }
                None => {
                    debug!(limit, "Deadline reached, keeping shallower result");
                    break;
                }
            }
            if Instant::now() >= deadline {
                break;
            }
        }

        report.nodes = searcher.nodes;
        debug!(?report, "Timed search finished");
        report
    }
}

/// Scratch state for one search invocation.
///
/// Owns a private copy of the board; every placement is undone before the
/// next sibling is tried.
struct Searcher {
    board: Board,
    heuristic: Heuristic,
    nodes: u64,
}

impl Searcher {
    fn new(board: &Board, heuristic: Heuristic) -> Self {
        Self {
            board: board.clone(),
            heuristic,
            nodes: 0,
        }
    }

    /// One full pass over the root candidates. `None` if `deadline` passed mid-way.
    fn root(
        &mut self,
        max_depth: u32,
        deadline: Option<Instant>,
    ) -> Option<(Option<Position>, Option<i32>)> {
        let size = self.board.size();
        let candidates: Vec<usize> = self
            .board
            .empty_positions()
            .map(|pos| pos.to_index(size))
            .collect();

        let mut best: Option<(usize, i32)> = None;
        for index in candidates {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return None;
            }
            self.board.set_index(index, Square::Occupied(Mark::O));
            let score = self.minimax(0, max_depth, false, i32::MIN, i32::MAX);
            self.board.set_index(index, Square::Empty);

            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((index, score));
            }
        }

        Some(match best {
            Some((index, score)) => (Some(Position::from_index(index, size)), Some(score)),
            None => (None, None),
        })
    }

    fn minimax(
        &mut self,
        depth: u32,
        max_depth: u32,
        maximizing: bool,
        mut alpha: i32,
        mut beta: i32,
    ) -> i32 {
        self.nodes += 1;
        let depth_score = depth as i32;

        match check_winner(&self.board) {
            Some(Mark::X) => return -WIN_SCORE + depth_score,
            Some(Mark::O) => return WIN_SCORE - depth_score,
            None => {}
        }
        if is_full(&self.board) {
            return 0;
        }
        if depth >= max_depth {
            return self.heuristic.evaluate(&self.board);
        }

        let mover = if maximizing { Mark::O } else { Mark::X };
        let mut best = if maximizing { i32::MIN } else { i32::MAX };

        for index in 0..self.board.squares().len() {
            if self.board.squares()[index] != Square::Empty {
                continue;
            }
            self.board.set_index(index, Square::Occupied(mover));
            let score = self.minimax(depth + 1, max_depth, !maximizing, alpha, beta);
            self.board.set_index(index, Square::Empty);

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(score);
            } else {
                best = best.min(score);
                beta = beta.min(score);
            }
            if beta <= alpha {
                break;
            }
        }

        best
    }
}
