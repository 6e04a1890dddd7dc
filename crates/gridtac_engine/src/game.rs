//! Per-game state machine: board, turn, move log and outcome.
//!
//! A [`Game`] accepts moves while it is [`Phase::AwaitingMove`]. Each accepted
//! move is numbered, flips the turn and is followed by a terminal check; once
//! an outcome is recorded the game is [`Phase::Finished`] for good.

use crate::action::{EngineError, Move};
use crate::phases::{Outcome, Phase};
use crate::rules;
use crate::{Board, Mark, Position};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// The mark that opens every game.
pub const FIRST_PLAYER: Mark = Mark::X;

/// Authoritative state of one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    to_move: Mark,
    outcome: Option<Outcome>,
    history: Vec<Move>,
}

impl Game {
    /// Starts a game on an empty `size`×`size` board with X to move.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSize`] if the board cannot be built.
    #[instrument]
    pub fn start(size: usize) -> Result<Self, EngineError> {
        Ok(Self {
            board: Board::new(size)?,
            to_move: FIRST_PLAYER,
            outcome: None,
            history: Vec::new(),
        })
    }

    /// Rebuilds a game by playing `moves` in order on an empty board.
    ///
    /// # Errors
    ///
    /// Fails on the first move the rules reject, or when sequence numbers do
    /// not run 1, 2, 3, …
    #[instrument(skip(moves), fields(moves = moves.len()))]
    pub fn replay(size: usize, moves: &[Move]) -> Result<Self, EngineError> {
        let mut game = Self::start(size)?;
        for mv in moves {
            game.apply(mv)?;
        }
        Ok(game)
    }

    /// Plays a recorded move, checking that it is the next in sequence.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OutOfSequence`] if `mv.sequence` is not
    /// [`Game::next_sequence`], otherwise whatever [`Game::play`] returns.
    pub fn apply(&mut self, mv: &Move) -> Result<(), EngineError> {
        let expected = self.next_sequence();
        if mv.sequence != expected {
            warn!(expected, found = mv.sequence, "Move log out of sequence");
            return Err(EngineError::OutOfSequence {
                expected,
                found: mv.sequence,
            });
        }
        self.play(mv.position, mv.player).map(|_| ())
    }

    /// Returns the board.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Edge length of the board.
    pub fn size(&self) -> usize {
        self.board.size()
    }

    /// Whose turn it is.
    pub fn to_move(&self) -> Mark {
        self.to_move
    }

    /// Recorded outcome, set at most once.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Moves played so far, in sequence order.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Sequence number the next accepted move will carry.
    pub fn next_sequence(&self) -> u32 {
        self.history.len() as u32 + 1
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        if self.outcome.is_some() {
            Phase::Finished
        } else {
            Phase::AwaitingMove
        }
    }

    /// Returns true once a winner or draw is recorded.
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Checks a candidate move without applying it.
    ///
    /// Checks run in order: finished game, bounds, occupancy, turn.
    ///
    /// # Errors
    ///
    /// Returns the first rule the move breaks.
    pub fn validate(&self, pos: Position, mover: Mark) -> Result<(), EngineError> {
        if self.is_finished() {
            return Err(EngineError::GameAlreadyFinished);
        }
        if !self.board.contains(pos) {
            return Err(EngineError::OutOfBounds {
                row: pos.row,
                col: pos.col,
                size: self.board.size(),
            });
        }
        if !self.board.is_empty(pos) {
            return Err(EngineError::CellOccupied(pos));
        }
        if mover != self.to_move {
            return Err(EngineError::WrongTurn(mover));
        }
        Ok(())
    }

    /// Plays `mover`'s mark at `pos`.
    ///
    /// On success the mark is placed, the turn flips, the move is appended to
    /// the history with the next sequence number and the terminal check runs.
    ///
    /// # Errors
    ///
    /// See [`Game::validate`]. A rejected move changes nothing.
    #[instrument(skip(self), fields(size = self.board.size()))]
    pub fn play(&mut self, pos: Position, mover: Mark) -> Result<Move, EngineError> {
        if let Err(e) = self.validate(pos, mover) {
            warn!(error = %e, "Move rejected");
            return Err(e);
        }

        self.board.place(pos, mover)?;
        self.to_move = mover.opponent();
        let mv = Move::new(mover, pos, self.next_sequence());
        self.history.push(mv);
        debug!(phase = ?Phase::MoveApplied, %mv, "Move applied");

        if let Some(outcome) = rules::outcome(&self.board) {
            info!(%outcome, moves = self.history.len(), "Game finished");
            self.outcome = Some(outcome);
        }

        Ok(mv)
    }
}
