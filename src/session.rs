//! Game sessions and the turn controller that drives them.
//!
//! Sessions are keyed by the identifier the store allocates when the first
//! move of a game is accepted. Each session sits behind its own mutex, so
//! submissions to one game are applied one at a time while other games
//! proceed independently.

use derive_getters::Getters;
use derive_new::new;
use gridtac_engine::{EngineError, Game, Mark, Move, Outcome, Position};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::GridtacConfig;
use crate::db::{DbError, GameId, GameRecord, GameStore, HistorySummary};

/// Mark played by the person at the keyboard.
pub const HUMAN: Mark = Mark::X;

/// Mark played by the computer opponent.
pub const COMPUTER: Mark = Mark::O;

/// Board rows of nullable marks, as exchanged over the wire.
pub type Grid = Vec<Vec<Option<Mark>>>;

/// Why a session operation failed.
#[derive(Debug, derive_more::Display, derive_more::From)]
pub enum GameError {
    /// The engine refused the move. Nothing changed.
    #[display("{}", _0)]
    #[from]
    Rejected(EngineError),

    /// The identifier is neither live nor stored.
    #[display("Game {} not found", _0)]
    GameNotFound(GameId),

    /// A store call failed after retries. The in-memory game may be ahead
    /// of what was stored.
    #[display("Persistence unavailable: {}", _0)]
    #[from]
    PersistenceUnavailable(DbError),

    /// A stored move log does not replay under the rules.
    #[display("Stored game {} cannot be replayed: {}", game_id, reason)]
    CorruptHistory {
        /// Game whose log failed.
        game_id: GameId,
        /// Engine rejection that stopped the replay.
        reason: String,
    },

    /// A worker task failed before producing a result.
    #[display("Internal error: {}", _0)]
    Internal(String),
}

impl std::error::Error for GameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GameError::Rejected(e) => Some(e),
            GameError::PersistenceUnavailable(e) => Some(e),
            _ => None,
        }
    }
}

impl GameError {
    /// Stable name of the failure, reported to clients alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            GameError::Rejected(EngineError::InvalidSize(_)) => "InvalidSize",
            GameError::Rejected(EngineError::OutOfBounds { .. }) => "OutOfBounds",
            GameError::Rejected(EngineError::CellOccupied(_)) => "CellOccupied",
            GameError::Rejected(EngineError::GameAlreadyFinished) => "GameAlreadyFinished",
            GameError::Rejected(EngineError::WrongTurn(_)) => "WrongTurn",
            GameError::Rejected(EngineError::OutOfSequence { .. }) => "OutOfSequence",
            GameError::GameNotFound(_) => "GameNotFound",
            GameError::PersistenceUnavailable(_) => "PersistenceUnavailable",
            GameError::CorruptHistory { .. } => "CorruptHistory",
            GameError::Internal(_) => "Internal",
        }
    }

    fn corrupt(game_id: GameId, err: EngineError) -> Self {
        GameError::CorruptHistory {
            game_id,
            reason: err.to_string(),
        }
    }
}

/// Tunables for the controller, usually taken from [`GridtacConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, new)]
pub struct PlaySettings {
    opponent: gridtac_engine::Minimax,
    search_timeout: Option<Duration>,
    computer_delay: Duration,
    persistence_retries: u32,
    default_size: usize,
    max_size: usize,
}

impl Default for PlaySettings {
    fn default() -> Self {
        Self::from(&GridtacConfig::default())
    }
}

impl From<&GridtacConfig> for PlaySettings {
    fn from(config: &GridtacConfig) -> Self {
        Self {
            opponent: config.opponent(),
            search_timeout: config.search_timeout(),
            computer_delay: config.computer_delay(),
            persistence_retries: *config.persistence_retries(),
            default_size: *config.default_size(),
            max_size: *config.max_size(),
        }
    }
}

/// A live game and the identifier it is stored under.
#[derive(Debug, Clone, new)]
pub struct GameSession {
    /// Store identifier.
    pub id: GameId,
    /// Authoritative game state.
    pub game: Game,
    /// Applied moves the store has not accepted yet, oldest first.
    #[new(default)]
    unsaved: VecDeque<Move>,
    #[new(default)]
    outcome_saved: bool,
    /// An X move asked for a computer answer that has not been played.
    #[new(default)]
    reply_owed: bool,
}

impl GameSession {
    /// Returns true when the store holds every move and the outcome.
    pub fn is_saved(&self) -> bool {
        self.unsaved.is_empty() && (self.game.outcome().is_none() || self.outcome_saved)
    }
}

type SharedSession = Arc<Mutex<GameSession>>;

/// A move submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    /// Game to play in; a new game is started when absent.
    #[serde(default)]
    pub game_id: Option<GameId>,
    /// Board size for a new game; ignored for existing ones.
    #[serde(default)]
    pub size: Option<usize>,
    /// Target row.
    pub row: usize,
    /// Target column.
    pub col: usize,
    /// Who is moving.
    pub player: Mark,
    /// Whether the computer answers an X move.
    #[serde(default)]
    pub computer_enabled: bool,
}

/// An empty board and who moves first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    /// Board rows.
    pub board: Grid,
    /// Player to move.
    pub turn: Mark,
}

/// State after a submission, including any computer reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    /// Board rows.
    pub board: Grid,
    /// Player to move next.
    pub turn: Mark,
    /// `"X"`, `"O"`, `"Draw"` or null.
    pub winner: Option<Outcome>,
    /// Identifier of the game the move landed in.
    pub game_id: GameId,
    /// Square the computer answered with, if it moved.
    pub computer_move: Option<Position>,
}

impl MoveOutcome {
    fn of(session: &GameSession, computer_move: Option<Position>) -> Self {
        Self {
            board: session.game.board().to_grid(),
            turn: session.game.to_move(),
            winner: session.game.outcome(),
            game_id: session.id,
            computer_move,
        }
    }
}

/// Stored games with their tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    /// Games, newest first.
    pub games: Vec<GameRecord>,
    /// Wins and draws over completed games.
    pub summary: HistorySummary,
}

/// A stored game stepped through move by move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Replay {
    /// Game identifier.
    pub game_id: GameId,
    /// Board size.
    pub size: usize,
    /// Stored outcome.
    pub winner: Option<Outcome>,
    /// Moves in sequence order.
    pub moves: Vec<Move>,
    /// Board before the first move and after each one.
    pub frames: Vec<Grid>,
    /// Final board.
    pub board: Grid,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Turn controller: owns live sessions and writes every move to the store.
#[derive(Debug, Clone)]
pub struct SessionManager {
    store: Arc<dyn GameStore>,
    settings: PlaySettings,
    sessions: Arc<Mutex<HashMap<GameId, SharedSession>>>,
}

impl SessionManager {
    /// Creates a controller over `store`.
    #[instrument(skip(store))]
    pub fn new(store: Arc<dyn GameStore>, settings: PlaySettings) -> Self {
        info!("Creating session manager");
        Self {
            store,
            settings,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Controller settings.
    pub fn settings(&self) -> &PlaySettings {
        &self.settings
    }

    /// Number of unfinished games currently held in memory.
    pub fn live_sessions(&self) -> usize {
        lock(&self.sessions).len()
    }

    /// Returns a fresh board without allocating a game.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Rejected`] for sizes outside `3..=max_size`.
    #[instrument(skip(self))]
    pub fn reset(&self, size: Option<usize>) -> Result<BoardView, GameError> {
        let game = self.new_game(size.unwrap_or(self.settings.default_size))?;
        debug!(size = game.size(), "Board reset");
        Ok(BoardView {
            board: game.board().to_grid(),
            turn: game.to_move(),
        })
    }

    /// Applies a move and, when enabled, the computer's answer.
    ///
    /// Blocking: store calls, the optional pacing delay and the search all run
    /// on the calling thread.
    ///
    /// # Errors
    ///
    /// Rejections leave the game untouched. [`GameError::PersistenceUnavailable`]
    /// is returned after the in-memory move was applied; the unsaved moves and
    /// any computer answer still owed are settled by the next submission.
    #[instrument(skip(self), fields(game_id = ?request.game_id, row = request.row, col = request.col, player = %request.player))]
    pub fn submit_move(&self, request: MoveRequest) -> Result<MoveOutcome, GameError> {
        let pos = Position::new(request.row, request.col);
        let shared = match request.game_id {
            Some(id) => self.session(id)?,
            None => {
                let size = request.size.unwrap_or(self.settings.default_size);
                self.start_session(size, pos, request.player)?
            }
        };

        let mut session = lock(&shared);
        if let Some(size) = request.size.filter(|size| *size != session.game.size()) {
            debug!(requested = size, actual = session.game.size(), "Ignoring size for existing game");
        }
        self.catch_up(&mut session)?;

        let mv = session.game.play(pos, request.player)?;
        info!(game_id = session.id, %mv, "Move applied");
        session.reply_owed = request.computer_enabled
            && request.player == HUMAN
            && !session.game.is_finished();
        self.record(&mut session, mv)?;

        let computer_move = if session.reply_owed {
            self.computer_reply(&mut session)?
        } else {
            None
        };

        self.retire_if_finished(&session);
        Ok(MoveOutcome::of(&session, computer_move))
    }

    /// Stored games, newest first, with their summary.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PersistenceUnavailable`] if the store cannot be read.
    #[instrument(skip(self))]
    pub fn history(&self) -> Result<History, GameError> {
        let games = self.persist("list_games", || self.store.list_games())?;
        let summary = HistorySummary::from_records(&games);
        info!(games = games.len(), ?summary, "History loaded");
        Ok(History { games, summary })
    }

    /// Rebuilds a stored game frame by frame.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::GameNotFound`] for unknown ids and
    /// [`GameError::CorruptHistory`] if the log breaks the rules.
    #[instrument(skip(self))]
    pub fn replay(&self, game_id: GameId) -> Result<Replay, GameError> {
        let record = self.load(game_id)?;
        let mut game = Game::start(*record.size()).map_err(|e| GameError::corrupt(game_id, e))?;
        let mut frames = Vec::with_capacity(record.moves().len() + 1);
        frames.push(game.board().to_grid());
        for mv in record.moves() {
            game.apply(mv).map_err(|e| GameError::corrupt(game_id, e))?;
            frames.push(game.board().to_grid());
        }

        debug!(frames = frames.len(), "Replay built");
        Ok(Replay {
            game_id,
            size: *record.size(),
            winner: *record.winner(),
            moves: record.moves().clone(),
            board: game.board().to_grid(),
            frames,
        })
    }

    /// Deletes every stored game and drops all live sessions.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::PersistenceUnavailable`] if the store refuses; live
    /// sessions are kept in that case.
    #[instrument(skip(self))]
    pub fn clear_history(&self) -> Result<(), GameError> {
        self.persist("clear_history", || self.store.clear_history())?;
        let mut sessions = lock(&self.sessions);
        let dropped = sessions.len();
        sessions.clear();
        info!(dropped, "History cleared");
        Ok(())
    }

    /// Validates the opening move on a fresh board, then allocates an id.
    #[instrument(skip(self))]
    fn start_session(
        &self,
        size: usize,
        pos: Position,
        mover: Mark,
    ) -> Result<SharedSession, GameError> {
        let game = self.new_game(size)?;
        if let Err(e) = game.validate(pos, mover) {
            warn!(error = %e, "Opening move rejected");
            return Err(e.into());
        }

        let id = self.persist("create_game", || self.store.create_game(size))?;
        info!(game_id = id, size, "Game started");
        let shared = Arc::new(Mutex::new(GameSession::new(id, game)));
        lock(&self.sessions).insert(id, Arc::clone(&shared));
        Ok(shared)
    }

    /// Live session for `game_id`, resumed from the store if necessary.
    #[instrument(skip(self))]
    fn session(&self, game_id: GameId) -> Result<SharedSession, GameError> {
        if let Some(shared) = lock(&self.sessions).get(&game_id) {
            return Ok(Arc::clone(shared));
        }

        let record = self.load(game_id)?;
        let stored = self.persist("count_moves", || self.store.count_moves(game_id))?;
        if stored as usize != record.moves().len() {
            warn!(stored, loaded = record.moves().len(), "Move count disagrees with loaded log");
        }

        let game = Game::replay(*record.size(), record.moves())
            .map_err(|e| GameError::corrupt(game_id, e))?;
        if let (Some(outcome), None) = (game.outcome(), record.winner()) {
            warn!(%outcome, "Stored game is missing its outcome, recording it");
            self.persist("set_winner", || self.store.set_winner(game_id, outcome))?;
        }

        let mut session = GameSession::new(game_id, game);
        if session.game.is_finished() {
            session.outcome_saved = true;
            debug!(game_id, "Finished game loaded without keeping it live");
            return Ok(Arc::new(Mutex::new(session)));
        }
        info!(game_id, moves = session.game.history().len(), "Session resumed from storage");

        let shared = Arc::new(Mutex::new(session));
        let mut sessions = lock(&self.sessions);
        Ok(Arc::clone(sessions.entry(game_id).or_insert(shared)))
    }

    /// Starts a board after checking `size` against the configured range.
    fn new_game(&self, size: usize) -> Result<Game, GameError> {
        if size > self.settings.max_size {
            warn!(size, max = self.settings.max_size, "Board size over the limit");
            return Err(EngineError::InvalidSize(size).into());
        }
        Ok(Game::start(size)?)
    }

    fn load(&self, game_id: GameId) -> Result<GameRecord, GameError> {
        self.persist("load_game", || self.store.load_game(game_id))?
            .ok_or_else(|| {
                warn!(game_id, "Game not found");
                GameError::GameNotFound(game_id)
            })
    }

    /// Queues `mv` for the store and writes everything queued.
    fn record(&self, session: &mut GameSession, mv: Move) -> Result<(), GameError> {
        session.unsaved.push_back(mv);
        self.flush(session)
    }

    /// Writes unsaved moves in order, then the outcome once the game is over.
    fn flush(&self, session: &mut GameSession) -> Result<(), GameError> {
        let id = session.id;
        while let Some(mv) = session.unsaved.front().copied() {
            self.persist("append_move", || self.store.append_move(id, &mv))?;
            session.unsaved.pop_front();
        }
        if let (Some(outcome), false) = (session.game.outcome(), session.outcome_saved) {
            self.persist("set_winner", || self.store.set_winner(id, outcome))?;
            session.outcome_saved = true;
            info!(game_id = id, %outcome, "Game finished");
        }
        Ok(())
    }

    /// Settles what an earlier failed submission left behind.
    fn catch_up(&self, session: &mut GameSession) -> Result<(), GameError> {
        if !session.unsaved.is_empty() {
            warn!(game_id = session.id, pending = session.unsaved.len(), "Writing moves left unsaved");
        }
        self.flush(session)?;
        if session.reply_owed {
            info!(game_id = session.id, "Playing owed computer reply");
            self.computer_reply(session)?;
        }
        self.retire_if_finished(session);
        Ok(())
    }

    /// Drops a finished game from memory once the store has all of it.
    fn retire_if_finished(&self, session: &GameSession) {
        if session.game.is_finished()
            && session.is_saved()
            && lock(&self.sessions).remove(&session.id).is_some()
        {
            debug!(game_id = session.id, "Finished session evicted");
        }
    }

    #[instrument(skip(self, session), fields(game_id = session.id))]
    fn computer_reply(&self, session: &mut GameSession) -> Result<Option<Position>, GameError> {
        if !self.settings.computer_delay.is_zero() {
            std::thread::sleep(self.settings.computer_delay);
        }

        let opponent = self.settings.opponent;
        let report = match self.settings.search_timeout {
            Some(budget) => opponent.search_until(session.game.board(), Instant::now() + budget),
            None => opponent.search(session.game.board()),
        };
        debug!(
            best = ?report.best,
            score = ?report.score,
            depth = report.depth,
            max_depth = opponent.max_depth(),
            nodes = report.nodes,
            "Computer search finished"
        );

        let Some(pos) = report.best else {
            session.reply_owed = false;
            return Ok(None);
        };
        let mv = session.game.play(pos, COMPUTER)?;
        session.reply_owed = false;
        info!(game_id = session.id, %mv, "Computer moved");
        self.record(session, mv)?;
        Ok(Some(pos))
    }

    /// Runs a store call, retrying up to the configured count.
    fn persist<T>(
        &self,
        operation: &str,
        mut call: impl FnMut() -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let mut attempt = 0;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.settings.persistence_retries => {
                    attempt += 1;
                    warn!(operation, attempt, error = %e, "Store call failed, retrying");
                }
                Err(e) => {
                    error!(operation, attempts = attempt + 1, error = %e, "Store call failed");
                    return Err(e);
                }
            }
        }
    }
}
