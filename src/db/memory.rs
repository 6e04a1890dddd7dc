//! In-memory game store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use gridtac_engine::{Move, Outcome};
use tracing::{debug, info, instrument, warn};

use crate::db::{DbError, GameId, GameRecord, GameStore};

#[derive(Debug, Default)]
struct Tables {
    next_id: GameId,
    games: BTreeMap<GameId, GameRecord>,
}

/// [`GameStore`] kept in process memory.
///
/// Clones share the same tables. The store can be switched unavailable, or
/// told to fail a number of upcoming writes, to exercise persistence failures.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    unavailable: Arc<AtomicBool>,
    failing_writes: Arc<AtomicUsize>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory store");
        Self::default()
    }

    /// Makes every call fail until switched back.
    #[instrument(skip(self))]
    pub fn set_unavailable(&self, unavailable: bool) {
        warn!(unavailable, "In-memory store availability changed");
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fails the next `count` writes, then recovers.
    #[instrument(skip(self))]
    pub fn fail_next_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Number of stored games.
    pub fn game_count(&self) -> usize {
        self.lock().games.len()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_read(&self, operation: &str) -> Result<(), DbError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::unavailable(operation));
        }
        Ok(())
    }

    fn check_write(&self, operation: &str) -> Result<(), DbError> {
        self.check_read(operation)?;
        let failing = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            debug!(operation, "Injected write failure");
            return Err(DbError::unavailable(operation));
        }
        Ok(())
    }
}

impl GameStore for InMemoryStore {
    #[instrument(skip(self))]
    fn create_game(&self, size: usize) -> Result<GameId, DbError> {
        self.check_write("create_game")?;
        let mut tables = self.lock();
        tables.next_id += 1;
        let id = tables.next_id;
        let record = GameRecord::new(id, size, None, chrono::Utc::now().naive_utc(), Vec::new());
        tables.games.insert(id, record);
        debug!(game_id = id, "Game created");
        Ok(id)
    }

    #[instrument(skip(self))]
    fn count_moves(&self, game_id: GameId) -> Result<u32, DbError> {
        self.check_read("count_moves")?;
        let tables = self.lock();
        Ok(tables
            .games
            .get(&game_id)
            .map_or(0, |record| record.moves().len() as u32))
    }

    #[instrument(skip(self), fields(mv = %mv))]
    fn append_move(&self, game_id: GameId, mv: &Move) -> Result<(), DbError> {
        self.check_write("append_move")?;
        let mut tables = self.lock();
        let record = tables
            .games
            .get_mut(&game_id)
            .ok_or_else(|| DbError::new(format!("Game {} not found", game_id)))?;
        if record.moves().iter().any(|stored| stored.sequence == mv.sequence) {
            return Err(DbError::new(format!(
                "Move #{} already stored for game {}",
                mv.sequence, game_id
            )));
        }
        record.push_move(*mv);
        Ok(())
    }

    #[instrument(skip(self))]
    fn set_winner(&self, game_id: GameId, outcome: Outcome) -> Result<(), DbError> {
        self.check_write("set_winner")?;
        let mut tables = self.lock();
        let record = tables
            .games
            .get_mut(&game_id)
            .ok_or_else(|| DbError::new(format!("Game {} not found", game_id)))?;
        record.record_winner(outcome);
        Ok(())
    }

    #[instrument(skip(self))]
    fn load_game(&self, game_id: GameId) -> Result<Option<GameRecord>, DbError> {
        self.check_read("load_game")?;
        Ok(self.lock().games.get(&game_id).cloned())
    }

    #[instrument(skip(self))]
    fn list_games(&self) -> Result<Vec<GameRecord>, DbError> {
        self.check_read("list_games")?;
        // Ids grow monotonically, so reverse id order is newest first.
        Ok(self.lock().games.values().rev().cloned().collect())
    }

    #[instrument(skip(self))]
    fn clear_history(&self) -> Result<(), DbError> {
        self.check_write("clear_history")?;
        let mut tables = self.lock();
        let cleared = tables.games.len();
        tables.games.clear();
        info!(games = cleared, "History cleared");
        Ok(())
    }
}
