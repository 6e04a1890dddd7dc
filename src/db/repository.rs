//! SQLite game store.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use gridtac_engine::{Move, Outcome};
use tracing::{debug, info, instrument};

use crate::db::{DbError, GameId, GameRecord, GameRow, GameStore, MoveRow, NewGame, NewMove, schema};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Diesel-backed [`GameStore`]. Opens a fresh connection per call.
#[derive(Debug, Clone)]
pub struct GameRepository {
    db_path: String,
}

impl GameRepository {
    /// Creates a repository for the database at the given path.
    ///
    /// Does not touch the file; see [`GameRepository::open`].
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path is empty"));
        }
        info!(path = %db_path, "Creating GameRepository");
        Ok(Self { db_path })
    }

    /// Creates a repository and applies any pending migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn open(db_path: String) -> Result<Self, DbError> {
        let repo = Self::new(db_path)?;
        repo.run_migrations()?;
        Ok(repo)
    }

    /// Applies pending migrations, returning how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Path this repository connects to.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))?;
        conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
        Ok(conn)
    }
}

impl GameStore for GameRepository {
    #[instrument(skip(self))]
    fn create_game(&self, size: usize) -> Result<GameId, DbError> {
        let mut conn = self.connection()?;
        let id = diesel::insert_into(schema::games::table)
            .values(&NewGame::new(size as i32))
            .returning(schema::games::id)
            .get_result::<i32>(&mut conn)?;
        info!(game_id = id, size, "Game created");
        Ok(id)
    }

    #[instrument(skip(self))]
    fn count_moves(&self, game_id: GameId) -> Result<u32, DbError> {
        let mut conn = self.connection()?;
        let count = schema::moves::table
            .filter(schema::moves::game_id.eq(game_id))
            .count()
            .get_result::<i64>(&mut conn)?;
        u32::try_from(count).map_err(|_| DbError::corrupt("move count", count))
    }

    #[instrument(skip(self), fields(mv = %mv))]
    fn append_move(&self, game_id: GameId, mv: &Move) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        diesel::insert_into(schema::moves::table)
            .values(&NewMove::from_move(game_id, mv))
            .execute(&mut conn)?;
        debug!(game_id, "Move stored");
        Ok(())
    }

    #[instrument(skip(self))]
    fn set_winner(&self, game_id: GameId, outcome: Outcome) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let updated = diesel::update(schema::games::table.find(game_id))
            .set(schema::games::winner.eq(Some(outcome.as_token())))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(DbError::new(format!("Game {} not found", game_id)));
        }
        info!(game_id, %outcome, "Winner recorded");
        Ok(())
    }

    #[instrument(skip(self))]
    fn load_game(&self, game_id: GameId) -> Result<Option<GameRecord>, DbError> {
        let mut conn = self.connection()?;
        let Some(game) = schema::games::table
            .find(game_id)
            .select(GameRow::as_select())
            .first(&mut conn)
            .optional()?
        else {
            debug!(game_id, "Game not stored");
            return Ok(None);
        };

        let moves = MoveRow::belonging_to(&game)
            .select(MoveRow::as_select())
            .order(schema::moves::move_number.asc())
            .load(&mut conn)?;

        GameRecord::from_rows(game, moves).map(Some)
    }

    #[instrument(skip(self))]
    fn list_games(&self) -> Result<Vec<GameRecord>, DbError> {
        let mut conn = self.connection()?;
        let games = schema::games::table
            .order((schema::games::created_at.desc(), schema::games::id.desc()))
            .select(GameRow::as_select())
            .load(&mut conn)?;

        let moves = MoveRow::belonging_to(&games)
            .select(MoveRow::as_select())
            .order(schema::moves::move_number.asc())
            .load(&mut conn)?;

        let records = moves
            .grouped_by(&games)
            .into_iter()
            .zip(games)
            .map(|(moves, game)| GameRecord::from_rows(game, moves))
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = records.len(), "Games loaded");
        Ok(records)
    }

    #[instrument(skip(self))]
    fn clear_history(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let (moves, games) = conn.transaction::<_, diesel::result::Error, _>(|conn| {
            let moves = diesel::delete(schema::moves::table).execute(conn)?;
            let games = diesel::delete(schema::games::table).execute(conn)?;
            Ok((moves, games))
        })?;
        info!(moves, games, "History cleared");
        Ok(())
    }
}
