//! Database models and domain records.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use gridtac_engine::{Mark, Move, Outcome, Position};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::db::{DbError, schema};

/// Identifier allocated by the store when a game is first persisted.
pub type GameId = i32;

/// Game row as stored.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
pub struct GameRow {
    id: i32,
    size: i32,
    winner: Option<String>,
    created_at: NaiveDateTime,
}

/// Insertable game row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::games)]
pub struct NewGame {
    size: i32,
}

/// Move row as stored.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters)]
#[diesel(table_name = schema::moves)]
#[diesel(belongs_to(GameRow, foreign_key = game_id))]
pub struct MoveRow {
    id: i32,
    game_id: i32,
    player: String,
    row_index: i32,
    col_index: i32,
    move_number: i32,
}

impl MoveRow {
    /// Converts the row back into an engine move.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the player or coordinates are not representable.
    #[instrument(skip(self), fields(game_id = self.game_id, move_number = self.move_number))]
    pub fn to_move(&self) -> Result<Move, DbError> {
        let player: Mark = self
            .player
            .parse()
            .map_err(|_| DbError::corrupt("player", &self.player))?;
        let row = usize::try_from(self.row_index)
            .map_err(|_| DbError::corrupt("row_index", self.row_index))?;
        let col = usize::try_from(self.col_index)
            .map_err(|_| DbError::corrupt("col_index", self.col_index))?;
        let sequence = u32::try_from(self.move_number)
            .map_err(|_| DbError::corrupt("move_number", self.move_number))?;
        Ok(Move::new(player, Position::new(row, col), sequence))
    }
}

/// Insertable move row.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::moves)]
pub struct NewMove {
    game_id: i32,
    player: String,
    row_index: i32,
    col_index: i32,
    move_number: i32,
}

impl NewMove {
    /// Row for `mv` within game `game_id`.
    pub fn from_move(game_id: GameId, mv: &Move) -> Self {
        Self::new(
            game_id,
            mv.player.to_string(),
            mv.position.row as i32,
            mv.position.col as i32,
            mv.sequence as i32,
        )
    }
}

/// A stored game with its moves in sequence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    id: GameId,
    size: usize,
    winner: Option<Outcome>,
    created_at: NaiveDateTime,
    moves: Vec<Move>,
}

impl GameRecord {
    /// Builds a record from a game row and its move rows.
    ///
    /// Moves are sorted by sequence number regardless of row order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any column fails to convert.
    #[instrument(skip(game, moves), fields(game_id = game.id, moves = moves.len()))]
    pub fn from_rows(game: GameRow, moves: Vec<MoveRow>) -> Result<Self, DbError> {
        let size =
            usize::try_from(game.size).map_err(|_| DbError::corrupt("size", game.size))?;
        let winner = game
            .winner
            .as_deref()
            .map(|token| {
                token
                    .parse::<Outcome>()
                    .map_err(|_| DbError::corrupt("winner", token))
            })
            .transpose()?;
        let mut moves = moves
            .iter()
            .map(MoveRow::to_move)
            .collect::<Result<Vec<_>, _>>()?;
        moves.sort_by_key(|mv| mv.sequence);

        Ok(Self {
            id: game.id,
            size,
            winner,
            created_at: game.created_at,
            moves,
        })
    }

    pub(crate) fn push_move(&mut self, mv: Move) {
        self.moves.push(mv);
        self.moves.sort_by_key(|stored| stored.sequence);
    }

    pub(crate) fn record_winner(&mut self, outcome: Outcome) {
        self.winner = Some(outcome);
    }
}

/// Win counts over completed games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    total_games: usize,
    completed: usize,
    x_wins: usize,
    o_wins: usize,
    draws: usize,
}

impl HistorySummary {
    /// Tallies `records`. Unfinished games count toward the total only.
    #[instrument(skip(records), fields(records = records.len()))]
    pub fn from_records(records: &[GameRecord]) -> Self {
        let mut summary = Self {
            total_games: records.len(),
            ..Self::default()
        };
        for winner in records.iter().filter_map(|record| record.winner) {
            summary.completed += 1;
            match winner {
                Outcome::Winner(Mark::X) => summary.x_wins += 1,
                Outcome::Winner(Mark::O) => summary.o_wins += 1,
                Outcome::Draw => summary.draws += 1,
            }
        }
        summary
    }
}
