//! Database rows and their conversion to level records.

use std::str::FromStr;

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use fragment_puzzle::{Difficulty, LevelId, LevelRecord};
use tracing::instrument;

use crate::db::{DbError, schema};

/// One stored level set.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::puzzle_sets)]
pub struct PuzzleSetRow {
    id: i32,
    created_at: NaiveDateTime,
}

/// Insertable level set.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::puzzle_sets)]
pub struct NewPuzzleSet {
    created_at: NaiveDateTime,
}

/// One stored level inside a set.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters)]
#[diesel(table_name = schema::level_records)]
#[diesel(belongs_to(PuzzleSetRow, foreign_key = set_id))]
pub struct LevelRow {
    id: i32,
    set_id: i32,
    position: i32,
    level_key: String,
    image: String,
    cell_count: i32,
    difficulty: String,
    best_time: i32,
    is_resolved: bool,
}

impl LevelRow {
    /// Converts the row into a domain record.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidRow`](crate::db::DbErrorKind::InvalidRow) error
    /// for an unknown difficulty or a negative count.
    #[instrument(skip(self), fields(level_key = %self.level_key))]
    pub fn to_record(&self) -> Result<LevelRecord, DbError> {
        let difficulty = Difficulty::from_str(&self.difficulty)
            .map_err(|_| DbError::invalid_row("difficulty", &self.difficulty))?;
        let cell_count = u32::try_from(self.cell_count)
            .map_err(|_| DbError::invalid_row("cell_count", self.cell_count))?;
        let best_time = u32::try_from(self.best_time)
            .map_err(|_| DbError::invalid_row("best_time", self.best_time))?;

        Ok(LevelRecord::new(
            LevelId::new(self.level_key.clone()),
            self.image.clone(),
            cell_count,
            difficulty,
            best_time,
            self.is_resolved,
        ))
    }
}

/// Insertable level row.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::level_records)]
pub struct NewLevelRow {
    set_id: i32,
    position: i32,
    level_key: String,
    image: String,
    cell_count: i32,
    difficulty: String,
    best_time: i32,
    is_resolved: bool,
}

impl NewLevelRow {
    /// Builds the row storing `record` at `position` within set `set_id`.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidRow`](crate::db::DbErrorKind::InvalidRow) error
    /// if a number does not fit the column type.
    #[instrument(skip(record), fields(level = %record.id()))]
    pub fn from_record(set_id: i32, position: usize, record: &LevelRecord) -> Result<Self, DbError> {
        let position = i32::try_from(position)
            .map_err(|_| DbError::invalid_row("position", position))?;
        let cell_count = i32::try_from(*record.cell_count())
            .map_err(|_| DbError::invalid_row("cell_count", record.cell_count()))?;
        let best_time = i32::try_from(*record.best_time())
            .map_err(|_| DbError::invalid_row("best_time", record.best_time()))?;

        Ok(Self::new(
            set_id,
            position,
            record.id().as_str().to_string(),
            record.image().clone(),
            cell_count,
            record.difficulty().to_string(),
            best_time,
            *record.is_resolved(),
        ))
    }
}
