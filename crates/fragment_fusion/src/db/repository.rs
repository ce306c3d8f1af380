//! Database repository for stored level sets.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use fragment_puzzle::LevelRecord;
use tracing::{debug, info, instrument};

use crate::db::{
    DbError, DbErrorKind, LevelRow, NewLevelRow, NewPuzzleSet, PuzzleSetRow, schema,
};
use crate::store::{PuzzleSet, RecordStore};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// SQLite repository holding the player's level sets.
///
/// Owns a single connection so `":memory:"` databases live as long as the
/// repository and each write runs inside one transaction.
pub struct PuzzleSetRepository {
    db_path: String,
    conn: Mutex<SqliteConnection>,
}

impl PuzzleSetRepository {
    /// Opens (or creates) the database at `db_path` and applies pending
    /// migrations.
    ///
    /// Use `":memory:"` for an in-memory database (useful for tests).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the connection or a migration fails.
    #[instrument(skip(db_path), fields(db_path = %db_path.as_ref()))]
    pub fn open(db_path: impl AsRef<str>) -> Result<Self, DbError> {
        let db_path = db_path.as_ref().to_string();
        info!(path = %db_path, "Opening PuzzleSetRepository");
        let mut conn = SqliteConnection::establish(&db_path)
            .map_err(|e| {
                DbError::new(DbErrorKind::Connection, format!("cannot open '{db_path}': {e}"))
            })?;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(DbErrorKind::Migration, e.to_string()))?;
        debug!(applied = applied.len(), "Migrations applied");

        Ok(Self {
            db_path,
            conn: Mutex::new(conn),
        })
    }

    /// Returns the database path.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn connection(&self) -> MutexGuard<'_, SqliteConnection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts a new set with `levels` in order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, levels), fields(levels = levels.len()))]
    pub fn create_set(&self, levels: &[LevelRecord]) -> Result<PuzzleSet, DbError> {
        debug!("Creating puzzle set");
        let mut conn = self.connection();

        let row = conn.transaction::<_, DbError, _>(|conn| {
            let row = diesel::insert_into(schema::puzzle_sets::table)
                .values(&NewPuzzleSet::new(Utc::now().naive_utc()))
                .returning(PuzzleSetRow::as_returning())
                .get_result(conn)?;
            insert_levels(conn, *row.id(), levels)?;
            Ok(row)
        })?;

        info!(set_id = row.id(), "Puzzle set created");
        Ok(PuzzleSet::new(*row.id(), levels.to_vec()))
    }

    /// Loads every set with its levels in position order, oldest set first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or a row is invalid.
    #[instrument(skip(self))]
    pub fn list_sets(&self) -> Result<Vec<PuzzleSet>, DbError> {
        debug!("Listing puzzle sets");
        let mut conn = self.connection();

        let sets = schema::puzzle_sets::table
            .order(schema::puzzle_sets::id.asc())
            .select(PuzzleSetRow::as_select())
            .load(&mut *conn)?;

        let levels = LevelRow::belonging_to(&sets)
            .order(schema::level_records::position.asc())
            .select(LevelRow::as_select())
            .load(&mut *conn)?;

        let grouped = levels
            .grouped_by(&sets)
            .into_iter()
            .zip(&sets)
            .map(|(rows, set)| {
                let records = rows
                    .iter()
                    .map(LevelRow::to_record)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(PuzzleSet::new(*set.id(), records))
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        info!(count = grouped.len(), "Puzzle sets loaded");
        Ok(grouped)
    }

    /// Replaces the levels of set `set_id` in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the set does not exist or a database error
    /// occurs; the stored levels are unchanged on error.
    #[instrument(skip(self, levels), fields(levels = levels.len()))]
    pub fn replace_levels(&self, set_id: i32, levels: &[LevelRecord]) -> Result<(), DbError> {
        debug!("Replacing levels");
        let mut conn = self.connection();

        conn.transaction::<_, DbError, _>(|conn| {
            let exists = schema::puzzle_sets::table
                .find(set_id)
                .select(PuzzleSetRow::as_select())
                .first(conn)
                .optional()?;
            if exists.is_none() {
                return Err(DbError::set_not_found(set_id));
            }

            diesel::delete(
                schema::level_records::table.filter(schema::level_records::set_id.eq(set_id)),
            )
            .execute(conn)?;
            insert_levels(conn, set_id, levels)
        })?;

        info!(set_id, "Levels replaced");
        Ok(())
    }

    /// Deletes the given sets and their levels. Returns the number of sets
    /// removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn delete_sets(&self, ids: &[i32]) -> Result<usize, DbError> {
        debug!("Deleting puzzle sets");
        let mut conn = self.connection();

        let removed = conn.transaction::<_, DbError, _>(|conn| {
            diesel::delete(
                schema::level_records::table
                    .filter(schema::level_records::set_id.eq_any(ids.iter().copied())),
            )
            .execute(conn)?;
            let removed = diesel::delete(
                schema::puzzle_sets::table.filter(schema::puzzle_sets::id.eq_any(ids.iter().copied())),
            )
            .execute(conn)?;
            Ok(removed)
        })?;

        info!(removed, "Puzzle sets deleted");
        Ok(removed)
    }

    /// Deletes every set and level. Returns the number of sets removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn delete_all(&self) -> Result<usize, DbError> {
        debug!("Deleting all puzzle sets");
        let mut conn = self.connection();

        let removed = conn.transaction::<_, DbError, _>(|conn| {
            diesel::delete(schema::level_records::table).execute(conn)?;
            Ok(diesel::delete(schema::puzzle_sets::table).execute(conn)?)
        })?;

        info!(removed, "All puzzle sets deleted");
        Ok(removed)
    }
}

#[instrument(skip(conn, levels), fields(levels = levels.len()))]
fn insert_levels(
    conn: &mut SqliteConnection,
    set_id: i32,
    levels: &[LevelRecord],
) -> Result<(), DbError> {
    let rows = levels
        .iter()
        .enumerate()
        .map(|(position, record)| NewLevelRow::from_record(set_id, position, record))
        .collect::<Result<Vec<_>, _>>()?;

    diesel::insert_into(schema::level_records::table)
        .values(&rows)
        .execute(conn)?;
    Ok(())
}

impl fmt::Debug for PuzzleSetRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PuzzleSetRepository")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl RecordStore for PuzzleSetRepository {
    fn read(&self) -> Result<Vec<PuzzleSet>, DbError> {
        self.list_sets()
    }

    fn create(&self, levels: &[LevelRecord]) -> Result<PuzzleSet, DbError> {
        self.create_set(levels)
    }

    fn replace(&self, set_id: i32, levels: &[LevelRecord]) -> Result<(), DbError> {
        self.replace_levels(set_id, levels)
    }

    fn delete(&self, ids: &[i32]) -> Result<usize, DbError> {
        self.delete_sets(ids)
    }

    fn delete_all(&self) -> Result<usize, DbError> {
        PuzzleSetRepository::delete_all(self)
    }
}
