//! Record store abstraction over persisted level sets.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use derive_getters::Getters;
use derive_new::new;
use fragment_puzzle::LevelRecord;
use tracing::{debug, instrument};

use crate::db::DbError;

/// A stored level set: its key plus the ordered level records.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct PuzzleSet {
    /// Record key.
    id: i32,
    /// Levels in sequence order.
    levels: Vec<LevelRecord>,
}

/// Keyed storage for level sets.
///
/// Implemented by the SQLite repository and by [`MemoryRecordStore`].
pub trait RecordStore: Send + Sync {
    /// Loads every set, lowest key first.
    fn read(&self) -> Result<Vec<PuzzleSet>, DbError>;

    /// Stores a new set and returns it with its key.
    fn create(&self, levels: &[LevelRecord]) -> Result<PuzzleSet, DbError>;

    /// Atomically replaces the levels of an existing set.
    fn replace(&self, set_id: i32, levels: &[LevelRecord]) -> Result<(), DbError>;

    /// Deletes the given sets, returning how many existed.
    fn delete(&self, ids: &[i32]) -> Result<usize, DbError>;

    /// Deletes every set, returning how many existed.
    fn delete_all(&self) -> Result<usize, DbError>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn read(&self) -> Result<Vec<PuzzleSet>, DbError> {
        (**self).read()
    }

    fn create(&self, levels: &[LevelRecord]) -> Result<PuzzleSet, DbError> {
        (**self).create(levels)
    }

    fn replace(&self, set_id: i32, levels: &[LevelRecord]) -> Result<(), DbError> {
        (**self).replace(set_id, levels)
    }

    fn delete(&self, ids: &[i32]) -> Result<usize, DbError> {
        (**self).delete(ids)
    }

    fn delete_all(&self) -> Result<usize, DbError> {
        (**self).delete_all()
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    next_id: i32,
    sets: BTreeMap<i32, Vec<LevelRecord>>,
}

/// In-memory record store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryRecordStore {
    #[instrument(skip(self))]
    fn read(&self) -> Result<Vec<PuzzleSet>, DbError> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .sets
            .iter()
            .map(|(id, levels)| PuzzleSet::new(*id, levels.clone()))
            .collect())
    }

    #[instrument(skip(self, levels), fields(levels = levels.len()))]
    fn create(&self, levels: &[LevelRecord]) -> Result<PuzzleSet, DbError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next_id += 1;
        let id = inner.next_id;
        inner.sets.insert(id, levels.to_vec());
        debug!(set_id = id, "Set created");
        Ok(PuzzleSet::new(id, levels.to_vec()))
    }

    #[instrument(skip(self, levels), fields(levels = levels.len()))]
    fn replace(&self, set_id: i32, levels: &[LevelRecord]) -> Result<(), DbError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        match inner.sets.get_mut(&set_id) {
            Some(stored) => {
                *stored = levels.to_vec();
                Ok(())
            }
            None => Err(DbError::set_not_found(set_id)),
        }
    }

    #[instrument(skip(self))]
    fn delete(&self, ids: &[i32]) -> Result<usize, DbError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(ids
            .iter()
            .filter(|id| inner.sets.remove(*id).is_some())
            .count())
    }

    #[instrument(skip(self))]
    fn delete_all(&self) -> Result<usize, DbError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = inner.sets.len();
        inner.sets.clear();
        Ok(removed)
    }
}
