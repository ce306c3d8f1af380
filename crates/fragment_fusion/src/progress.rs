//! The player's level progress, backed by a [`RecordStore`].
//!
//! The store holds exactly one level set. Every read goes back to the
//! record store; nothing is cached between calls. Storage errors are logged
//! and swallowed here so they never reach a play session: reads fall back to
//! an empty sequence and failed writes leave the stored data untouched.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use fragment_puzzle::{
    CompletionStats, CompletionUpdate, LevelId, LevelRecord, LevelSummary, apply_completion,
    completion_stats, is_playable, seed_levels, summarize,
};
use tracing::{debug, info, instrument, warn};

use crate::db::DbError;
use crate::store::{PuzzleSet, RecordStore};

/// Level progress for the current installation.
#[derive(Debug)]
pub struct LevelProgressStore<S> {
    store: S,
    writes: Mutex<()>,
}

impl<S: RecordStore> LevelProgressStore<S> {
    /// Wraps a record store.
    #[instrument(skip(store))]
    pub fn new(store: S) -> Self {
        info!("Creating LevelProgressStore");
        Self {
            store,
            writes: Mutex::new(()),
        }
    }

    /// Returns the underlying record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn current_set(&self) -> Result<Option<PuzzleSet>, DbError> {
        Ok(self.store.read()?.into_iter().next())
    }

    /// Loads the level sequence; empty if never seeded or unreadable.
    #[instrument(skip(self))]
    pub fn load(&self) -> Vec<LevelRecord> {
        match self.current_set() {
            Ok(Some(set)) => {
                debug!(set_id = set.id(), levels = set.levels().len(), "Levels loaded");
                set.levels().clone()
            }
            Ok(None) => {
                debug!("No level set stored");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "Failed to load levels");
                Vec::new()
            }
        }
    }

    /// Creates the ten seed levels unless a level set already exists.
    ///
    /// Returns the stored sequence afterwards (empty if storage failed).
    #[instrument(skip(self))]
    pub fn seed_if_empty(&self) -> Vec<LevelRecord> {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        match self.current_set() {
            Ok(Some(set)) => set.levels().clone(),
            Ok(None) => self.create_seed(),
            Err(e) => {
                warn!(error = %e, "Failed to read levels before seeding");
                Vec::new()
            }
        }
    }

    fn create_seed(&self) -> Vec<LevelRecord> {
        match self.store.create(&seed_levels()) {
            Ok(set) => {
                info!(set_id = set.id(), "Seed levels stored");
                set.levels().clone()
            }
            Err(e) => {
                warn!(error = %e, "Failed to store seed levels");
                Vec::new()
            }
        }
    }

    /// Records a completed level: improves its best time and unlocks the
    /// next level.
    ///
    /// Returns `None` if nothing changed: unknown or last level, or a
    /// storage failure.
    #[instrument(skip(self), fields(level = %id))]
    pub fn record_completion(&self, id: &LevelId, elapsed: Duration) -> Option<CompletionUpdate> {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        let set = match self.current_set() {
            Ok(Some(set)) => set,
            Ok(None) => {
                debug!("No level set stored; completion ignored");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read levels; completion not recorded");
                return None;
            }
        };

        let mut levels = set.levels().clone();
        let update = apply_completion(&mut levels, id, elapsed)?;
        if let Err(e) = self.store.replace(*set.id(), &levels) {
            warn!(error = %e, "Failed to store completion");
            return None;
        }
        info!(best_time = update.best_time(), unlocked = %update.unlocked(), "Completion recorded");
        Some(update)
    }

    /// Discards every stored set and re-seeds the ten levels.
    #[instrument(skip(self))]
    pub fn reset_all(&self) -> Vec<LevelRecord> {
        let _guard = self.writes.lock().unwrap_or_else(PoisonError::into_inner);
        match self.store.delete_all() {
            Ok(removed) => debug!(removed, "Level sets discarded"),
            Err(e) => {
                warn!(error = %e, "Failed to discard level sets");
                return self.load();
            }
        }
        let levels = self.create_seed();
        info!(levels = levels.len(), "Progress reset");
        levels
    }

    /// Counts resolved levels and averages their best times.
    #[instrument(skip(self))]
    pub fn completion_stats(&self) -> CompletionStats {
        completion_stats(&self.load())
    }

    /// Number of resolved levels (the main-screen score).
    #[instrument(skip(self))]
    pub fn resolved_count(&self) -> usize {
        self.load().iter().filter(|level| *level.is_resolved()).count()
    }

    /// Returns the level with `id`.
    #[instrument(skip(self))]
    pub fn level(&self, id: &LevelId) -> Option<LevelRecord> {
        self.load().into_iter().find(|level| level.id() == id)
    }

    /// Returns the 1-based position of level `id`.
    #[instrument(skip(self))]
    pub fn level_number(&self, id: &LevelId) -> Option<usize> {
        self.load()
            .iter()
            .position(|level| level.id() == id)
            .map(|index| index + 1)
    }

    /// Returns the level after `id`, if any.
    #[instrument(skip(self))]
    pub fn next_level(&self, id: &LevelId) -> Option<LevelRecord> {
        let levels = self.load();
        let index = levels.iter().position(|level| level.id() == id)?;
        levels.into_iter().nth(index + 1)
    }

    /// Whether the level at 0-based `index` can be opened.
    #[instrument(skip(self))]
    pub fn is_playable(&self, index: usize) -> bool {
        is_playable(&self.load(), index)
    }

    /// List rows for every level.
    #[instrument(skip(self))]
    pub fn summaries(&self) -> Vec<LevelSummary> {
        summarize(&self.load())
    }
}
