//! Profile management business logic layer.

use std::path::PathBuf;
use std::sync::Arc;

use derive_getters::Getters;
use fragment_puzzle::LevelRecord;
use tracing::{debug, info, instrument, warn};

use crate::progress::LevelProgressStore;
use crate::store::RecordStore;

/// Progress figures shown on the profile screen.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct ProfileSummary {
    /// Resolved levels (the main-screen score).
    score: usize,
    /// Resolved levels counted for statistics.
    completed: usize,
    /// Average best time over timed resolved levels, as `MM:SS`.
    average_best_time: String,
}

/// Service layer for profile operations.
///
/// Wraps [`LevelProgressStore`] with the profile-screen flows: the progress
/// summary, resetting progress and deleting the account.
#[derive(Debug)]
pub struct ProfileService<S> {
    progress: Arc<LevelProgressStore<S>>,
    profile_image: Option<PathBuf>,
}

impl<S: RecordStore> ProfileService<S> {
    /// Creates a new profile service over the shared progress store.
    #[instrument(skip(progress))]
    pub fn new(progress: Arc<LevelProgressStore<S>>, profile_image: Option<PathBuf>) -> Self {
        info!("Creating ProfileService");
        Self {
            progress,
            profile_image,
        }
    }

    /// Returns the underlying progress store.
    #[instrument(skip(self))]
    pub fn progress(&self) -> &Arc<LevelProgressStore<S>> {
        &self.progress
    }

    /// Computes the profile summary from the current records.
    #[instrument(skip(self))]
    pub fn summary(&self) -> ProfileSummary {
        let stats = self.progress.completion_stats();
        let summary = ProfileSummary {
            score: self.progress.resolved_count(),
            completed: *stats.completed(),
            average_best_time: stats.average_formatted(),
        };
        debug!(?summary, "Profile summary computed");
        summary
    }

    /// Replaces all progress with the seed levels.
    #[instrument(skip(self))]
    pub fn reset_progress(&self) -> Vec<LevelRecord> {
        info!("Resetting progress");
        self.progress.reset_all()
    }

    /// Removes the stored profile image, if any, then resets progress.
    ///
    /// Returns whether an image file was removed. A failed removal is
    /// logged and does not stop the reset.
    #[instrument(skip(self))]
    pub fn delete_account(&self) -> bool {
        let removed = match &self.profile_image {
            Some(path) if path.exists() => match std::fs::remove_file(path) {
                Ok(()) => {
                    info!(path = %path.display(), "Profile image removed");
                    true
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove profile image");
                    false
                }
            },
            _ => false,
        };
        self.progress.reset_all();
        info!(image_removed = removed, "Account deleted");
        removed
    }
}
