//! Level records, the seed sequence and completion statistics.
//!
//! These are pure functions over the ordered record sequence. Persisting
//! the sequence is the caller's concern.

use std::time::Duration;

use derive_getters::Getters;
use derive_more::Display;
use derive_new::new;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};
use tracing::{debug, info, instrument};

use crate::clock::format_elapsed;
use crate::{GridSize, ImageError};

/// How hard a level is, as shown in the level list.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    /// 3×3 and 4×4 grids.
    Easy,
    /// 4×4 and 5×5 grids.
    Medium,
    /// 6×6 and 7×7 grids.
    Hard,
}

/// Unique identifier of a level within the player's level set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[display("{_0}")]
pub struct LevelId(String);

impl LevelId {
    /// Creates an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One puzzle definition plus its persisted completion record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct LevelRecord {
    /// Unique identifier.
    id: LevelId,
    /// Name of the source image.
    image: String,
    /// Tiles per grid side.
    cell_count: u32,
    /// Displayed difficulty.
    difficulty: Difficulty,
    /// Best completion time in whole seconds; 0 means unset.
    best_time: u32,
    /// Set once the previous level is completed, which unlocks this one.
    is_resolved: bool,
}

impl LevelRecord {
    /// Returns the grid for this level.
    ///
    /// # Errors
    ///
    /// Returns [`ImageError::InvalidGridSize`] for a stored cell count
    /// below two.
    pub fn grid(&self) -> Result<GridSize, ImageError> {
        GridSize::new(self.cell_count)
    }

    /// Returns the number of tiles (`cell_count²`).
    pub fn pieces(&self) -> u32 {
        self.cell_count.saturating_mul(self.cell_count)
    }

    /// Returns the best time, if one has been recorded.
    pub fn best_time_duration(&self) -> Option<Duration> {
        (self.best_time > 0).then(|| Duration::from_secs(u64::from(self.best_time)))
    }
}

/// Static definition of one seed level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSeed {
    /// Name of the source image.
    pub image: &'static str,
    /// Tiles per grid side.
    pub cell_count: u32,
    /// Displayed difficulty.
    pub difficulty: Difficulty,
}

/// The fixed ten-level default data used to (re)initialise progress.
pub const SEED_LEVELS: [LevelSeed; 10] = [
    LevelSeed { image: "lvl1", cell_count: 3, difficulty: Difficulty::Easy },
    LevelSeed { image: "lvl2", cell_count: 3, difficulty: Difficulty::Easy },
    LevelSeed { image: "lvl3", cell_count: 4, difficulty: Difficulty::Easy },
    LevelSeed { image: "lvl4", cell_count: 4, difficulty: Difficulty::Medium },
    LevelSeed { image: "lvl5", cell_count: 5, difficulty: Difficulty::Medium },
    LevelSeed { image: "lvl6", cell_count: 5, difficulty: Difficulty::Medium },
    LevelSeed { image: "lvl7", cell_count: 6, difficulty: Difficulty::Hard },
    LevelSeed { image: "lvl8", cell_count: 6, difficulty: Difficulty::Hard },
    LevelSeed { image: "lvl9", cell_count: 7, difficulty: Difficulty::Hard },
    LevelSeed { image: "lvl10", cell_count: 7, difficulty: Difficulty::Hard },
];

/// Builds the seed sequence: no best times, nothing resolved.
///
/// Level 1 is playable without being resolved.
#[instrument]
pub fn seed_levels() -> Vec<LevelRecord> {
    SEED_LEVELS
        .iter()
        .enumerate()
        .map(|(i, seed)| {
            LevelRecord::new(
                LevelId::new(format!("level-{:02}", i + 1)),
                seed.image.to_string(),
                seed.cell_count,
                seed.difficulty,
                0,
                false,
            )
        })
        .collect()
}

/// Converts a completion time into stored whole seconds.
///
/// Sub-second completions round up to one second so a real completion is
/// never stored as "unset".
pub fn stored_seconds(elapsed: Duration) -> u32 {
    u32::try_from(elapsed.as_secs().max(1)).unwrap_or(u32::MAX)
}

/// Result of applying a completion to the level sequence.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct CompletionUpdate {
    /// The completed level.
    level: LevelId,
    /// Best time after the update, in seconds.
    best_time: u32,
    /// Whether this completion set a new best.
    improved: bool,
    /// The level unlocked by this completion.
    unlocked: LevelId,
}

/// Records a completed level in place.
///
/// Updates the level's best time if it was unset or is beaten, and marks
/// the next level resolved. Returns `None` without changes if the level is
/// unknown or is the last in the sequence.
#[instrument(skip(levels), fields(levels = levels.len()))]
pub fn apply_completion(
    levels: &mut [LevelRecord],
    id: &LevelId,
    elapsed: Duration,
) -> Option<CompletionUpdate> {
    let Some(index) = levels.iter().position(|level| level.id == *id) else {
        debug!("Level not found");
        return None;
    };
    if index + 1 >= levels.len() {
        debug!("Last level; nothing to unlock");
        return None;
    }

    let seconds = stored_seconds(elapsed);
    let current = &mut levels[index];
    let improved = current.best_time == 0 || seconds < current.best_time;
    if improved {
        current.best_time = seconds;
    }
    let best_time = current.best_time;

    let next = &mut levels[index + 1];
    next.is_resolved = true;

    info!(best_time, improved, unlocked = %next.id, "Completion applied");
    Some(CompletionUpdate {
        level: id.clone(),
        best_time,
        improved,
        unlocked: next.id.clone(),
    })
}

/// Aggregate progress across the level sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct CompletionStats {
    /// Number of resolved levels.
    completed: usize,
    /// Mean best time over resolved levels with a best time.
    average_best_time: Duration,
}

impl CompletionStats {
    /// Returns the average as `MM:SS` (`00:00` when nothing qualifies).
    pub fn average_formatted(&self) -> String {
        format_elapsed(self.average_best_time)
    }
}

/// Counts resolved levels and averages best times.
///
/// The average covers only records that are resolved and have a best
/// time, using whole-second integer division.
#[instrument(skip(levels), fields(levels = levels.len()))]
pub fn completion_stats(levels: &[LevelRecord]) -> CompletionStats {
    let completed = levels.iter().filter(|level| level.is_resolved).count();
    let timed: Vec<u64> = levels
        .iter()
        .filter(|level| level.is_resolved && level.best_time > 0)
        .map(|level| u64::from(level.best_time))
        .collect();
    let average = match timed.len() as u64 {
        0 => 0,
        count => timed.iter().sum::<u64>() / count,
    };
    CompletionStats {
        completed,
        average_best_time: Duration::from_secs(average),
    }
}

/// Whether the level at `index` can be opened.
///
/// The first level is always playable; later levels once resolved.
pub fn is_playable(levels: &[LevelRecord], index: usize) -> bool {
    index == 0 || levels.get(index).is_some_and(|level| level.is_resolved)
}

/// One row of the level list.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct LevelSummary {
    /// 1-based level number.
    number: usize,
    /// Level identifier.
    id: LevelId,
    /// Source image name.
    image: String,
    /// Displayed difficulty.
    difficulty: Difficulty,
    /// Total tiles.
    pieces: u32,
    /// Best time as `MM:SS`, if recorded.
    best_time: Option<String>,
    /// Whether the level can be opened.
    playable: bool,
}

/// Builds list rows for every level in sequence order.
#[instrument(skip(levels), fields(levels = levels.len()))]
pub fn summarize(levels: &[LevelRecord]) -> Vec<LevelSummary> {
    levels
        .iter()
        .enumerate()
        .map(|(index, level)| LevelSummary {
            number: index + 1,
            id: level.id.clone(),
            image: level.image.clone(),
            difficulty: level.difficulty,
            pieces: level.pieces(),
            best_time: level.best_time_duration().map(format_elapsed),
            playable: is_playable(levels, index),
        })
        .collect()
}
