//! Swap picture puzzle core.
//!
//! An image is cropped to an aspect ratio and cut into an N×N grid of
//! [`Tile`]s. A [`PuzzleEngine`] shuffles them and lets the player swap
//! two tiles at a time until the arrangement matches the reference order.
//!
//! The puzzle lifecycle is modelled with typestate:
//!
//! ```text
//! PuzzleReady --tap--> PuzzlePlaying --tap (solving swap)--> PuzzleSolved
//!                          |
//!                          +--reset--> PuzzleReady
//! ```
//!
//! Level records, seed data and completion statistics live in [`level`].

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod clock;
mod contracts;
mod engine;
mod error;
mod grid;
pub mod invariants;
pub mod level;
mod source;
mod splitter;
mod tile;
mod typestate;

pub use board::{ArrangementError, Board};
pub use clock::{Clock, ManualClock, MonotonicClock, format_elapsed};
pub use contracts::{Contract, IndexInRange, TapContract};
pub use engine::{EnginePhase, PuzzleEngine, PuzzleEvent};
pub use error::{ImageError, TapError};
pub use grid::{AspectRatio, GridPosition, GridSize};
pub use invariants::{Invariant, InvariantSet, InvariantViolation, PlayingInvariants};
pub use level::{
    CompletionStats, CompletionUpdate, Difficulty, LevelId, LevelRecord, LevelSummary,
    SEED_LEVELS, apply_completion, completion_stats, is_playable, seed_levels, summarize,
};
pub use source::{ImageProvider, MemoryImages};
pub use splitter::{CropRect, crop_rect, decode_image, split_image};
pub use tile::{Tile, TileSet};
pub use typestate::{PuzzlePlaying, PuzzleReady, PuzzleResult, PuzzleSolved, TapEffect, TapOutcome};
