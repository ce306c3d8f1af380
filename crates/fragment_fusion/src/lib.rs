//! Fragment Fusion application layer.
//!
//! Persists level progress in SQLite, runs play sessions over the
//! [`fragment_puzzle`] engine with a live elapsed-time ticker, and exposes
//! the profile flows (summary, reset, account deletion).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod assets;
mod config;
pub mod db;
mod profile_service;
mod progress;
mod session;
mod store;
mod ticker;

pub use assets::DirectoryImages;
pub use config::{AppConfig, ConfigError, DEFAULT_CONFIG_FILE, MAX_TICK_RESOLUTION_MS};
pub use db::{DbError, DbErrorKind, PuzzleSetRepository};
pub use profile_service::{ProfileService, ProfileSummary};
pub use progress::LevelProgressStore;
pub use session::{PuzzleKind, PuzzleSession, SessionConfig, SessionError, TapReport};
pub use store::{MemoryRecordStore, PuzzleSet, RecordStore};
pub use ticker::ElapsedTicker;
