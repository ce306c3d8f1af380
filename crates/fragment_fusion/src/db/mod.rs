//! SQLite persistence for the player's level set.

mod error;
mod models;
mod repository;
mod schema;

pub use error::{DbError, DbErrorKind};
pub use models::{LevelRow, NewLevelRow, NewPuzzleSet, PuzzleSetRow};
pub use repository::PuzzleSetRepository;
