//! Errors raised by the puzzle set database.

use derive_more::{Display, Error};
use tracing::instrument;

/// What went wrong talking to the level database.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DbErrorKind {
    /// The SQLite file could not be opened.
    #[display("connection")]
    Connection,
    /// Embedded migrations did not apply.
    #[display("migration")]
    Migration,
    /// A write addressed a level set that is not stored.
    #[display("puzzle set {set_id} not found")]
    SetNotFound {
        /// Id of the missing set.
        set_id: i32,
    },
    /// A stored or outgoing level row holds a value the other side cannot represent.
    #[display("invalid {field}")]
    InvalidRow {
        /// Column that failed to convert.
        field: &'static str,
    },
    /// Any other diesel failure.
    #[display("query")]
    Query,
}

/// Level database error, tagged with the call site that raised it.
#[derive(Debug, Clone, Display, Error)]
#[display("Level store {kind} error: {message} at {file}:{line}")]
pub struct DbError {
    kind: DbErrorKind,
    message: String,
    line: u32,
    file: &'static str,
}

impl DbError {
    /// Creates an error of `kind` located at the caller.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: DbErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// A write targeted set `set_id`, which does not exist.
    #[track_caller]
    pub fn set_not_found(set_id: i32) -> Self {
        Self::new(
            DbErrorKind::SetNotFound { set_id },
            format!("no level set with id {set_id}"),
        )
    }

    /// Column `field` holds `value`, which does not convert.
    #[track_caller]
    pub fn invalid_row(field: &'static str, value: impl std::fmt::Display) -> Self {
        Self::new(
            DbErrorKind::InvalidRow { field },
            format!("unusable {field} value '{value}'"),
        )
    }

    /// The failure category.
    pub fn kind(&self) -> &DbErrorKind {
        &self.kind
    }

    /// Human readable detail.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source location that raised the error.
    pub fn location(&self) -> (&'static str, u32) {
        (self.file, self.line)
    }
}

impl From<diesel::result::Error> for DbError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(DbErrorKind::Query, err.to_string())
    }
}

impl From<diesel::ConnectionError> for DbError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(DbErrorKind::Connection, err.to_string())
    }
}
