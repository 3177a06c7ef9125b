//! Error types for SQLite access operations.
//!
//! One variant per failure class: bad database location, connection
//! failure, transaction boundary failures, missing table context, and
//! statement failures.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Message used for malformed bind parameter tuples.
pub const PARAMS_ERROR: &str = "Error Processing Params";

/// What is known about batched writes after a failed `COMMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The engine still held the transaction and it was rolled back.
    RolledBack,
    /// The engine no longer holds the transaction; the writes may or may
    /// not have been applied.
    Indeterminate,
}

impl fmt::Display for CommitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RolledBack => f.write_str("batched writes rolled back"),
            Self::Indeterminate => f.write_str("batched writes in unknown state"),
        }
    }
}

/// Errors that can occur while accessing the database.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// The parent directory of the database path does not exist.
    #[error("Path provided is not a valid directory: {}", .0.display())]
    DatabasePath(PathBuf),

    /// The engine failed to open the database file or apply its pragmas.
    #[error("unable to open database '{}': {source}", path.display())]
    ConnectError {
        /// Resolved database file.
        path: PathBuf,
        /// Engine failure.
        #[source]
        source: rusqlite::Error,
    },

    /// The engine rejected `BEGIN IMMEDIATE TRANSACTION`.
    #[error("unable to begin write transaction: {0}")]
    BeginTransaction(#[source] rusqlite::Error),

    /// The engine rejected `COMMIT`. The coordinator is back to idle.
    #[error("unable to complete write transaction ({outcome}): {source}")]
    CompleteTransaction {
        /// State of the batched writes.
        outcome: CommitOutcome,
        /// Engine failure.
        #[source]
        source: rusqlite::Error,
    },

    /// A table-scoped operation ran before a table was selected.
    #[error("Table name has not been set")]
    SetTable,

    /// Prepare, bind or execute failure.
    #[error("{message} - {sql}")]
    QueryError {
        /// Engine or validation message.
        message: String,
        /// The offending SQL text.
        sql: String,
    },

    /// Identifier or configuration failure from the core crate.
    #[error(transparent)]
    Core(#[from] litegate_core::CoreError),
}

impl SqliteError {
    pub(crate) fn query(message: impl Into<String>, sql: &str) -> Self {
        Self::QueryError {
            message: message.into(),
            sql: sql.to_string(),
        }
    }

    pub(crate) fn params(sql: &str) -> Self {
        Self::query(PARAMS_ERROR, sql)
    }
}

/// Extracts the bare engine message from a `rusqlite` error.
pub(crate) fn engine_message(err: &rusqlite::Error) -> String {
    match err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.clone(),
        rusqlite::Error::SqlInputError { msg, .. } => msg.clone(),
        other => other.to_string(),
    }
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
