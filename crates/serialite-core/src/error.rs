// SPDX-FileCopyrightText: 2026 Serialite Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the serialite database queue.

use thiserror::Error;

/// Convenience alias used throughout the workspace.
pub type Result<T, E = SerialiteError> = std::result::Result<T, E>;

/// The primary error type returned by queue submissions and handle operations.
#[derive(Debug, Error)]
pub enum SerialiteError {
    /// The database file could not be opened (initially or on lazy reopen).
    #[error("failed to open database at {path}: {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },

    /// The handle was used after it was closed.
    #[error("database handle is closed")]
    Closed,

    /// Errors reported by SQLite while a unit of work ran.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A BEGIN, COMMIT or ROLLBACK issued by the transaction controller failed.
    #[error("failed to {action} transaction: {source}")]
    Transaction {
        action: &'static str,
        source: rusqlite::Error,
    },

    /// A SAVEPOINT, ROLLBACK TO or RELEASE issued by the savepoint controller failed.
    #[error("failed to {action} savepoint `{name}`: {source}")]
    Savepoint {
        action: &'static str,
        name: String,
        source: rusqlite::Error,
    },

    /// The linked SQLite library predates savepoint support.
    #[error("savepoints require SQLite 3.6.8 or newer (linked version is {version})")]
    SavepointsUnsupported { version: String },

    /// The queue's worker thread is no longer accepting work.
    #[error("database queue worker has shut down")]
    Disconnected,

    /// Configuration errors (invalid paths, inconsistent open modes).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
