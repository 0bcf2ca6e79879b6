//! Error types shared by the SQLite storage implementation.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias returning [`SqliteDaoError`] failures.
pub type SqliteResult<T> = Result<T, SqliteDaoError>;

/// Failures that can occur while interacting with SQLite.
#[derive(Debug, Error)]
pub enum SqliteDaoError {
    /// The directory holding the database file could not be created.
    #[error("failed to create data directory `{}`", .path.display())]
    CreateDir {
        /// Path on disk.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Opening the database file failed.
    #[error("failed to open SQLite database `{}`", .path.display())]
    Open {
        /// Path on disk.
        path: PathBuf,
        /// Driver-level cause.
        #[source]
        source: rusqlite::Error,
    },
    /// Applying the schema migration failed.
    #[error("failed to migrate SQLite schema")]
    Migrate {
        /// Driver-level cause.
        #[source]
        source: rusqlite::Error,
    },
    /// A statement failed to execute.
    #[error("SQLite `{operation}` failed")]
    Query {
        /// Store method that issued the statement.
        operation: &'static str,
        /// Driver-level cause.
        #[source]
        source: rusqlite::Error,
    },
    /// A JSON column could not be encoded.
    #[error("failed to encode stored JSON for `{key}`")]
    Encode {
        /// Key of the row.
        key: String,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A JSON column holds invalid JSON.
    #[error("failed to decode stored JSON for `{key}`")]
    Decode {
        /// Key of the row.
        key: String,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// A stored row names a game that is no longer tracked.
    #[error("stored row references unknown game `{value}`")]
    UnknownGame {
        /// Game id found in the row.
        value: String,
    },
    /// The blocking worker running the statement panicked or was cancelled.
    #[error("SQLite worker task failed")]
    Worker {
        /// Join error of the blocking task.
        #[source]
        source: tokio::task::JoinError,
    },
    /// A previous statement panicked while holding the connection.
    #[error("SQLite connection lock poisoned")]
    Poisoned,
}
