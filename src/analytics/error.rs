//! Analytics error types.

use std::path::PathBuf;

/// Errors that can occur while recording or querying interview statistics.
#[derive(thiserror::Error, Debug)]
pub enum AnalyticsError {
    /// Failed to open or create database.
    #[error("Failed to open database at {path}: {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Failed to execute SQL.
    #[error("Database query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// Blocking task was cancelled.
    #[error("Blocking task cancelled")]
    TaskCancelled,

    /// Failed to create parent directory.
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A day window reaches outside the representable date range.
    #[error("A window of {days} days is out of range")]
    WindowOutOfRange { days: u32 },

    /// A stored value could not be decoded.
    #[error("Corrupt {column} value in database: {value}")]
    Corrupt { column: &'static str, value: String },
}
