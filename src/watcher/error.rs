//! Watcher error types.

use std::path::PathBuf;

/// Errors that can occur while tailing a log directory.
///
/// All of these are transient from the tailer's point of view: it reports
/// them and retries on the next poll.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Watched directory does not exist.
    #[error("Log directory not found: {0}")]
    DirectoryMissing(PathBuf),

    /// Watched path exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Directory contains no log files yet.
    #[error("No log files in {0}")]
    NoLogFiles(PathBuf),

    /// Tailed file was deleted.
    #[error("Watched file deleted: {0}")]
    FileDeleted(PathBuf),

    /// Permission denied accessing file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
