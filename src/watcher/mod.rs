//! Watcher module for IRC client log directories.
//!
//! Finds the newest log file in a directory and tails it line by line,
//! following the client's file rotation.

mod discovery;
mod error;
mod tailer;

pub use discovery::{channel_label, find_latest_log};
pub use error::WatcherError;
pub use tailer::LineTailer;
