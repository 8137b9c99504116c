//! Log file discovery.
//!
//! Finds the file an IRC client is currently writing to, and derives a
//! channel label for a watched directory.

use std::path::{Path, PathBuf};

use super::error::WatcherError;

/// File names that are never logs.
const IGNORED_NAMES: &[&str] = &[".DS_Store", "thumbs.db", "Thumbs.db", "desktop.ini"];

/// Directory names too generic to serve as a channel label.
const GENERIC_DIR_NAMES: &[&str] = &["", ".", "..", "logs", "Logs", "Channels", "channels"];

/// Find the most recently modified file in a directory.
///
/// Hidden files and known OS clutter are skipped. Ties on modification time
/// go to the lexically greatest name, which matches date-stamped log names.
///
/// # Errors
///
/// Returns an error if the directory is missing, is not a directory,
/// cannot be read, or contains no candidate files.
pub fn find_latest_log(dir: &Path) -> Result<PathBuf, WatcherError> {
    if !dir.exists() {
        return Err(WatcherError::DirectoryMissing(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(WatcherError::NotADirectory(dir.to_path_buf()));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => WatcherError::PermissionDenied(dir.to_path_buf()),
        _ => WatcherError::Io(e),
    })?;

    entries
        .filter_map(Result::ok)
        .filter(|entry| is_candidate(&entry.path()))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }
            let modified = metadata.modified().ok()?;
            Some((entry.path(), modified))
        })
        .max_by(|(a_path, a_time), (b_path, b_time)| {
            a_time.cmp(b_time).then_with(|| a_path.cmp(b_path))
        })
        .map(|(path, _)| path)
        .ok_or_else(|| WatcherError::NoLogFiles(dir.to_path_buf()))
}

fn is_candidate(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| !name.starts_with('.') && !IGNORED_NAMES.contains(&name))
}

/// Derive a channel label for a watched directory.
///
/// Uses the directory name; for generic names like `logs`, falls back to the
/// stem of the newest log file, then to `"unknown"`.
#[must_use]
pub fn channel_label(dir: &Path) -> String {
    let dir_name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    if !GENERIC_DIR_NAMES.contains(&dir_name) {
        return dir_name.to_string();
    }

    find_latest_log(dir)
        .ok()
        .and_then(|p| p.file_stem().and_then(|s| s.to_str()).map(String::from))
        .unwrap_or_else(|| "unknown".to_string())
}
