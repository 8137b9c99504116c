//! Incremental line tailer for a directory of rotating log files.
//!
//! Always reads the newest file in the directory. When a newer file
//! appears, the tailer leaves the old one and reads the new one from the
//! beginning. Offsets of files it has left are remembered, so a file that
//! becomes the newest again is resumed where reading stopped.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::discovery::find_latest_log;
use super::error::WatcherError;

/// How many previously read files keep their offsets.
const MAX_REMEMBERED_FILES: usize = 32;

/// Tails the newest log file in a directory, line by line.
#[derive(Debug)]
pub struct LineTailer {
    /// Directory being watched.
    dir: PathBuf,
    /// File currently being read.
    current: Option<PathBuf>,
    /// Byte offset of the first unconsumed byte in `current`.
    offset: u64,
    /// Offsets of files read earlier, oldest switch first.
    left: VecDeque<(PathBuf, u64)>,
    /// A failure has been reported and not yet recovered from.
    failing: bool,
}

impl LineTailer {
    /// Create a tailer that reads the newest file from its beginning.
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            current: None,
            offset: 0,
            left: VecDeque::new(),
            failing: false,
        }
    }

    /// Create a tailer positioned at the end of the current newest file.
    ///
    /// Existing content is history and is not replayed. If the directory is
    /// empty or unreadable, the first file to show up is read from the start.
    #[must_use]
    pub fn at_end(dir: PathBuf) -> Self {
        let mut tailer = Self::new(dir);
        if let Ok(path) = find_latest_log(&tailer.dir) {
            let len = std::fs::metadata(&path).map_or(0, |m| m.len());
            tracing::debug!(path = %path.display(), offset = len, "Starting at end of log");
            tailer.current = Some(path);
            tailer.offset = len;
        }
        tailer
    }

    /// Directory being watched.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File currently being read, if any.
    #[must_use]
    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    /// Current byte offset in the current file.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read complete lines appended since the last poll.
    ///
    /// Never fails: transient errors are logged once per failure streak and
    /// an empty batch is returned, so the next poll simply retries.
    pub async fn poll(&mut self) -> Vec<String> {
        match self.try_poll().await {
            Ok(lines) => {
                if self.failing {
                    tracing::info!(dir = %self.dir.display(), "Log directory readable again");
                    self.failing = false;
                }
                lines
            }
            Err(e) => {
                if self.failing {
                    tracing::debug!(dir = %self.dir.display(), error = %e, "Still unable to read logs");
                } else {
                    tracing::warn!(dir = %self.dir.display(), error = %e, "Unable to read logs, will retry");
                    self.failing = true;
                }
                Vec::new()
            }
        }
    }

    /// Read complete lines appended since the last poll.
    ///
    /// A trailing partial line is left unconsumed until its newline arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or the current file cannot be read.
    pub async fn try_poll(&mut self) -> Result<Vec<String>, WatcherError> {
        let latest = find_latest_log(&self.dir)?;
        if self.current.as_ref() != Some(&latest) {
            tracing::info!(
                dir = %self.dir.display(),
                file = %latest.display(),
                "Switching to newer log file"
            );
            self.switch_to(latest.clone());
        }

        let mut file = match File::open(&latest).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(WatcherError::FileDeleted(latest));
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(WatcherError::PermissionDenied(latest));
            }
            Err(e) => return Err(WatcherError::Io(e)),
        };

        let file_len = file.metadata().await?.len();

        if file_len < self.offset {
            tracing::warn!(
                path = %latest.display(),
                old_offset = self.offset,
                new_len = file_len,
                "File truncated, resetting offset to 0"
            );
            self.offset = 0;
        }

        if file_len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(std::io::SeekFrom::Start(self.offset)).await?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await?;

        let Some(last_newline) = buf.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };
        let consumed = &buf[..=last_newline];
        self.offset += consumed.len() as u64;

        let lines = consumed
            .split(|&b| b == b'\n')
            .map(|raw| String::from_utf8_lossy(raw).trim_end_matches('\r').to_string())
            .filter(|line| !line.trim().is_empty())
            .collect();

        Ok(lines)
    }

    /// Make `path` the current file, parking the offset of the one being left.
    ///
    /// A file never opened before starts at offset 0.
    fn switch_to(&mut self, path: PathBuf) {
        if let Some(previous) = self.current.take() {
            self.left.retain(|(p, _)| *p != previous);
            self.left.push_back((previous, self.offset));
            while self.left.len() > MAX_REMEMBERED_FILES {
                self.left.pop_front();
            }
        }

        self.offset = match self.left.iter().position(|(p, _)| *p == path) {
            Some(index) => self.left.remove(index).map_or(0, |(_, offset)| offset),
            None => 0,
        };
        if self.offset > 0 {
            tracing::debug!(path = %path.display(), offset = self.offset, "Resuming previously read log");
        }
        self.current = Some(path);
    }

    /// Turn the tailer into an endless stream of lines.
    ///
    /// Sleeps `poll_interval` between empty polls. Dropping a pending `next()`
    /// does not lose lines: the read state lives inside the stream.
    pub fn into_stream(self, poll_interval: Duration) -> impl futures_core::Stream<Item = String> {
        futures_util::stream::unfold(
            (self, VecDeque::new()),
            move |(mut tailer, mut pending)| async move {
                loop {
                    if let Some(line) = pending.pop_front() {
                        return Some((line, (tailer, pending)));
                    }
                    let lines = tailer.poll().await;
                    if lines.is_empty() {
                        tokio::time::sleep(poll_interval).await;
                    } else {
                        pending.extend(lines);
                    }
                }
            },
        )
    }
}
