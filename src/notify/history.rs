//! Append-only notification history file.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::trigger::Event;

use super::error::NotifyError;
use super::message::Notification;

/// What happened to a notification attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The transport accepted it.
    Sent,
    /// The rate limiter held it back.
    Suppressed,
    /// The transport failed or timed out.
    Failed,
}

impl DeliveryStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Suppressed => "suppressed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appends one line per notification attempt to a text file.
#[derive(Debug)]
pub struct HistoryLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl HistoryLog {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record of one attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its directory cannot be written.
    pub async fn append(
        &self,
        event: &Event,
        notification: &Notification,
        status: DeliveryStatus,
    ) -> Result<(), NotifyError> {
        let line = format_entry(event, notification, status);
        let to_err = |source| NotifyError::History {
            path: self.path.clone(),
            source,
        };

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(to_err)?;
            }
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(to_err)?;
        file.write_all(line.as_bytes()).await.map_err(to_err)?;
        file.flush().await.map_err(to_err)
    }
}

fn format_entry(event: &Event, notification: &Notification, status: DeliveryStatus) -> String {
    format!(
        "[{}] channel={} type={} priority={} status={} title=\"{}\" message=\"{}\"\n",
        event.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
        event.channel,
        event.kind,
        notification.priority,
        status,
        quote(&notification.title),
        quote(&notification.message),
    )
}

fn quote(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trigger::EventKind;
    use tempfile::TempDir;

    fn sample() -> (Event, Notification) {
        let event = Event::new(
            EventKind::Mention,
            "#red",
            "<bob> alice: say \"hi\"",
        );
        let notification = Notification::for_event(&event);
        (event, notification)
    }

    #[test]
    fn test_format_entry() {
        let (event, notification) = sample();
        let line = format_entry(&event, &notification, DeliveryStatus::Suppressed);
        assert!(line.starts_with('['));
        assert!(line.contains("] channel=#red type=mention priority=3 status=suppressed"));
        assert!(line.contains(r#"message="<bob> alice: say \"hi\"""#));
        assert!(line.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_append_creates_parent_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("history.log");
        let log = HistoryLog::new(&path);
        let (event, notification) = sample();

        log.append(&event, &notification, DeliveryStatus::Sent)
            .await
            .unwrap();
        log.append(&event, &notification, DeliveryStatus::Failed)
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("status=sent"));
        assert!(lines[1].contains("status=failed"));
    }
}
