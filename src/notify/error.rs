//! Notification error types.

use std::path::PathBuf;

/// Errors that can occur while delivering or recording notifications.
#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
    /// Server and topic do not form a valid URL.
    #[error("Invalid notification URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request did not complete.
    #[error("Notification request failed: {0}")]
    RequestFailed(String),

    /// The server answered with a non-success status.
    #[error("Notification rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Delivery took longer than the dispatch timeout.
    #[error("Notification timed out")]
    Timeout,

    /// Writing the history file failed.
    #[error("Failed to write notification history {path}: {source}")]
    History {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_display() {
        let err = NotifyError::Rejected {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Notification rejected with HTTP 429: slow down"
        );
    }

    #[test]
    fn test_history_display() {
        let err = NotifyError::History {
            path: PathBuf::from("/var/log/notify.log"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/var/log/notify.log"));
    }

    #[test]
    fn test_invalid_url_display() {
        let source = url::Url::parse("not a url").unwrap_err();
        let err = NotifyError::InvalidUrl {
            url: "not a url".to_string(),
            source,
        };
        assert!(err.to_string().starts_with("Invalid notification URL not a url"));
    }
}
