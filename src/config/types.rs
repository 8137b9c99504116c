//! Configuration types.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::trigger::{ClassifierSettings, Mode};
use crate::watcher::channel_label;

use super::ConfigError;

/// One watched log directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory holding the client's rotating log files.
    pub dir: PathBuf,
    /// Channel label. Derived from the directory when absent.
    #[serde(default)]
    pub channel: Option<String>,
}

impl SourceConfig {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            channel: None,
        }
    }

    /// Label used to tag events from this source.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.channel {
            Some(channel) if !channel.trim().is_empty() => channel.trim().to_string(),
            _ => channel_label(&self.dir),
        }
    }
}

/// Interview statistics settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Record interviews to the statistics database.
    pub enabled: bool,
    /// SQLite database path.
    pub db_path: PathBuf,
    /// Records older than this many days are pruned.
    pub retention_days: u32,
    /// Open interviews older than this are finalized as missed.
    pub pending_timeout_secs: u64,
    /// How often the maintenance pass runs.
    pub maintenance_interval_secs: u64,
}

/// Default database location in the user's home directory.
#[must_use]
pub fn default_db_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".interview-notify-history.db")
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            db_path: default_db_path(),
            retention_days: 90,
            pending_timeout_secs: 3600,
            maintenance_interval_secs: 3600,
        }
    }
}

impl AnalyticsConfig {
    #[must_use]
    pub fn pending_timeout(&self) -> Duration {
        Duration::from_secs(self.pending_timeout_secs)
    }

    #[must_use]
    pub fn maintenance_interval(&self) -> Duration {
        Duration::from_secs(self.maintenance_interval_secs)
    }
}

/// Application configuration.
///
/// Built once at startup from the config file and CLI flags, validated, then
/// shared read-only with every component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// ntfy server base URL.
    pub server: String,
    /// ntfy topic to publish to.
    pub topic: String,
    /// The user's IRC nick.
    pub nick: String,
    /// Watched log directories.
    pub sources: Vec<SourceConfig>,
    /// Only accept announcements from `bot_nicks`.
    pub check_bot_nicks: bool,
    /// Nicks of the announcement bots.
    pub bot_nicks: Vec<String>,
    /// Rule table to use.
    pub mode: Mode,
    /// Minimum seconds between non-critical notifications per channel and kind.
    pub rate_limit_secs: u64,
    /// Append every notification attempt to this file.
    pub notification_log: Option<PathBuf>,
    /// Delay between tail polls.
    pub poll_interval_ms: u64,
    /// Report a disconnect after this many seconds without log activity.
    pub silence_threshold_secs: Option<u64>,
    /// Upper bound on a single notification POST.
    pub dispatch_timeout_secs: u64,
    pub analytics: AnalyticsConfig,
}

fn default_server() -> String {
    "https://ntfy.sh/".to_string()
}

fn default_bot_nicks() -> Vec<String> {
    vec!["Gatekeeper".to_string()]
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            topic: String::new(),
            nick: String::new(),
            sources: Vec::new(),
            check_bot_nicks: true,
            bot_nicks: default_bot_nicks(),
            mode: Mode::default(),
            rate_limit_secs: 60,
            notification_log: None,
            poll_interval_ms: 500,
            silence_threshold_secs: None,
            dispatch_timeout_secs: 10,
            analytics: AnalyticsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Check the configuration before any watching begins.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topic.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "a notification topic is required (--topic)".to_string(),
            ));
        }
        if self.nick.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "your IRC nick is required (--nick)".to_string(),
            ));
        }
        if self.server.trim().is_empty() {
            return Err(ConfigError::Invalid("server URL is empty".to_string()));
        }
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one log directory is required (--log-dir)".to_string(),
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.dispatch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "dispatch_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.silence_threshold_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "silence_threshold_secs must be greater than zero".to_string(),
            ));
        }
        if self.check_bot_nicks && self.bot_nicks.iter().all(|n| n.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "bot nick filtering is on but no bot nicks are configured".to_string(),
            ));
        }

        let mut labels = HashSet::new();
        for source in &self.sources {
            if !source.dir.exists() {
                return Err(ConfigError::Invalid(format!(
                    "log directory does not exist: {}",
                    source.dir.display()
                )));
            }
            if !source.dir.is_dir() {
                return Err(ConfigError::Invalid(format!(
                    "log directory is not a directory: {}",
                    source.dir.display()
                )));
            }
            let label = source.label();
            if !labels.insert(label.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "channel label {label:?} is used by more than one log directory"
                )));
            }
        }

        if self.analytics.enabled {
            if self.analytics.retention_days == 0 {
                return Err(ConfigError::Invalid(
                    "analytics retention_days must be greater than zero".to_string(),
                ));
            }
            if self.analytics.maintenance_interval_secs == 0 {
                return Err(ConfigError::Invalid(
                    "analytics maintenance_interval_secs must be greater than zero".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Classifier settings derived from this configuration.
    #[must_use]
    pub fn classifier_settings(&self) -> ClassifierSettings {
        ClassifierSettings {
            nick: self.nick.trim().to_string(),
            bot_nicks: self
                .bot_nicks
                .iter()
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .collect(),
            check_bot_nicks: self.check_bot_nicks,
            mode: self.mode,
            silence_threshold: self.silence_threshold_secs.map(Duration::from_secs),
        }
    }

    #[must_use]
    pub fn rate_limit(&self) -> Duration {
        Duration::from_secs(self.rate_limit_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch_timeout_secs)
    }
}
