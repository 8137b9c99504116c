//! Pipeline error types.

use crate::analytics::AnalyticsError;
use crate::config::ConfigError;
use crate::notify::NotifyError;
use crate::trigger::TriggerError;

/// Errors that stop the pipeline from starting.
///
/// Once running, failures are logged per line or per event and never
/// surface here.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build rules: {0}")]
    Trigger(#[from] TriggerError),

    #[error("Failed to set up notifications: {0}")]
    Notify(#[from] NotifyError),

    #[error("Failed to open statistics: {0}")]
    Analytics(#[from] AnalyticsError),

    /// A channel worker panicked.
    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    /// Signal handlers could not be installed.
    #[error("Failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}
