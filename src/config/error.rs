//! Configuration error types.

use std::path::PathBuf;

/// Errors raised while loading or checking configuration.
///
/// All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists (or was named explicitly) but could not be read.
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`AppConfig`](super::AppConfig).
    #[error("Cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Values are present but unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
