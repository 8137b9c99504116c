//! Configuration: TOML file, CLI overrides, validation.

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{default_db_path, AnalyticsConfig, AppConfig, SourceConfig};

pub use crate::trigger::Mode;
