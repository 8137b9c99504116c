//! Locating and reading the config file.

use std::path::{Path, PathBuf};

use super::error::ConfigError;
use super::AppConfig;

const LOCAL_FILE: &str = ".interview-notify.toml";
const APP_DIR: &str = "interview-notify";

/// Where configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    /// Named with `--config`; must exist.
    Explicit(PathBuf),
    /// First existing file wins; none at all means defaults.
    Search(Vec<PathBuf>),
}

/// Finds and parses the TOML config file.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    source: Source,
}

impl ConfigLoader {
    /// Search `./.interview-notify.toml`, then
    /// `<config_dir>/interview-notify/config.toml`.
    #[must_use]
    pub fn new() -> Self {
        let candidates = std::iter::once(PathBuf::from(LOCAL_FILE))
            .chain(dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml")))
            .collect();
        Self {
            source: Source::Search(candidates),
        }
    }

    /// Use exactly `path`.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            source: Source::Explicit(path),
        }
    }

    /// Files considered, in priority order.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        match &self.source {
            Source::Explicit(path) => std::slice::from_ref(path),
            Source::Search(paths) => paths,
        }
    }

    /// The file `load` would read, if any.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths().iter().find(|p| p.is_file()).cloned()
    }

    /// Read the configuration, falling back to defaults when searching finds
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, or if the chosen file
    /// cannot be read or parsed.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        match (&self.source, self.find_config_file()) {
            (_, Some(path)) => read_file(&path),
            (Source::Explicit(path), None) => Err(ConfigError::Read {
                path: path.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
            (Source::Search(_), None) => {
                tracing::debug!("No config file, using defaults");
                Ok(AppConfig::default())
            }
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    tracing::debug!(path = %path.display(), "Reading config file");
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
