//! Configuration file loader.

use std::path::{Path, PathBuf};

use super::Config;

/// File name looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = ".dlp-supervisor.toml";

/// Where [`ConfigLoader`] looks for its file.
#[derive(Debug)]
pub struct ConfigLoader {
    candidates: Vec<PathBuf>,
    /// A path given on the command line must exist.
    required: bool,
}

impl ConfigLoader {
    /// Search `./.dlp-supervisor.toml`, then the user config directory.
    #[must_use]
    pub fn new() -> Self {
        let user = dirs::config_dir().map(|dir| dir.join("dlp-supervisor").join("config.toml"));
        Self {
            candidates: std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE))
                .chain(user)
                .collect(),
            required: false,
        }
    }

    /// Read exactly `path`. Unlike the default search, a missing file is an error.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            candidates: vec![path],
            required: true,
        }
    }

    /// Load the first config file found, or defaults when none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn load(&self) -> Result<Config, ConfigError> {
        match self.find_config_file() {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::read(&path)
            }
            None if self.required => {
                let path = self.candidates.first().cloned().unwrap_or_default();
                Err(ConfigError::ReadError {
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                    path,
                })
            }
            None => {
                tracing::debug!(searched = ?self.candidates, "No config file, using defaults");
                Ok(Config::default())
            }
        }
    }

    fn read(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Candidate paths in priority order.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// First candidate that is an existing file.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.candidates.iter().find(|p| p.is_file()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}
