use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write config file at {config_path}: {source}")]
    ConfigWriteError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerializeError(#[from] toml::ser::Error),
}

fn default_notes_dir() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/notes").as_ref())
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.cache/notewise").as_ref())
}

fn default_save_interval_ms() -> u64 {
    3000
}

fn default_indent_text() -> String {
    "    ".to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory acting as the remote note store.
    #[serde(default = "default_notes_dir")]
    pub notes_dir: PathBuf,
    /// Local cache of documents and the dictionary.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Idle time after the last change before pushing to the notes directory.
    #[serde(default = "default_save_interval_ms")]
    pub save_interval_ms: u64,
    /// Text Tab inserts outside of list items.
    #[serde(default = "default_indent_text")]
    pub indent_text: String,
    #[serde(default)]
    pub common_words: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            notes_dir: default_notes_dir(),
            cache_dir: default_cache_dir(),
            save_interval_ms: default_save_interval_ms(),
            indent_text: default_indent_text(),
            common_words: Vec::new(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.notes_dir = Self::expand_path(&config.notes_dir).unwrap_or(config.notes_dir);
        config.cache_dir = Self::expand_path(&config.cache_dir).unwrap_or(config.cache_dir);

        Ok(Some(config))
    }

    /// The user's config, or the defaults when no config file exists.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        Ok(Self::load_from_path(&config_path)?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> Result<(), ConfigError> {
        let config_path = config_path.as_ref();
        let write_error = |source| ConfigError::ConfigWriteError {
            config_path: config_path.to_path_buf(),
            source,
        };
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content).map_err(write_error)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/notewise");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_millis(self.save_interval_ms)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
