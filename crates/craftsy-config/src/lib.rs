use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_AUTOSAVE_INTERVAL_MS: u64 = 1500;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

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
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the live document, autosave slot and snapshot log
    pub storage_dir: PathBuf,
    #[serde(default = "default_autosave_interval_ms")]
    pub autosave_interval_ms: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_autosave_interval_ms() -> u64 {
    DEFAULT_AUTOSAVE_INTERVAL_MS
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Config {
    pub fn new(storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            autosave_interval_ms: DEFAULT_AUTOSAVE_INTERVAL_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

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

        config.storage_dir = Self::expand_path(&config.storage_dir).unwrap_or(config.storage_dir);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/craftsy");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Where documents live when no config file exists yet.
    pub fn default_storage_dir() -> PathBuf {
        let data_dir = shellexpand::tilde("~/.local/share/craftsy");
        PathBuf::from(data_dir.as_ref())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        shellexpand::full(&path_str)
            .ok()
            .map(|expanded| PathBuf::from(expanded.as_ref()))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::default_storage_dir())
    }
}
