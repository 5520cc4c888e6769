//! Configuration management for applog

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entry::Severity;
use crate::error::{LogError, Result};
use crate::retention::{DEFAULT_MAX_ENTRIES, DEFAULT_RETENTION_DAYS};

/// Limits applied by [`RetentionManager::apply`](crate::retention::RetentionManager::apply)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Records older than this many days are deleted, 0 disables (default: 7)
    #[serde(default = "default_max_age_days")]
    pub max_age_days: u64,

    /// At most this many records are kept, oldest deleted first, 0 disables (default: 10000)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_age_days() -> u64 {
    DEFAULT_RETENTION_DAYS
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
            max_entries: default_max_entries(),
        }
    }
}

/// Logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Queue entries until flush instead of writing each one (default: false)
    #[serde(default)]
    pub buffered: bool,

    /// Entries below this severity are discarded (default: DEBUG)
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,

    /// JSON file the records are stored in
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    #[serde(default)]
    pub retention: RetentionConfig,
}

fn default_min_severity() -> Severity {
    Severity::Debug
}

fn default_store_path() -> PathBuf {
    config_dir().join("logs.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffered: false,
            min_severity: default_min_severity(),
            store_path: default_store_path(),
            retention: RetentionConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`, or return default if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            LogError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            LogError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LogError::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LogError::Config(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        std::fs::write(path, content).map_err(|e| {
            LogError::Config(format!("Failed to write {}: {}", path.display(), e))
        })
    }
}

/// Get the base configuration directory (~/.applog)
/// Falls back to ./.applog if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".applog")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".applog"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
