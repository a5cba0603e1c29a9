//! Settings and tracked-item persistence.
//!
//! Everything the user configures lives in `config.json` inside the config
//! directory, next to the history database.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{Credentials, DEFAULT_BASE_URL};
use crate::models::TrackedItem;
use crate::store::DEFAULT_HISTORY_LIMIT;

pub const CONFIG_FILE: &str = "config.json";
pub const HISTORY_DB: &str = "history.db";
pub const HISTORY_EXPORT_FILE: &str = "history_export.json";
const APP_DIR: &str = "mapwatch";

pub const DEFAULT_CHECK_INTERVAL_MS: u64 = 1500;
pub const MIN_CHECK_INTERVAL_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine a config directory, pass --config-dir")]
    NoConfigDir,

    #[error("Config I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// User settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: String,
    pub check_interval_ms: u64,
    pub sound_enabled: bool,
    /// Stop tracking an item once it reaches a final status
    pub auto_stop_monitoring: bool,
    /// Use the system timezone for timestamps instead of `utc_offset_hours`
    pub auto_utc: bool,
    pub utc_offset_hours: i32,
    pub history_limit: usize,
    pub api_base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            check_interval_ms: DEFAULT_CHECK_INTERVAL_MS,
            sound_enabled: true,
            auto_stop_monitoring: false,
            auto_utc: true,
            utc_offset_hours: 0,
            history_limit: DEFAULT_HISTORY_LIMIT,
            api_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Settings {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.client_id.clone(), self.client_secret.clone())
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials().is_complete()
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms.max(MIN_CHECK_INTERVAL_MS))
    }
}

/// Settings changed from the command line for one run. Never written back to
/// `config.json`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOverrides {
    pub check_interval_ms: Option<u64>,
    pub sound_enabled: Option<bool>,
}

impl SessionOverrides {
    pub fn apply(&self, settings: &Settings) -> Settings {
        let mut effective = settings.clone();
        if let Some(ms) = self.check_interval_ms {
            effective.check_interval_ms = ms;
        }
        if let Some(enabled) = self.sound_enabled {
            effective.sound_enabled = enabled;
        }
        effective
    }
}

/// Contents of `config.json`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub settings: Settings,
    pub beatmaps: Vec<TrackedItem>,
}

/// Move a legacy `api_key` into `client_id` when the latter is empty.
fn migrate_legacy_keys(value: &mut serde_json::Value) {
    let Some(settings) = value
        .get_mut("settings")
        .and_then(|s| s.as_object_mut())
    else {
        return;
    };

    let Some(api_key) = settings.remove("api_key") else {
        return;
    };

    let client_id_empty = settings
        .get("client_id")
        .and_then(|v| v.as_str())
        .is_none_or(|s| s.is_empty());

    if client_id_empty {
        debug!("Migrating legacy api_key to client_id");
        settings.insert("client_id".to_string(), api_key);
    }
}

/// Reads and writes the files in the config directory
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn history_path(&self) -> PathBuf {
        self.dir.join(HISTORY_DB)
    }

    pub fn export_path(&self) -> PathBuf {
        self.dir.join(HISTORY_EXPORT_FILE)
    }

    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.dir).map_err(|source| ConfigError::Io {
            path: self.dir.clone(),
            source,
        })
    }

    /// Load `config.json`, falling back to defaults when it does not exist
    pub fn load(&self) -> Result<ConfigFile, ConfigError> {
        let path = self.config_path();
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(ConfigFile::default());
        }

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        let mut value: serde_json::Value =
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.clone(),
                source,
            })?;
        migrate_legacy_keys(&mut value);

        let config: ConfigFile = serde_json::from_value(value)
            .map_err(|source| ConfigError::Json { path, source })?;

        debug!(beatmaps = config.beatmaps.len(), "Loaded config");
        Ok(config)
    }

    /// Write `config.json` through a temp file so a crash never leaves a
    /// truncated config behind
    pub fn save(&self, config: &ConfigFile) -> Result<(), ConfigError> {
        let path = self.config_path();
        let tmp = self.dir.join(format!("{CONFIG_FILE}.tmp"));

        let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Json {
            path: path.clone(),
            source,
        })?;

        fs::write(&tmp, json).map_err(|source| ConfigError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "Saved config");
        Ok(())
    }
}

/// Pick the config directory: explicit override, else the platform config dir
pub fn resolve_config_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(dir) => Ok(dir),
        None => dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(ConfigError::NoConfigDir),
    }
}

/// Directory for rolling log files
pub fn log_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(APP_DIR).join("logs"))
}
