//! TOML-based application configuration.
//!
//! Stores:
//! - Timer method settings (pomodoro lengths, five-minute length)
//! - Storage backend selection
//! - Remote API endpoint settings
//! - Default log filter
//!
//! Configuration is stored at `<data_dir>/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Timer method settings, all in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work")]
    pub pomodoro_work_secs: u64,
    #[serde(default = "default_break")]
    pub pomodoro_break_secs: u64,
    #[serde(default = "default_long_break")]
    pub pomodoro_long_break_secs: u64,
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
    #[serde(default = "default_five_min")]
    pub five_min_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Database file; `<data_dir>/tasktime.db` when unset.
    #[serde(default)]
    pub path: Option<String>,
}

/// Remote API settings. The client is only built when `enabled`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_client_version")]
    pub client_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `TASKTIME_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_work() -> u64 {
    25 * 60
}
fn default_break() -> u64 {
    5 * 60
}
fn default_long_break() -> u64 {
    15 * 60
}
fn default_sessions_before_long_break() -> u32 {
    4
}
fn default_five_min() -> u64 {
    5 * 60
}
fn default_base_url() -> String {
    "https://api.timetracker.example.com/v1".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_platform() -> String {
    std::env::consts::OS.into()
}
fn default_client_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}
fn default_log_level() -> String {
    "warn".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            pomodoro_work_secs: default_work(),
            pomodoro_break_secs: default_break(),
            pomodoro_long_break_secs: default_long_break(),
            sessions_before_long_break: default_sessions_before_long_break(),
            five_min_secs: default_five_min(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            platform: default_platform(),
            client_version: default_client_version(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown.
    ///
    /// Optional keys that are currently unset (e.g. `storage.path`) are
    /// treated as strings.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[timer]\npomodoro_work_secs = 3000\n").unwrap();
        assert_eq!(parsed.timer.pomodoro_work_secs, 3000);
        assert_eq!(parsed.timer.sessions_before_long_break, 4);
        assert_eq!(parsed.storage.backend, StorageBackend::Sqlite);
        assert!(!parsed.api.enabled);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.pomodoro_work_secs").as_deref(), Some("1500"));
        assert_eq!(cfg.get("api.enabled").as_deref(), Some("false"));
        assert_eq!(cfg.get("storage.backend").as_deref(), Some("sqlite"));
        assert!(cfg.get("storage.path").is_none());
        assert!(cfg.get("timer.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("timer.five_min_secs", "240").unwrap();
        cfg.set("api.enabled", "true").unwrap();
        cfg.set("storage.backend", "memory").unwrap();
        cfg.set("storage.path", "/tmp/x.db").unwrap();
        assert_eq!(cfg.timer.five_min_secs, 240);
        assert!(cfg.api.enabled);
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.storage.path.as_deref(), Some("/tmp/x.db"));
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("timer.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("", "1").is_err());
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("api.enabled", "not_a_bool"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("timer.five_min_secs", "five").is_err());
        assert!(cfg.set("storage.backend", "floppy").is_err());
    }

    #[test]
    fn load_from_missing_file_writes_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.logging.level = "debug".into();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().logging.level, "debug");
    }
}
