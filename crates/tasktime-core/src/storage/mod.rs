//! Persistence port and its backends.
//!
//! Every store in the core persists as one JSON document under a fixed key.
//! Backends only need `load`/`save`; the document format is owned by the
//! callers.

mod config;
pub mod database;
mod memory;

pub use config::{ApiConfig, Config, LoggingConfig, StorageBackend, StorageConfig, TimerConfig};
pub use database::SqliteStorage;
pub use memory::MemoryStorage;

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StorageError};

/// Durable key-value storage.
pub trait Storage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

pub type SharedStorage = Arc<dyn Storage>;

/// Decode the document under `key`, or `None` when nothing has been saved yet.
pub fn load_json<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Result<Option<T>> {
    match storage.load(key)? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw).map(Some).map_err(|e| {
            StorageError::Corrupt {
                key: key.to_string(),
                message: e.to_string(),
            }
            .into()
        }),
    }
}

pub fn save_json<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    storage.save(key, &raw)?;
    Ok(())
}

/// Returns the data directory.
///
/// `TASKTIME_DATA_DIR` wins when set. Otherwise `~/.config/tasktime[-dev]/`,
/// with the `-dev` suffix selected by `TASKTIME_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("TASKTIME_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TASKTIME_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("tasktime-dev")
            } else {
                base_dir.join("tasktime")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
