//! SQLite-backed key-value storage.
//!
//! One `kv` table holds every persisted document. Writes replace the whole
//! document, matching the copy-on-write update style of the stores.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::{data_dir, Storage};
use crate::error::StorageError;

const DB_FILE: &str = "tasktime.db";

/// SQLite database used as the durable [`Storage`] backend.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStorage {
    /// Open the database at `<data_dir>/tasktime.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_at(data_dir()?.join(DB_FILE))
    }

    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| StorageError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
            path: Some(path),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
            path: None,
        };
        db.migrate()?;
        Ok(db)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn migrate(&self) -> Result<(), StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Locked)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key        TEXT PRIMARY KEY,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Locked)?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let conn = self.conn.lock().map_err(|_| StorageError::Locked)?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_store() {
        let db = SqliteStorage::open_memory().unwrap();
        assert!(db.load("test").unwrap().is_none());
        db.save("test", "hello").unwrap();
        assert_eq!(db.load("test").unwrap().unwrap(), "hello");
        db.save("test", "again").unwrap();
        assert_eq!(db.load("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn file_database_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        {
            let db = SqliteStorage::open_at(&path).unwrap();
            db.save("task-storage", "{}").unwrap();
        }
        let db = SqliteStorage::open_at(&path).unwrap();
        assert_eq!(db.load("task-storage").unwrap().as_deref(), Some("{}"));
        assert_eq!(db.path(), Some(path.as_path()));
    }
}
