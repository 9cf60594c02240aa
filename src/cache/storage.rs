//! Persistence trait and SQLite implementation.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::error::{DashError, Result};

/// Key-value persistence backend for cache entries and small settings.
///
/// Implementations must report unavailability as an error instead of
/// silently dropping reads or writes.
pub trait Persistence: Send + Sync {
  /// Read the value stored under `key`.
  fn read(&self, key: &str) -> Result<Option<String>>;

  /// Store `value` under `key`, replacing any previous value.
  fn write(&self, key: &str, value: &str) -> Result<()>;

  /// Delete `key`. Deleting an absent key is not an error.
  fn delete(&self, key: &str) -> Result<()>;
}

/// SQLite-based persistence.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the store at `path`, or at the default location.
  pub fn open(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        DashError::StorageUnavailable(format!("failed to create store directory: {}", e))
      })?;
    }

    let conn = Connection::open(&path).map_err(|e| {
      DashError::StorageUnavailable(format!("failed to open store at {}: {}", path.display(), e))
    })?;
    debug!(path = %path.display(), "opened sqlite store");

    Self::with_connection(conn)
  }

  /// Open a store that lives only as long as this value.
  #[cfg(test)]
  pub fn open_in_memory() -> Result<Self> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| DashError::StorageUnavailable("could not determine data directory".into()))?;

    Ok(data_dir.join("ghdash").join("store.db"))
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| DashError::StorageUnavailable(format!("lock poisoned: {}", e)))
  }

  fn run_migrations(&self) -> Result<()> {
    self.lock()?.execute_batch(STORE_SCHEMA)?;
    Ok(())
  }
}

const STORE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    written_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl Persistence for SqliteStorage {
  fn read(&self, key: &str) -> Result<Option<String>> {
    let conn = self.lock()?;
    let value = conn
      .query_row(
        "SELECT value FROM kv_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  fn write(&self, key: &str, value: &str) -> Result<()> {
    let conn = self.lock()?;
    conn.execute(
      "INSERT OR REPLACE INTO kv_store (key, value, written_at)
       VALUES (?, ?, datetime('now'))",
      params![key, value],
    )?;
    Ok(())
  }

  fn delete(&self, key: &str) -> Result<()> {
    let conn = self.lock()?;
    conn.execute("DELETE FROM kv_store WHERE key = ?", params![key])?;
    Ok(())
  }
}
