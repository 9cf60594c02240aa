//! In-memory collaborators for cache tests.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::clock::Clock;
use super::storage::Persistence;
use crate::error::{DashError, Result};

/// Map-backed persistence that counts writes and deletes.
pub struct MemoryStorage {
  entries: Mutex<HashMap<String, String>>,
  writes: AtomicUsize,
  deletes: AtomicUsize,
  available: AtomicBool,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self {
      entries: Mutex::new(HashMap::new()),
      writes: AtomicUsize::new(0),
      deletes: AtomicUsize::new(0),
      available: AtomicBool::new(true),
    }
  }

  /// Make every operation fail with `StorageUnavailable`.
  pub fn set_available(&self, available: bool) {
    self.available.store(available, Ordering::SeqCst);
  }

  pub fn write_count(&self) -> usize {
    self.writes.load(Ordering::SeqCst)
  }

  pub fn delete_count(&self) -> usize {
    self.deletes.load(Ordering::SeqCst)
  }

  pub fn len(&self) -> usize {
    self.entries.lock().unwrap().len()
  }

  fn check(&self) -> Result<()> {
    if self.available.load(Ordering::SeqCst) {
      Ok(())
    } else {
      Err(DashError::StorageUnavailable("storage disabled".into()))
    }
  }
}

impl Persistence for MemoryStorage {
  fn read(&self, key: &str) -> Result<Option<String>> {
    self.check()?;
    Ok(self.entries.lock().unwrap().get(key).cloned())
  }

  fn write(&self, key: &str, value: &str) -> Result<()> {
    self.check()?;
    self.writes.fetch_add(1, Ordering::SeqCst);
    self
      .entries
      .lock()
      .unwrap()
      .insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn delete(&self, key: &str) -> Result<()> {
    self.check()?;
    self.deletes.fetch_add(1, Ordering::SeqCst);
    self.entries.lock().unwrap().remove(key);
    Ok(())
  }
}

/// Clock that only moves when told to.
pub struct ManualClock {
  millis: AtomicI64,
}

impl ManualClock {
  pub fn at(millis: i64) -> Self {
    Self {
      millis: AtomicI64::new(millis),
    }
  }

  pub fn set(&self, millis: i64) {
    self.millis.store(millis, Ordering::SeqCst);
  }

  pub fn advance(&self, by: Duration) {
    self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
  }
}
