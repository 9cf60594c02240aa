//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Trait for values that can be stored in the cache.
///
/// `validate` is the validity predicate applied to freshly fetched values
/// before they are persisted. A value that fails it is reported as an
/// invalid payload and never written.
pub trait Payload: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Check that the value carries the fields callers rely on.
  fn validate(&self) -> Result<(), String> {
    Ok(())
  }
}

impl<T: Payload> Payload for Vec<T> {}

/// Trait for cache keys.
pub trait CacheKey {
  /// Stable, fixed-length key used by the persistence backend
  fn cache_hash(&self) -> String;

  /// Human readable description for logs
  fn description(&self) -> String;
}

/// A value together with the time it was stored.
///
/// Entries are replaced wholesale and never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
  value: T,
  stored_at: i64,
}

impl<T> CacheEntry<T> {
  pub fn new(value: T, stored_at: i64) -> Self {
    Self { value, stored_at }
  }

  pub fn into_value(self) -> T {
    self.value
  }

  /// Epoch milliseconds at which the entry was written.
  pub fn stored_at(&self) -> i64 {
    self.stored_at
  }

  pub fn stored_at_utc(&self) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(self.stored_at).unwrap_or_default()
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was stored
  pub cached_at: DateTime<Utc>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at,
    }
  }

  /// Create a new cache result from a fresh cache entry.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::CacheFresh,
      cached_at,
    }
  }

  /// Create a new cache result for offline mode.
  pub fn offline(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Offline,
      cached_at,
    }
  }

  pub fn is_from_network(&self) -> bool {
    self.source == CacheSource::Network
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still within its TTL
  CacheFresh,
  /// Network unavailable, serving a stale entry
  Offline,
}
