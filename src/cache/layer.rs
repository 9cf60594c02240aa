//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::storage::Persistence;
use super::traits::{CacheEntry, CacheKey, CacheResult, Payload};
use crate::error::{DashError, Result};

/// How long a cache entry stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
  /// Stale once `now - stored_at >= ttl`
  Fixed(Duration),
  /// Stale once the local date (at `offset`) differs from the date the entry was stored
  CalendarDay(FixedOffset),
}

impl Ttl {
  pub fn minutes(minutes: i64) -> Self {
    Ttl::Fixed(Duration::minutes(minutes))
  }

  /// Like `minutes`, but `None` when the duration is out of range.
  pub fn try_minutes(minutes: i64) -> Option<Self> {
    Duration::try_minutes(minutes).map(Ttl::Fixed)
  }

  /// Check staleness of an entry stored at `stored_at` (epoch millis).
  ///
  /// Entries stamped in the future are always stale.
  pub fn is_stale(&self, stored_at: i64, now: i64) -> bool {
    if stored_at > now {
      return true;
    }

    match self {
      Ttl::Fixed(ttl) => now - stored_at >= ttl.num_milliseconds(),
      Ttl::CalendarDay(offset) => local_date(stored_at, offset) != local_date(now, offset),
    }
  }
}

fn local_date(millis: i64, offset: &FixedOffset) -> Option<NaiveDate> {
  DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(offset).date_naive())
}

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the application and the fetch collaborators.
/// It never retries; failures surface to the caller.
pub struct CacheLayer<S: Persistence> {
  storage: Arc<S>,
  clock: Arc<dyn Clock>,
  /// Serve a stale entry when the fetcher fails instead of propagating the error
  serve_stale_on_error: bool,
}

impl<S: Persistence> CacheLayer<S> {
  /// Create a cache layer over storage shared with other layers.
  pub fn shared(storage: Arc<S>) -> Self {
    Self {
      storage,
      clock: Arc::new(SystemClock),
      serve_stale_on_error: false,
    }
  }

  /// Use a different time source.
  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  /// Serve stale entries when a refetch fails.
  pub fn with_stale_fallback(mut self, enabled: bool) -> Self {
    self.serve_stale_on_error = enabled;
    self
  }

  pub fn storage(&self) -> &S {
    &self.storage
  }

  /// Return a value that is at most `ttl` stale.
  ///
  /// 1. Check cache - if fresh, return it without calling `fetcher`
  /// 2. If stale or missing, fetch and validate
  /// 3. Persist the new entry and return it
  ///
  /// On fetch failure the error propagates unless stale fallback is enabled
  /// and an entry exists.
  pub async fn get<K, T, F, Fut>(&self, key: &K, ttl: Ttl, fetcher: F) -> Result<CacheResult<T>>
  where
    K: CacheKey,
    T: Payload,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let hash = key.cache_hash();
    let now = self.clock.now_millis();

    let stale = match self.read_entry::<K, T>(key, &hash)? {
      Some(entry) if !ttl.is_stale(entry.stored_at(), now) => {
        debug!(key = %key.description(), "cache hit");
        let cached_at = entry.stored_at_utc();
        return Ok(CacheResult::from_cache(entry.into_value(), cached_at));
      }
      other => other,
    };

    debug!(key = %key.description(), has_stale = stale.is_some(), "cache miss");

    match fetch_valid(fetcher).await {
      Ok(value) => {
        let cached_at = self.store(&hash, &value)?;
        info!(key = %key.description(), "fetched fresh value");
        Ok(CacheResult::from_network(value, cached_at))
      }
      Err(err) => match stale {
        Some(entry) if self.serve_stale_on_error => {
          warn!(key = %key.description(), error = %err, "fetch failed, serving stale entry");
          let cached_at = entry.stored_at_utc();
          Ok(CacheResult::offline(entry.into_value(), cached_at))
        }
        _ => Err(err),
      },
    }
  }

  /// Fetch unconditionally and overwrite the entry.
  ///
  /// On failure the existing entry is left untouched.
  pub async fn force_refresh<K, T, F, Fut>(&self, key: &K, fetcher: F) -> Result<CacheResult<T>>
  where
    K: CacheKey,
    T: Payload,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let value = fetch_valid(fetcher).await?;
    let cached_at = self.store(&key.cache_hash(), &value)?;
    info!(key = %key.description(), "force refreshed");
    Ok(CacheResult::from_network(value, cached_at))
  }

  /// Delete any entry for `key`. Invalidating an absent key is a no-op.
  pub fn invalidate<K: CacheKey>(&self, key: &K) -> Result<()> {
    self.storage.delete(&key.cache_hash())?;
    debug!(key = %key.description(), "invalidated");
    Ok(())
  }

  /// Read an entry, treating undecodable data as absent.
  fn read_entry<K: CacheKey, T: Payload>(
    &self,
    key: &K,
    hash: &str,
  ) -> Result<Option<CacheEntry<T>>> {
    let Some(raw) = self.storage.read(hash)? else {
      return Ok(None);
    };

    match serde_json::from_str(&raw) {
      Ok(entry) => Ok(Some(entry)),
      Err(e) => {
        warn!(key = %key.description(), error = %e, "discarding undecodable cache entry");
        Ok(None)
      }
    }
  }

  fn store<T: Payload>(&self, hash: &str, value: &T) -> Result<DateTime<chrono::Utc>> {
    let entry = CacheEntry::new(value, self.clock.now_millis());
    let json = serde_json::to_string(&entry)?;
    self.storage.write(hash, &json)?;
    Ok(entry.stored_at_utc())
  }
}

async fn fetch_valid<T, F, Fut>(fetcher: F) -> Result<T>
where
  T: Payload,
  F: FnOnce() -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let value = fetcher().await?;
  value.validate().map_err(DashError::InvalidPayload)?;
  Ok(value)
}

impl<S: Persistence> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      clock: Arc::clone(&self.clock),
      serve_stale_on_error: self.serve_stale_on_error,
    }
  }
}
