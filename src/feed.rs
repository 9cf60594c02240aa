//! Recent public activity of a user, cached for a short time.

use std::sync::Arc;

use crate::cache::{CacheLayer, CacheResult, Persistence, Ttl};
use crate::error::Result;
use crate::fetch::EventsFetcher;
use crate::github::types::ActivityEvent;
use crate::keys::DashboardKey;

/// Events shown in the feed
pub const EVENTS_PER_PAGE: u32 = 7;
pub const DEFAULT_ACTIVITY_TTL_MINUTES: i64 = 15;

pub struct ActivityFeed<S: Persistence, E: EventsFetcher> {
  cache: CacheLayer<S>,
  fetcher: Arc<E>,
  ttl: Ttl,
}

impl<S: Persistence, E: EventsFetcher> ActivityFeed<S, E> {
  pub fn new(cache: CacheLayer<S>, fetcher: Arc<E>) -> Self {
    Self {
      cache,
      fetcher,
      ttl: Ttl::minutes(DEFAULT_ACTIVITY_TTL_MINUTES),
    }
  }

  pub fn with_ttl(mut self, ttl: Ttl) -> Self {
    self.ttl = ttl;
    self
  }

  /// Recent events, from cache while fresh.
  pub async fn load(&self, username: &str) -> Result<CacheResult<Vec<ActivityEvent>>> {
    let fetcher = self.fetcher.as_ref();
    self
      .cache
      .get(&DashboardKey::events(username), self.ttl, || {
        fetcher.fetch_events(username, EVENTS_PER_PAGE)
      })
      .await
  }

  /// Recent events, always from the network.
  pub async fn refresh(&self, username: &str) -> Result<CacheResult<Vec<ActivityEvent>>> {
    let fetcher = self.fetcher.as_ref();
    self
      .cache
      .force_refresh(&DashboardKey::events(username), || {
        fetcher.fetch_events(username, EVENTS_PER_PAGE)
      })
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::testing::{ManualClock, MemoryStorage};
  use crate::cache::CacheSource;
  use crate::error::DashError;
  use async_trait::async_trait;
  use chrono::{Duration, TimeZone, Utc};
  use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

  #[derive(Default)]
  struct FakeEvents {
    calls: AtomicUsize,
    last_per_page: AtomicU32,
  }

  #[async_trait]
  impl EventsFetcher for FakeEvents {
    async fn fetch_events(&self, username: &str, per_page: u32) -> Result<Vec<ActivityEvent>> {
      let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
      self.last_per_page.store(per_page, Ordering::SeqCst);
      if username == "nobody" {
        return Err(DashError::FetchFailure("not found".to_string()));
      }
      Ok(vec![ActivityEvent {
        id: call.to_string(),
        event_type: "PushEvent".to_string(),
        repo: format!("{}/dotfiles", username),
        actor_login: username.to_string(),
        actor_avatar_url: None,
        created_at: Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap(),
      }])
    }
  }

  fn feed() -> (
    ActivityFeed<MemoryStorage, FakeEvents>,
    Arc<FakeEvents>,
    Arc<ManualClock>,
  ) {
    let clock = Arc::new(ManualClock::at(1_700_000_000_000));
    let fake = Arc::new(FakeEvents::default());
    let cache = CacheLayer::shared(Arc::new(MemoryStorage::new())).with_clock(clock.clone());
    (ActivityFeed::new(cache, fake.clone()), fake, clock)
  }

  #[tokio::test]
  async fn test_load_requests_one_page() {
    let (feed, fake, _) = feed();

    let result = feed.load("octocat").await.unwrap();

    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data[0].repo, "octocat/dotfiles");
    assert_eq!(fake.last_per_page.load(Ordering::SeqCst), EVENTS_PER_PAGE);
  }

  #[tokio::test]
  async fn test_load_is_cached_for_ttl() {
    let (feed, fake, clock) = feed();
    feed.load("octocat").await.unwrap();

    clock.advance(Duration::minutes(14));
    let result = feed.load("octocat").await.unwrap();
    assert_eq!(result.source, CacheSource::CacheFresh);
    assert_eq!(fake.calls.load(Ordering::SeqCst), 1);

    clock.advance(Duration::minutes(1));
    let result = feed.load("octocat").await.unwrap();
    assert_eq!(result.data[0].id, "2");
    assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_refresh_bypasses_cache() {
    let (feed, fake, _) = feed();
    feed.load("octocat").await.unwrap();

    let result = feed.refresh("octocat").await.unwrap();

    assert!(result.is_from_network());
    assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_failure_propagates() {
    let (feed, _, _) = feed();
    let result = feed.load("nobody").await;
    assert!(matches!(result, Err(DashError::FetchFailure(_))));
  }
}
