//! Aggregate GitHub stats and top languages, cached like the profile.

use std::sync::Arc;

use crate::cache::{CacheLayer, CacheResult, Persistence, Ttl};
use crate::error::Result;
use crate::fetch::StatsFetcher;
use crate::github::types::{GithubStats, TopLanguages};
use crate::keys::DashboardKey;

pub const DEFAULT_STATS_TTL_MINUTES: i64 = 60;

pub struct StatsBoard<S: Persistence, F: StatsFetcher> {
  cache: CacheLayer<S>,
  fetcher: Arc<F>,
  ttl: Ttl,
}

impl<S: Persistence, F: StatsFetcher> StatsBoard<S, F> {
  pub fn new(cache: CacheLayer<S>, fetcher: Arc<F>) -> Self {
    Self {
      cache,
      fetcher,
      ttl: Ttl::minutes(DEFAULT_STATS_TTL_MINUTES),
    }
  }

  pub fn with_ttl(mut self, ttl: Ttl) -> Self {
    self.ttl = ttl;
    self
  }

  pub async fn stats(&self, username: &str) -> Result<CacheResult<GithubStats>> {
    let fetcher = self.fetcher.as_ref();
    self
      .cache
      .get(&DashboardKey::stats(username), self.ttl, || {
        fetcher.fetch_stats(username)
      })
      .await
  }

  pub async fn top_languages(&self, username: &str) -> Result<CacheResult<TopLanguages>> {
    let fetcher = self.fetcher.as_ref();
    self
      .cache
      .get(&DashboardKey::languages(username), self.ttl, || {
        fetcher.fetch_top_languages(username)
      })
      .await
  }

  /// Drop both cached entries so the next read refetches.
  pub fn invalidate(&self, username: &str) -> Result<()> {
    self.cache.invalidate(&DashboardKey::stats(username))?;
    self.cache.invalidate(&DashboardKey::languages(username))
  }
}
