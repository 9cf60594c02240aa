//! Streak reports over a cached activity calendar.

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;
use std::sync::Arc;

use crate::cache::{CacheLayer, CacheResult, Persistence, Ttl};
use crate::error::Result;
use crate::fetch::ActivityFetcher;
use crate::keys::DashboardKey;
use crate::streak::{today_count, Cheer, ContributionCalendar, StreakSummary};

/// Streak summary plus how today is going.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreakReport {
  pub summary: StreakSummary,
  pub today_count: u32,
  pub cheer: Cheer,
}

impl StreakReport {
  pub fn new(calendar: &ContributionCalendar, today: NaiveDate) -> Self {
    let today_count = today_count(&calendar.days, today);
    Self {
      summary: calendar.streak(today),
      today_count,
      cheer: Cheer::for_count(today_count),
    }
  }
}

pub struct StreakTracker<S: Persistence, A: ActivityFetcher> {
  cache: CacheLayer<S>,
  fetcher: Arc<A>,
  ttl: Ttl,
}

impl<S: Persistence, A: ActivityFetcher> StreakTracker<S, A> {
  /// Tracker that refetches the calendar after a fixed time.
  pub fn new(cache: CacheLayer<S>, fetcher: Arc<A>, ttl: Ttl) -> Self {
    Self {
      cache,
      fetcher,
      ttl,
    }
  }

  /// Tracker that refetches the calendar once per local day.
  pub fn daily(cache: CacheLayer<S>, fetcher: Arc<A>, offset: FixedOffset) -> Self {
    Self::new(cache, fetcher, Ttl::CalendarDay(offset))
  }

  pub fn source(&self) -> &'static str {
    self.fetcher.source()
  }

  /// Calendar of `username`, from cache while fresh.
  pub async fn calendar(&self, username: &str) -> Result<CacheResult<ContributionCalendar>> {
    let fetcher = self.fetcher.as_ref();
    let key = DashboardKey::calendar(fetcher.source(), username);
    self
      .cache
      .get(&key, self.ttl, || fetcher.fetch_activity(username))
      .await
  }

  pub async fn report(&self, username: &str, today: NaiveDate) -> Result<StreakReport> {
    let calendar = self.calendar(username).await?;
    Ok(StreakReport::new(&calendar.data, today))
  }
}
