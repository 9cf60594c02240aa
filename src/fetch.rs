//! Fetch collaborators consumed by the cache-backed services.
//!
//! Concrete HTTP clients implement these; tests substitute fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::github::types::{ActivityEvent, GithubStats, SocialAccount, TopLanguages, UserProfile};
use crate::streak::ContributionCalendar;

#[async_trait]
pub trait ProfileFetcher: Send + Sync {
  async fn fetch_profile(&self, username: &str) -> Result<UserProfile>;

  async fn fetch_social_accounts(&self, username: &str) -> Result<Vec<SocialAccount>>;
}

#[async_trait]
pub trait EventsFetcher: Send + Sync {
  async fn fetch_events(&self, username: &str, per_page: u32) -> Result<Vec<ActivityEvent>>;
}

/// Source of a per-day activity calendar.
#[async_trait]
pub trait ActivityFetcher: Send + Sync {
  /// Short name of the data source, used to namespace cache entries
  fn source(&self) -> &'static str;

  async fn fetch_activity(&self, username: &str) -> Result<ContributionCalendar>;
}

#[async_trait]
pub trait StatsFetcher: Send + Sync {
  async fn fetch_stats(&self, username: &str) -> Result<GithubStats>;

  async fn fetch_top_languages(&self, username: &str) -> Result<TopLanguages>;
}
