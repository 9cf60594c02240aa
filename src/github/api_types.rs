//! Raw GitHub REST API response shapes and conversions to domain types.
//!
//! Every field the API might omit is optional here; required fields are
//! checked by payload validation once converted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::github::types::{ActivityEvent, UserProfile};
use crate::streak::ContributionCalendar;

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  pub login: Option<String>,
  #[serde(default)]
  pub id: u64,
  pub name: Option<String>,
  pub avatar_url: Option<String>,
  pub bio: Option<String>,
  pub company: Option<String>,
  pub blog: Option<String>,
  pub location: Option<String>,
  #[serde(default)]
  pub public_repos: u32,
  #[serde(default)]
  pub followers: u32,
  #[serde(default)]
  pub following: u32,
  pub created_at: Option<DateTime<Utc>>,
}

impl ApiUser {
  pub fn into_profile(self) -> UserProfile {
    UserProfile {
      login: self.login.unwrap_or_default(),
      id: self.id,
      name: self.name,
      avatar_url: self.avatar_url,
      bio: self.bio,
      company: self.company,
      blog: self.blog.filter(|b| !b.is_empty()),
      location: self.location,
      public_repos: self.public_repos,
      followers: self.followers,
      following: self.following,
      created_at: self.created_at,
      social_accounts: None,
    }
  }
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiEvent {
  pub id: String,
  #[serde(rename = "type")]
  pub event_type: String,
  pub repo: ApiRepoRef,
  pub actor: ApiActor,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ApiRepoRef {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiActor {
  pub login: String,
  pub avatar_url: Option<String>,
}

impl From<ApiEvent> for ActivityEvent {
  fn from(event: ApiEvent) -> Self {
    ActivityEvent {
      id: event.id,
      event_type: event.event_type,
      repo: event.repo.name,
      actor_login: event.actor.login,
      actor_avatar_url: event.actor.avatar_url,
      created_at: event.created_at,
    }
  }
}

// ============================================================================
// Contribution calendar (flat format)
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiContributions {
  pub contributions: Vec<ApiContributionDay>,
  pub total_contributions: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiContributionDay {
  pub date: NaiveDate,
  pub contribution_count: u32,
}

impl From<ApiContributions> for ContributionCalendar {
  fn from(response: ApiContributions) -> Self {
    let mut calendar = ContributionCalendar::new(response.total_contributions);
    for day in response.contributions {
      calendar.add(day.date, day.contribution_count);
    }
    calendar
  }
}
