use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Social account linked on a GitHub profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialAccount {
  pub provider: String,
  pub url: String,
}

/// GitHub user profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub login: String,
  pub id: u64,
  pub name: Option<String>,
  pub avatar_url: Option<String>,
  pub bio: Option<String>,
  pub company: Option<String>,
  pub blog: Option<String>,
  pub location: Option<String>,
  pub public_repos: u32,
  pub followers: u32,
  pub following: u32,
  pub created_at: Option<DateTime<Utc>>,
  /// Absent when the social accounts lookup failed
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub social_accounts: Option<Vec<SocialAccount>>,
}

impl UserProfile {
  /// Name to show, falling back to the login
  pub fn display_name(&self) -> &str {
    self
      .name
      .as_deref()
      .filter(|n| !n.is_empty())
      .unwrap_or(&self.login)
  }
}

/// Public event from a user's activity feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
  pub id: String,
  pub event_type: String,
  pub repo: String,
  pub actor_login: String,
  pub actor_avatar_url: Option<String>,
  pub created_at: DateTime<Utc>,
}

impl ActivityEvent {
  pub fn kind(&self) -> EventKind {
    EventKind::from_type(&self.event_type)
  }
}

/// Event types the feed distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
  Push,
  Watch,
  PullRequest,
  Create,
  IssueComment,
  Other,
}

impl EventKind {
  pub fn from_type(event_type: &str) -> Self {
    match event_type {
      "PushEvent" => EventKind::Push,
      "WatchEvent" => EventKind::Watch,
      "PullRequestEvent" => EventKind::PullRequest,
      "CreateEvent" => EventKind::Create,
      "IssueCommentEvent" => EventKind::IssueComment,
      _ => EventKind::Other,
    }
  }

  /// Verb phrase placed before the repository name
  pub fn action(&self) -> &'static str {
    match self {
      EventKind::Push => "Pushed to",
      EventKind::Watch => "Starred",
      EventKind::PullRequest => "Opened PR in",
      EventKind::Create => "Created",
      EventKind::IssueComment => "Commented in",
      EventKind::Other => "Activity in",
    }
  }
}

/// Aggregate contribution statistics from a readme-stats service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GithubStats {
  pub name: String,
  #[serde(rename = "totalPRs")]
  pub total_prs: u64,
  #[serde(rename = "totalPRsMerged")]
  pub total_prs_merged: u64,
  #[serde(rename = "mergedPRsPercentage", default)]
  pub merged_prs_percentage: f64,
  pub total_reviews: u64,
  pub total_commits: u64,
  pub total_issues: u64,
  pub total_stars: u64,
  #[serde(default)]
  pub total_discussions_started: u64,
  #[serde(default)]
  pub total_discussions_answered: u64,
  pub contributed_to: u64,
  pub rank: Rank,
}

/// Overall rank, e.g. level "A+" at the 12.5th percentile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rank {
  pub level: String,
  pub percentile: f64,
}

/// Bytes of code written in one language across a user's repositories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
  pub name: String,
  pub color: Option<String>,
  pub size: u64,
  #[serde(default)]
  pub count: u32,
}

/// Languages ordered by size, largest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopLanguages {
  pub languages: Vec<Language>,
}

impl TopLanguages {
  /// Number of languages shown on the dashboard
  pub const SHOWN: usize = 10;

  pub fn top(&self, n: usize) -> &[Language] {
    &self.languages[..n.min(self.languages.len())]
  }

  /// Size of every language, not only the shown ones.
  pub fn total_size(&self) -> u64 {
    self.languages.iter().fold(0u64, |acc, l| acc.saturating_add(l.size))
  }

  /// Percentage of the total size, 0 when there is no code at all.
  pub fn share(&self, language: &Language) -> f64 {
    match self.total_size() {
      0 => 0.0,
      total => language.size as f64 / total as f64 * 100.0,
    }
  }
}

impl From<HashMap<String, Language>> for TopLanguages {
  fn from(map: HashMap<String, Language>) -> Self {
    let mut languages: Vec<Language> = map.into_values().collect();
    languages.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));
    Self { languages }
  }
}
