//! Cache keys and payload rules for dashboard data.

use sha2::{Digest, Sha256};

use crate::cache::{CacheKey, Payload};
use crate::github::types::{ActivityEvent, GithubStats, TopLanguages, UserProfile};
use crate::streak::ContributionCalendar;

/// Everything the dashboard keeps in persistence.
///
/// Usernames are compared case-insensitively, matching GitHub logins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardKey {
  /// The stored username of the session
  Username,
  Profile { username: String },
  Events { username: String },
  Calendar { source: String, username: String },
  Stats { username: String },
  Languages { username: String },
  /// The focus board todo list
  Todos,
}

impl DashboardKey {
  pub fn profile(username: &str) -> Self {
    DashboardKey::Profile {
      username: username.to_lowercase(),
    }
  }

  pub fn events(username: &str) -> Self {
    DashboardKey::Events {
      username: username.to_lowercase(),
    }
  }

  pub fn calendar(source: &str, username: &str) -> Self {
    DashboardKey::Calendar {
      source: source.to_string(),
      username: username.to_lowercase(),
    }
  }

  pub fn stats(username: &str) -> Self {
    DashboardKey::Stats {
      username: username.to_lowercase(),
    }
  }

  pub fn languages(username: &str) -> Self {
    DashboardKey::Languages {
      username: username.to_lowercase(),
    }
  }

  fn raw(&self) -> String {
    match self {
      DashboardKey::Username => "username".to_string(),
      DashboardKey::Profile { username } => format!("profile:{}", username.to_lowercase()),
      DashboardKey::Events { username } => format!("events:{}", username.to_lowercase()),
      DashboardKey::Calendar { source, username } => {
        format!("calendar:{}:{}", source, username.to_lowercase())
      }
      DashboardKey::Stats { username } => format!("stats:{}", username.to_lowercase()),
      DashboardKey::Languages { username } => format!("languages:{}", username.to_lowercase()),
      DashboardKey::Todos => "focus-todos".to_string(),
    }
  }
}

impl CacheKey for DashboardKey {
  fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.raw().as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    match self {
      DashboardKey::Username => "stored username".to_string(),
      DashboardKey::Profile { username } => format!("profile of {}", username),
      DashboardKey::Events { username } => format!("events of {}", username),
      DashboardKey::Calendar { source, username } => {
        format!("{} calendar of {}", source, username)
      }
      DashboardKey::Stats { username } => format!("stats of {}", username),
      DashboardKey::Languages { username } => format!("top languages of {}", username),
      DashboardKey::Todos => "focus todos".to_string(),
    }
  }
}

impl Payload for UserProfile {
  fn validate(&self) -> Result<(), String> {
    if self.login.trim().is_empty() {
      return Err("profile has no login".to_string());
    }
    Ok(())
  }
}

impl Payload for ActivityEvent {}

impl Payload for ContributionCalendar {}

impl Payload for GithubStats {
  fn validate(&self) -> Result<(), String> {
    let percentile = self.rank.percentile;
    if !(0.0..=100.0).contains(&percentile) {
      return Err(format!("rank percentile {} is outside 0..=100", percentile));
    }
    Ok(())
  }
}

impl Payload for TopLanguages {}
