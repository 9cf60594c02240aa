use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::poll::DEFAULT_POLL_INTERVAL;
use crate::cache::Ttl;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub github: GitHubConfig,
  #[serde(default)]
  pub contributions: ContributionsConfig,
  #[serde(default)]
  pub leetcode: LeetCodeConfig,
  #[serde(default)]
  pub stats: StatsConfig,
  #[serde(default)]
  pub now_playing: NowPlayingConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
  #[serde(default = "default_github_api_url")]
  pub api_url: String,
  #[serde(default = "default_user_agent")]
  pub user_agent: String,
}

impl Default for GitHubConfig {
  fn default() -> Self {
    Self {
      api_url: default_github_api_url(),
      user_agent: default_user_agent(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContributionsConfig {
  /// Service returning a flat contribution calendar for a GitHub user
  #[serde(default = "default_contributions_api_url")]
  pub api_url: String,
}

impl Default for ContributionsConfig {
  fn default() -> Self {
    Self {
      api_url: default_contributions_api_url(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeetCodeConfig {
  #[serde(default = "default_leetcode_graphql_url")]
  pub graphql_url: String,
  /// LeetCode handle (no LeetCode streak when unset)
  pub username: Option<String>,
}

impl Default for LeetCodeConfig {
  fn default() -> Self {
    Self {
      graphql_url: default_leetcode_graphql_url(),
      username: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
  /// readme-stats deployment serving `/api/json-stats` and `/api/json-top-langs`
  #[serde(default = "default_stats_api_url")]
  pub api_url: String,
}

impl Default for StatsConfig {
  fn default() -> Self {
    Self {
      api_url: default_stats_api_url(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NowPlayingConfig {
  /// JSON endpoint reporting the currently playing Spotify track
  #[serde(default = "default_now_playing_url")]
  pub url: String,
  #[serde(default = "default_now_playing_interval")]
  pub poll_interval_secs: u64,
}

impl Default for NowPlayingConfig {
  fn default() -> Self {
    Self {
      url: default_now_playing_url(),
      poll_interval_secs: default_now_playing_interval(),
    }
  }
}

impl NowPlayingConfig {
  pub fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_secs.max(1))
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Store location (default: $XDG_DATA_HOME/ghdash/store.db)
  pub path: Option<PathBuf>,
  #[serde(default = "default_profile_ttl")]
  pub profile_ttl_minutes: i64,
  #[serde(default = "default_activity_ttl")]
  pub activity_ttl_minutes: i64,
  #[serde(default = "default_activity_ttl")]
  pub calendar_ttl_minutes: i64,
  #[serde(default = "default_profile_ttl")]
  pub stats_ttl_minutes: i64,
  #[serde(default = "default_poll_interval")]
  pub poll_interval_secs: u64,
  /// Serve stale data when a refetch fails
  #[serde(default)]
  pub serve_stale_on_error: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      path: None,
      profile_ttl_minutes: default_profile_ttl(),
      activity_ttl_minutes: default_activity_ttl(),
      calendar_ttl_minutes: default_activity_ttl(),
      stats_ttl_minutes: default_profile_ttl(),
      poll_interval_secs: default_poll_interval(),
      serve_stale_on_error: false,
    }
  }
}

impl CacheConfig {
  pub fn poll_interval(&self) -> Duration {
    Duration::from_secs(self.poll_interval_secs.max(1))
  }

  pub fn profile_ttl(&self) -> Result<Ttl> {
    ttl_minutes("profile_ttl_minutes", self.profile_ttl_minutes)
  }

  pub fn activity_ttl(&self) -> Result<Ttl> {
    ttl_minutes("activity_ttl_minutes", self.activity_ttl_minutes)
  }

  pub fn calendar_ttl(&self) -> Result<Ttl> {
    ttl_minutes("calendar_ttl_minutes", self.calendar_ttl_minutes)
  }

  pub fn stats_ttl(&self) -> Result<Ttl> {
    ttl_minutes("stats_ttl_minutes", self.stats_ttl_minutes)
  }
}

fn ttl_minutes(field: &str, minutes: i64) -> Result<Ttl> {
  if minutes < 0 {
    return Err(eyre!("cache.{} must not be negative, got {}", field, minutes));
  }
  Ttl::try_minutes(minutes).ok_or_else(|| eyre!("cache.{} is out of range: {}", field, minutes))
}

fn default_github_api_url() -> String {
  "https://api.github.com".to_string()
}

fn default_user_agent() -> String {
  concat!("ghdash/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_contributions_api_url() -> String {
  "https://github-contributions-api.deno.dev".to_string()
}

fn default_leetcode_graphql_url() -> String {
  "https://leetcode.com/graphql".to_string()
}

fn default_stats_api_url() -> String {
  "https://github-readme-states-repo-self-inst.vercel.app".to_string()
}

fn default_now_playing_url() -> String {
  "https://sp-card-t.vercel.app/json".to_string()
}

fn default_now_playing_interval() -> u64 {
  10
}

fn default_profile_ttl() -> i64 {
  60
}

fn default_activity_ttl() -> i64 {
  15
}

fn default_poll_interval() -> u64 {
  DEFAULT_POLL_INTERVAL.as_secs()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./ghdash.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/ghdash/config.yaml
  ///
  /// Without any file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("ghdash.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("ghdash").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Invalid config file {}: {}", path.display(), e))
  }

  /// Parse and validate a config document.
  fn parse(contents: &str) -> Result<Self> {
    // An empty file parses as null
    let config: Self = if contents.trim().is_empty() {
      Self::default()
    } else {
      serde_yaml::from_str(contents)?
    };

    config.validate()?;
    Ok(config)
  }

  fn validate(&self) -> Result<()> {
    self.cache.profile_ttl()?;
    self.cache.activity_ttl()?;
    self.cache.calendar_ttl()?;
    self.cache.stats_ttl()?;
    Ok(())
  }

  /// Get the GitHub API token from environment variables, if any.
  ///
  /// Checks GHDASH_GITHUB_TOKEN first, then GITHUB_TOKEN as fallback.
  /// Unauthenticated requests work with a lower rate limit.
  pub fn get_github_token() -> Option<String> {
    std::env::var("GHDASH_GITHUB_TOKEN")
      .or_else(|_| std::env::var("GITHUB_TOKEN"))
      .ok()
      .filter(|t| !t.is_empty())
  }

  /// Directory for log files.
  pub fn log_dir(&self) -> PathBuf {
    match &self.cache.path {
      Some(p) => p.parent().map(Path::to_path_buf).unwrap_or_default(),
      None => dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
        .unwrap_or_default()
        .join("ghdash"),
    }
  }
}
