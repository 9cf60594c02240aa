// LeetCode submission calendar client.
// Fetches daily submission counts through LeetCode's public GraphQL endpoint.

use async_trait::async_trait;
use chrono::DateTime;
use color_eyre::eyre::eyre;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::config::{GitHubConfig, LeetCodeConfig};
use crate::error::{DashError, Result};
use crate::fetch::ActivityFetcher;
use crate::github::client::{check_response, REQUEST_TIMEOUT};
use crate::streak::ContributionCalendar;

const CALENDAR_QUERY: &str = "query userProfileCalendar($username: String!) {
  matchedUser(username: $username) {
    userCalendar {
      streak
      totalActiveDays
      submissionCalendar
    }
  }
}";

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
  data: Option<CalendarData>,
  #[serde(default)]
  errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
  message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarData {
  matched_user: Option<MatchedUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchedUser {
  user_calendar: Option<UserCalendar>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserCalendar {
  /// JSON object encoded as a string: epoch seconds -> submission count
  submission_calendar: String,
}

#[derive(Clone)]
pub struct LeetCodeClient {
  client: Client,
  graphql_url: Url,
}

impl LeetCodeClient {
  pub fn new(config: &LeetCodeConfig, github: &GitHubConfig) -> color_eyre::Result<Self> {
    let client = Client::builder()
      .user_agent(github.user_agent.clone())
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let graphql_url = Url::parse(&config.graphql_url)
      .map_err(|e| eyre!("Invalid LeetCode url {}: {}", config.graphql_url, e))?;

    Ok(Self {
      client,
      graphql_url,
    })
  }

  /// Get a user's submission calendar.
  pub async fn get_calendar(&self, username: &str) -> Result<ContributionCalendar> {
    let body = json!({
      "query": CALENDAR_QUERY,
      "variables": { "username": username },
    });

    debug!(url = %self.graphql_url, username, "POST userProfileCalendar");
    let response = self
      .client
      .post(self.graphql_url.clone())
      .json(&body)
      .send()
      .await?;
    let response: GraphQlResponse = check_response(response).await?.json().await?;

    let calendar = response
      .data
      .and_then(|d| d.matched_user)
      .and_then(|u| u.user_calendar)
      .ok_or_else(|| match response.errors.first() {
        Some(err) => DashError::InvalidPayload(err.message.clone()),
        None => DashError::InvalidPayload(format!("unknown LeetCode user {}", username)),
      })?;

    parse_submission_calendar(&calendar.submission_calendar)
  }
}

#[async_trait]
impl ActivityFetcher for LeetCodeClient {
  fn source(&self) -> &'static str {
    "leetcode"
  }

  async fn fetch_activity(&self, username: &str) -> Result<ContributionCalendar> {
    self.get_calendar(username).await
  }
}

/// Decode the submission calendar string into UTC calendar days.
///
/// The total is the sum of all submissions.
pub fn parse_submission_calendar(raw: &str) -> Result<ContributionCalendar> {
  let entries: HashMap<String, u32> = serde_json::from_str(raw)
    .map_err(|e| DashError::InvalidPayload(format!("bad submission calendar: {}", e)))?;

  let mut calendar = ContributionCalendar::default();
  for (timestamp, count) in entries {
    let date = timestamp
      .parse::<i64>()
      .ok()
      .and_then(|ts| DateTime::from_timestamp(ts, 0))
      .map(|dt| dt.date_naive())
      .ok_or_else(|| DashError::InvalidPayload(format!("bad calendar timestamp {}", timestamp)))?;

    calendar.add(date, count);
    calendar.total = calendar.total.saturating_add(u64::from(count));
  }

  Ok(calendar)
}
