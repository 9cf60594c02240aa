// Contribution calendar client.
// Reads a user's daily GitHub contribution counts from a public calendar service.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use color_eyre::eyre::eyre;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::config::{ContributionsConfig, GitHubConfig};
use crate::error::Result;
use crate::fetch::ActivityFetcher;
use crate::streak::ContributionCalendar;

use super::api_types::ApiContributions;
use super::client::{check_response, endpoint, REQUEST_TIMEOUT};

#[derive(Clone)]
pub struct ContributionsClient {
  client: Client,
  base_url: Url,
}

impl ContributionsClient {
  pub fn new(config: &ContributionsConfig, github: &GitHubConfig) -> color_eyre::Result<Self> {
    let client = Client::builder()
      .user_agent(github.user_agent.clone())
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let base_url = Url::parse(&config.api_url)
      .map_err(|e| eyre!("Invalid contributions API url {}: {}", config.api_url, e))?;

    Ok(Self { client, base_url })
  }

  /// Get the flat contribution calendar up to and including `to`.
  pub async fn get_calendar(&self, username: &str, to: NaiveDate) -> Result<ContributionCalendar> {
    let mut url = endpoint(&self.base_url, &[&format!("{}.json", username)])?;
    url
      .query_pairs_mut()
      .append_pair("flat", "true")
      .append_pair("to", &to.format("%Y-%m-%d").to_string());

    debug!(%url, "GET");
    let response = self.client.get(url).send().await?;
    let response: ApiContributions = check_response(response).await?.json().await?;

    Ok(response.into())
  }
}

#[async_trait]
impl ActivityFetcher for ContributionsClient {
  fn source(&self) -> &'static str {
    "github"
  }

  async fn fetch_activity(&self, username: &str) -> Result<ContributionCalendar> {
    self.get_calendar(username, Local::now().date_naive()).await
  }
}
