// Readme-stats client.
// Reads aggregate stats and language sizes from a github-readme-stats deployment.

use async_trait::async_trait;
use color_eyre::eyre::eyre;
use reqwest::Client;
use std::collections::HashMap;
use tracing::debug;
use url::Url;

use crate::config::{GitHubConfig, StatsConfig};
use crate::error::Result;
use crate::fetch::StatsFetcher;

use super::client::{check_response, endpoint, REQUEST_TIMEOUT};
use super::types::{GithubStats, Language, TopLanguages};

#[derive(Clone)]
pub struct ReadmeStatsClient {
  client: Client,
  base_url: Url,
}

impl ReadmeStatsClient {
  pub fn new(config: &StatsConfig, github: &GitHubConfig) -> color_eyre::Result<Self> {
    let client = Client::builder()
      .user_agent(github.user_agent.clone())
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let base_url = Url::parse(&config.api_url)
      .map_err(|e| eyre!("Invalid readme-stats url {}: {}", config.api_url, e))?;

    Ok(Self { client, base_url })
  }

  fn user_endpoint(&self, name: &str, username: &str) -> Result<Url> {
    let mut url = endpoint(&self.base_url, &["api", name])?;
    url.query_pairs_mut().append_pair("username", username);
    Ok(url)
  }

  pub async fn get_stats(&self, username: &str) -> Result<GithubStats> {
    let url = self.user_endpoint("json-stats", username)?;
    debug!(%url, "GET");
    let response = self.client.get(url).send().await?;
    Ok(check_response(response).await?.json().await?)
  }

  /// Languages keyed by name in the response, returned largest first.
  pub async fn get_top_languages(&self, username: &str) -> Result<TopLanguages> {
    let url = self.user_endpoint("json-top-langs", username)?;
    debug!(%url, "GET");
    let response = self.client.get(url).send().await?;
    let languages: HashMap<String, Language> = check_response(response).await?.json().await?;
    Ok(languages.into())
  }
}

#[async_trait]
impl StatsFetcher for ReadmeStatsClient {
  async fn fetch_stats(&self, username: &str) -> Result<GithubStats> {
    self.get_stats(username).await
  }

  async fn fetch_top_languages(&self, username: &str) -> Result<TopLanguages> {
    self.get_top_languages(username).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::DashError;
  use httpmock::prelude::*;

  fn client_for(server: &MockServer) -> ReadmeStatsClient {
    let config = StatsConfig {
      api_url: server.base_url(),
    };
    ReadmeStatsClient::new(&config, &GitHubConfig::default()).unwrap()
  }

  #[tokio::test]
  async fn test_get_stats() {
    let server = MockServer::start_async().await;
    let mock = server
      .mock_async(|when, then| {
        when
          .method(GET)
          .path("/api/json-stats")
          .query_param("username", "octocat");
        then.status(200).header("content-type", "application/json").body(
          r#"{
            "name": "The Octocat",
            "totalPRs": 4,
            "totalPRsMerged": 3,
            "mergedPRsPercentage": 75.0,
            "totalReviews": 0,
            "totalCommits": 120,
            "totalIssues": 2,
            "totalStars": 9000,
            "contributedTo": 11,
            "rank": {"level": "S", "percentile": 1.2}
          }"#,
        );
      })
      .await;

    let stats = client_for(&server).fetch_stats("octocat").await.unwrap();

    mock.assert_async().await;
    assert_eq!(stats.total_stars, 9000);
    assert_eq!(stats.total_discussions_started, 0);
    assert_eq!(stats.rank.level, "S");
  }

  #[tokio::test]
  async fn test_get_top_languages() {
    let server = MockServer::start_async().await;
    let mock = server
      .mock_async(|when, then| {
        when
          .method(GET)
          .path("/api/json-top-langs")
          .query_param("username", "octocat");
        then.status(200).header("content-type", "application/json").body(
          r##"{
            "Ruby": {"name": "Ruby", "color": "#701516", "size": 300, "count": 2},
            "Rust": {"name": "Rust", "color": "#dea584", "size": 700, "count": 5}
          }"##,
        );
      })
      .await;

    let langs = client_for(&server)
      .fetch_top_languages("octocat")
      .await
      .unwrap();

    mock.assert_async().await;
    assert_eq!(langs.languages[0].name, "Rust");
    assert_eq!(langs.languages[0].color.as_deref(), Some("#dea584"));
    assert_eq!(langs.share(&langs.languages[1]), 30.0);
  }

  #[tokio::test]
  async fn test_server_error_is_fetch_failure() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/api/json-stats");
        then.status(500).body("boom");
      })
      .await;

    let result = client_for(&server).fetch_stats("octocat").await;

    assert!(matches!(result, Err(DashError::FetchFailure(_))));
  }
}
