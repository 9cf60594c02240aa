// GitHub REST API client.
// Fetches public profile, social account, and event data for a username.

use async_trait::async_trait;
use color_eyre::eyre::eyre;
use reqwest::{
  header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
  Client, Response, StatusCode,
};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::GitHubConfig;
use crate::error::{DashError, Result};
use crate::fetch::{EventsFetcher, ProfileFetcher};

use super::api_types::{ApiEvent, ApiUser};
use super::types::{ActivityEvent, SocialAccount, UserProfile};

const GITHUB_API_VERSION: &str = "2022-11-28";
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub API client
#[derive(Clone)]
pub struct GitHubClient {
  client: Client,
  base_url: Url,
}

impl GitHubClient {
  /// Create a client; `token` is optional since all endpoints used are public.
  pub fn new(config: &GitHubConfig, token: Option<&str>) -> color_eyre::Result<Self> {
    let mut headers = HeaderMap::new();

    if let Some(token) = token {
      headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token))
          .map_err(|e| eyre!("Invalid GitHub token: {}", e))?,
      );
    }
    headers.insert(
      ACCEPT,
      HeaderValue::from_static("application/vnd.github+json"),
    );
    headers.insert(
      "X-GitHub-Api-Version",
      HeaderValue::from_static(GITHUB_API_VERSION),
    );
    headers.insert(
      USER_AGENT,
      HeaderValue::from_str(&config.user_agent)
        .map_err(|e| eyre!("Invalid user agent {:?}: {}", config.user_agent, e))?,
    );

    let client = Client::builder()
      .default_headers(headers)
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let base_url = Url::parse(&config.api_url)
      .map_err(|e| eyre!("Invalid GitHub API url {}: {}", config.api_url, e))?;

    Ok(Self { client, base_url })
  }

  /// Build a URL under the API base from path segments (each segment is escaped).
  fn endpoint(&self, segments: &[&str]) -> Result<Url> {
    endpoint(&self.base_url, segments)
  }

  /// Make a GET request to the GitHub API.
  async fn get(&self, url: Url) -> Result<Response> {
    debug!(%url, "GET");
    let response = self.client.get(url).send().await?;
    check_response(response).await
  }

  /// Get a user's public profile.
  pub async fn get_user(&self, username: &str) -> Result<UserProfile> {
    let url = self.endpoint(&["users", username])?;
    let user: ApiUser = self.get(url).await?.json().await?;
    Ok(user.into_profile())
  }

  /// Get the social accounts linked on a user's profile.
  pub async fn get_social_accounts(&self, username: &str) -> Result<Vec<SocialAccount>> {
    let url = self.endpoint(&["users", username, "social_accounts"])?;
    let accounts: Vec<SocialAccount> = self.get(url).await?.json().await?;
    Ok(accounts)
  }

  /// Get a user's most recent public events.
  pub async fn get_events(&self, username: &str, per_page: u32) -> Result<Vec<ActivityEvent>> {
    let mut url = self.endpoint(&["users", username, "events"])?;
    url
      .query_pairs_mut()
      .append_pair("per_page", &per_page.to_string());

    let response = self.get(url).await?;
    if response.status() == StatusCode::NO_CONTENT {
      warn!(username, "GitHub returned no content for events");
      return Ok(Vec::new());
    }

    let events: Vec<ApiEvent> = response.json().await?;
    Ok(events.into_iter().map(ActivityEvent::from).collect())
  }
}

#[async_trait]
impl ProfileFetcher for GitHubClient {
  async fn fetch_profile(&self, username: &str) -> Result<UserProfile> {
    self.get_user(username).await
  }

  async fn fetch_social_accounts(&self, username: &str) -> Result<Vec<SocialAccount>> {
    self.get_social_accounts(username).await
  }
}

#[async_trait]
impl EventsFetcher for GitHubClient {
  async fn fetch_events(&self, username: &str, per_page: u32) -> Result<Vec<ActivityEvent>> {
    self.get_events(username, per_page).await
  }
}

/// Append escaped path segments to `base`.
pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url> {
  let mut url = base.clone();
  url
    .path_segments_mut()
    .map_err(|_| DashError::FetchFailure(format!("cannot build request url from {}", base)))?
    .pop_if_empty()
    .extend(segments);
  Ok(url)
}

/// Check response status and convert errors.
pub(crate) async fn check_response(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let rate_limited = matches!(
    status,
    StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
  ) && header_value(&response, "x-ratelimit-remaining") == Some("0");

  if rate_limited {
    let reset_at = header_value(&response, "x-ratelimit-reset")
      .and_then(|v| v.parse::<i64>().ok())
      .and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
      .map(|dt| dt.format("%H:%M:%S UTC").to_string())
      .unwrap_or_else(|| "unknown".to_string());
    return Err(DashError::FetchFailure(format!(
      "rate limit exceeded, resets at {}",
      reset_at
    )));
  }

  match status {
    StatusCode::UNAUTHORIZED => Err(DashError::FetchFailure(
      "authentication failed: invalid or expired token".to_string(),
    )),
    StatusCode::NOT_FOUND => Err(DashError::FetchFailure(format!(
      "not found: {}",
      response.url()
    ))),
    status => Err(DashError::FetchFailure(format!(
      "HTTP {}: {}",
      status,
      response.text().await.unwrap_or_default()
    ))),
  }
}

fn header_value<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
  response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
  use super::*;
  use httpmock::prelude::*;

  fn client_for(server: &MockServer, token: Option<&str>) -> GitHubClient {
    let config = GitHubConfig {
      api_url: server.base_url(),
      user_agent: "ghdash-test".to_string(),
    };
    GitHubClient::new(&config, token).unwrap()
  }

  #[tokio::test]
  async fn test_fetch_profile() {
    let server = MockServer::start_async().await;
    let mock = server
      .mock_async(|when, then| {
        when.method(GET).path("/users/octocat");
        then
          .status(200)
          .header("content-type", "application/json")
          .body(r#"{"login": "octocat", "id": 1, "name": "The Octocat", "followers": 3}"#);
      })
      .await;

    let profile = client_for(&server, None)
      .fetch_profile("octocat")
      .await
      .unwrap();

    mock.assert_async().await;
    assert_eq!(profile.login, "octocat");
    assert_eq!(profile.display_name(), "The Octocat");
    assert_eq!(profile.followers, 3);
  }

  #[tokio::test]
  async fn test_token_is_sent_as_bearer() {
    let server = MockServer::start_async().await;
    let mock = server
      .mock_async(|when, then| {
        when
          .method(GET)
          .path("/users/octocat/social_accounts")
          .header("authorization", "Bearer secret")
          .header("user-agent", "ghdash-test");
        then
          .status(200)
          .header("content-type", "application/json")
          .body(r#"[{"provider": "twitter", "url": "https://twitter.com/github"}]"#);
      })
      .await;

    let accounts = client_for(&server, Some("secret"))
      .fetch_social_accounts("octocat")
      .await
      .unwrap();

    mock.assert_async().await;
    assert_eq!(
      accounts,
      vec![SocialAccount {
        provider: "twitter".to_string(),
        url: "https://twitter.com/github".to_string(),
      }]
    );
  }

  #[tokio::test]
  async fn test_fetch_events() {
    let server = MockServer::start_async().await;
    let mock = server
      .mock_async(|when, then| {
        when
          .method(GET)
          .path("/users/octocat/events")
          .query_param("per_page", "7");
        then.status(200).header("content-type", "application/json").body(
          r#"[{
            "id": "1",
            "type": "PushEvent",
            "repo": {"name": "octocat/hello"},
            "actor": {"login": "octocat", "avatar_url": null},
            "created_at": "2024-03-10T12:00:00Z"
          }]"#,
        );
      })
      .await;

    let events = client_for(&server, None)
      .fetch_events("octocat", 7)
      .await
      .unwrap();

    mock.assert_async().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].repo, "octocat/hello");
    assert_eq!(events[0].kind(), crate::github::EventKind::Push);
  }

  #[tokio::test]
  async fn test_no_content_events_is_empty() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/users/quiet/events");
        then.status(204);
      })
      .await;

    let events = client_for(&server, None)
      .fetch_events("quiet", 7)
      .await
      .unwrap();

    assert!(events.is_empty());
  }

  #[tokio::test]
  async fn test_not_found_is_fetch_failure() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/users/nobody");
        then.status(404).body(r#"{"message": "Not Found"}"#);
      })
      .await;

    let result = client_for(&server, None).fetch_profile("nobody").await;

    match result {
      Err(DashError::FetchFailure(msg)) => assert!(msg.contains("not found"), "{}", msg),
      other => panic!("expected fetch failure, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_rate_limit_is_reported() {
    let server = MockServer::start_async().await;
    server
      .mock_async(|when, then| {
        when.method(GET).path("/users/octocat");
        then
          .status(403)
          .header("x-ratelimit-remaining", "0")
          .header("x-ratelimit-reset", "1700000000")
          .body("{}");
      })
      .await;

    let err = client_for(&server, None)
      .fetch_profile("octocat")
      .await
      .unwrap_err();

    assert!(err.to_string().contains("rate limit exceeded"), "{}", err);
    assert!(err.to_string().contains("22:13:20"), "{}", err);
  }

  #[test]
  fn test_endpoint_escapes_segments() {
    let base = Url::parse("https://api.github.com").unwrap();
    let url = endpoint(&base, &["users", "a/b"]).unwrap();
    assert_eq!(url.as_str(), "https://api.github.com/users/a%2Fb");
  }
}
