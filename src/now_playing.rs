// Now-playing client.
// Reads the currently playing Spotify track from a public JSON card service.

use color_eyre::eyre::eyre;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::config::{GitHubConfig, NowPlayingConfig};
use crate::error::Result;
use crate::github::client::{check_response, REQUEST_TIMEOUT};

/// Track currently playing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
  pub title: String,
  pub artists: Vec<String>,
  pub album: Option<String>,
  pub cover_url: Option<String>,
  pub url: Option<String>,
}

impl Track {
  pub fn artist_names(&self) -> String {
    self.artists.join(", ")
  }
}

#[derive(Debug, Deserialize)]
struct ApiNowPlaying {
  #[serde(default)]
  is_playing: bool,
  raw: Option<ApiPlayback>,
}

#[derive(Debug, Deserialize)]
struct ApiPlayback {
  item: Option<ApiItem>,
}

#[derive(Debug, Deserialize)]
struct ApiItem {
  name: String,
  album: Option<ApiAlbum>,
  #[serde(default)]
  artists: Vec<ApiNamed>,
  external_urls: Option<ApiExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct ApiAlbum {
  name: String,
  #[serde(default)]
  images: Vec<ApiImage>,
}

#[derive(Debug, Deserialize)]
struct ApiNamed {
  name: String,
}

#[derive(Debug, Deserialize)]
struct ApiImage {
  url: String,
}

#[derive(Debug, Deserialize)]
struct ApiExternalUrls {
  spotify: Option<String>,
}

impl ApiNowPlaying {
  /// Nothing is playing unless the flag is set and an item is present.
  fn into_track(self) -> Option<Track> {
    if !self.is_playing {
      return None;
    }
    let item = self.raw?.item?;
    let (album, cover_url) = match item.album {
      Some(album) => (
        Some(album.name),
        album.images.into_iter().next().map(|i| i.url),
      ),
      None => (None, None),
    };

    Some(Track {
      title: item.name,
      artists: item.artists.into_iter().map(|a| a.name).collect(),
      album,
      cover_url,
      url: item.external_urls.and_then(|u| u.spotify),
    })
  }
}

#[derive(Clone)]
pub struct NowPlayingClient {
  client: Client,
  url: Url,
}

impl NowPlayingClient {
  pub fn new(config: &NowPlayingConfig, github: &GitHubConfig) -> color_eyre::Result<Self> {
    let client = Client::builder()
      .user_agent(github.user_agent.clone())
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    let url = Url::parse(&config.url)
      .map_err(|e| eyre!("Invalid now-playing url {}: {}", config.url, e))?;

    Ok(Self { client, url })
  }

  /// The playing track, or `None` when playback is paused or stopped.
  pub async fn current(&self) -> Result<Option<Track>> {
    debug!(url = %self.url, "GET");
    let response = self.client.get(self.url.clone()).send().await?;
    let playing: ApiNowPlaying = check_response(response).await?.json().await?;
    Ok(playing.into_track())
  }
}
