// Error types for the dashboard core.
// Covers remote fetch failures, payload validation, and persistence errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashError {
  #[error("fetch failed: {0}")]
  FetchFailure(String),

  #[error("invalid payload: {0}")]
  InvalidPayload(String),

  #[error("storage unavailable: {0}")]
  StorageUnavailable(String),

  #[error("no username stored")]
  NoUsername,

  #[error("no todo with id {0}")]
  UnknownTodo(i64),

  #[error("failed to encode cache entry: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for DashError {
  fn from(err: reqwest::Error) -> Self {
    DashError::FetchFailure(err.to_string())
  }
}

impl From<rusqlite::Error> for DashError {
  fn from(err: rusqlite::Error) -> Self {
    DashError::StorageUnavailable(err.to_string())
  }
}

pub type Result<T> = std::result::Result<T, DashError>;
