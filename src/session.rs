//! The dashboard user session.
//!
//! Holds the configured GitHub username and the cached profile for it. State
//! changes are published on a watch channel so a caller can render a loading
//! indicator while the profile is fetched.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::cache::{CacheKey, CacheLayer, Payload, Persistence, Ttl};
use crate::error::{DashError, Result};
use crate::fetch::ProfileFetcher;
use crate::github::types::UserProfile;
use crate::keys::DashboardKey;

/// Default freshness of a cached profile
pub const DEFAULT_PROFILE_TTL_MINUTES: i64 = 60;

/// The state of the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
  /// No username stored
  Unconfigured,
  /// Profile is being loaded
  Loading,
  /// Profile loaded
  Ready(UserProfile),
  /// The last load failed
  Error(String),
}

impl SessionState {
  pub fn is_loading(&self) -> bool {
    matches!(self, SessionState::Loading)
  }

  pub fn profile(&self) -> Option<&UserProfile> {
    match self {
      SessionState::Ready(profile) => Some(profile),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      SessionState::Error(e) => Some(e),
      _ => None,
    }
  }
}

pub struct UserSessionStore<S: Persistence, P: ProfileFetcher> {
  cache: CacheLayer<S>,
  fetcher: Arc<P>,
  profile_ttl: Ttl,
  state: watch::Sender<SessionState>,
}

impl<S: Persistence, P: ProfileFetcher> UserSessionStore<S, P> {
  pub fn new(cache: CacheLayer<S>, fetcher: Arc<P>) -> Self {
    let (state, _) = watch::channel(SessionState::Unconfigured);
    Self {
      cache,
      fetcher,
      profile_ttl: Ttl::minutes(DEFAULT_PROFILE_TTL_MINUTES),
      state,
    }
  }

  pub fn with_profile_ttl(mut self, ttl: Ttl) -> Self {
    self.profile_ttl = ttl;
    self
  }

  /// Receive every state change from now on.
  pub fn subscribe(&self) -> watch::Receiver<SessionState> {
    self.state.subscribe()
  }

  /// The username in persistence, if any.
  pub fn username(&self) -> Result<Option<String>> {
    let stored = self
      .cache
      .storage()
      .read(&DashboardKey::Username.cache_hash())?;
    Ok(stored.filter(|name| !name.is_empty()))
  }

  /// Store a new username and load its profile.
  pub async fn set_username(&mut self, name: &str) -> Result<UserProfile> {
    let name = name.trim();
    if name.is_empty() {
      return Err(self.fail(DashError::InvalidPayload("username is empty".to_string())));
    }

    if let Err(e) = self
      .cache
      .storage()
      .write(&DashboardKey::Username.cache_hash(), name)
    {
      return Err(self.fail(e));
    }
    info!(username = name, "username stored");

    self.publish(SessionState::Loading);
    self.load_user().await
  }

  /// Load the profile of the stored username, from cache when fresh.
  pub async fn load_user(&mut self) -> Result<UserProfile> {
    let username = match self.username() {
      Ok(Some(name)) => name,
      Ok(None) => return Err(self.fail(DashError::NoUsername)),
      Err(e) => return Err(self.fail(e)),
    };

    self.publish(SessionState::Loading);

    let key = DashboardKey::profile(&username);
    let fetcher = self.fetcher.as_ref();
    let result = self
      .cache
      .get(&key, self.profile_ttl, || fetch_profile(fetcher, &username))
      .await;

    match result {
      Ok(result) => {
        info!(username = %username, source = ?result.source, "profile ready");
        self.publish(SessionState::Ready(result.data.clone()));
        Ok(result.data)
      }
      Err(e) => Err(self.fail(e)),
    }
  }

  /// Drop the cached profile and load it again.
  pub async fn refresh(&mut self) -> Result<UserProfile> {
    let invalidated = match self.username() {
      Ok(Some(name)) => self.cache.invalidate(&DashboardKey::profile(&name)),
      Ok(None) => Ok(()),
      Err(e) => Err(e),
    };
    if let Err(e) = invalidated {
      return Err(self.fail(e));
    }

    self.load_user().await
  }

  /// Forget the username and its cached profile.
  pub fn remove(&mut self) -> Result<()> {
    if let Some(name) = self.username()? {
      self.cache.invalidate(&DashboardKey::profile(&name))?;
    }
    self
      .cache
      .storage()
      .delete(&DashboardKey::Username.cache_hash())?;

    info!("session removed");
    self.publish(SessionState::Unconfigured);
    Ok(())
  }

  fn publish(&self, state: SessionState) {
    self.state.send_replace(state);
  }

  fn fail(&self, err: DashError) -> DashError {
    warn!(error = %err, "session load failed");
    self.publish(SessionState::Error(err.to_string()));
    err
  }
}

async fn fetch_profile<P: ProfileFetcher + ?Sized>(
  fetcher: &P,
  username: &str,
) -> Result<UserProfile> {
  let mut profile = fetcher.fetch_profile(username).await?;
  profile.validate().map_err(DashError::InvalidPayload)?;

  // Best effort: a profile without social accounts is still usable, so a
  // failure here only leaves the field absent.
  match fetcher.fetch_social_accounts(username).await {
    Ok(accounts) => profile.social_accounts = Some(accounts),
    Err(e) => warn!(username, error = %e, "social accounts unavailable"),
  }

  Ok(profile)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::testing::MemoryStorage;
  use crate::github::types::SocialAccount;
  use async_trait::async_trait;
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
  use tokio::sync::Notify;

  #[derive(Default)]
  struct FakeProfiles {
    profile_calls: AtomicUsize,
    social_calls: AtomicUsize,
    fail_social: AtomicBool,
    fail_profile: AtomicBool,
    empty_login: AtomicBool,
    gate: Option<Arc<Notify>>,
  }

  #[async_trait]
  impl ProfileFetcher for FakeProfiles {
    async fn fetch_profile(&self, username: &str) -> Result<UserProfile> {
      let call = self.profile_calls.fetch_add(1, Ordering::SeqCst) + 1;
      if let Some(gate) = &self.gate {
        gate.notified().await;
      }
      if self.fail_profile.load(Ordering::SeqCst) {
        return Err(DashError::FetchFailure("HTTP 500".to_string()));
      }

      let login = if self.empty_login.load(Ordering::SeqCst) {
        String::new()
      } else {
        username.to_string()
      };
      Ok(profile(&login, &format!("call {}", call)))
    }

    async fn fetch_social_accounts(&self, _username: &str) -> Result<Vec<SocialAccount>> {
      self.social_calls.fetch_add(1, Ordering::SeqCst);
      if self.fail_social.load(Ordering::SeqCst) {
        return Err(DashError::FetchFailure("social accounts down".to_string()));
      }
      Ok(vec![SocialAccount {
        provider: "twitter".to_string(),
        url: "https://twitter.com/octocat".to_string(),
      }])
    }
  }

  fn profile(login: &str, name: &str) -> UserProfile {
    UserProfile {
      login: login.to_string(),
      id: 1,
      name: Some(name.to_string()),
      avatar_url: None,
      bio: None,
      company: None,
      blog: None,
      location: None,
      public_repos: 8,
      followers: 10,
      following: 0,
      created_at: None,
      social_accounts: None,
    }
  }

  type TestSession = UserSessionStore<MemoryStorage, FakeProfiles>;

  fn session_with(fake: FakeProfiles) -> (TestSession, Arc<FakeProfiles>) {
    let fake = Arc::new(fake);
    let session = UserSessionStore::new(CacheLayer::shared(Arc::new(MemoryStorage::new())), fake.clone());
    (session, fake)
  }

  fn current(session: &TestSession) -> SessionState {
    session.subscribe().borrow().clone()
  }

  #[tokio::test]
  async fn test_starts_unconfigured() {
    let (session, _) = session_with(FakeProfiles::default());
    assert_eq!(current(&session), SessionState::Unconfigured);
    assert_eq!(session.username().unwrap(), None);
  }

  #[tokio::test]
  async fn test_set_username_loads_profile() {
    let (mut session, fake) = session_with(FakeProfiles::default());

    let loaded = session.set_username("  octocat ").await.unwrap();

    assert_eq!(loaded.login, "octocat");
    assert_eq!(loaded.social_accounts.as_ref().map(Vec::len), Some(1));
    assert_eq!(session.username().unwrap().as_deref(), Some("octocat"));
    assert_eq!(current(&session), SessionState::Ready(loaded));
    assert_eq!(fake.profile_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_social_accounts_failure_still_ready() {
    let fake = FakeProfiles::default();
    fake.fail_social.store(true, Ordering::SeqCst);
    let (mut session, _) = session_with(fake);

    let loaded = session.set_username("octocat").await.unwrap();

    assert!(loaded.social_accounts.is_none());
    assert_eq!(current(&session).profile().map(|p| p.login.as_str()), Some("octocat"));
  }

  #[tokio::test]
  async fn test_fresh_profile_is_served_from_cache() {
    let (mut session, fake) = session_with(FakeProfiles::default());
    session.set_username("octocat").await.unwrap();

    let again = session.load_user().await.unwrap();

    assert_eq!(again.name.as_deref(), Some("call 1"));
    assert_eq!(fake.profile_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_refresh_refetches() {
    let (mut session, fake) = session_with(FakeProfiles::default());
    session.set_username("octocat").await.unwrap();

    let refreshed = session.refresh().await.unwrap();

    assert_eq!(refreshed.name.as_deref(), Some("call 2"));
    assert_eq!(fake.profile_calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_remove_then_load_reports_no_username() {
    let (mut session, _) = session_with(FakeProfiles::default());
    session.set_username("octocat").await.unwrap();

    session.remove().unwrap();
    assert_eq!(current(&session), SessionState::Unconfigured);
    assert_eq!(session.cache.storage().len(), 0);

    let result = session.load_user().await;
    assert!(matches!(result, Err(DashError::NoUsername)));
    assert_eq!(
      current(&session),
      SessionState::Error("no username stored".to_string())
    );
  }

  #[tokio::test]
  async fn test_empty_username_is_rejected() {
    let (mut session, fake) = session_with(FakeProfiles::default());

    let result = session.set_username("   ").await;

    assert!(matches!(result, Err(DashError::InvalidPayload(_))));
    assert!(current(&session).error().is_some());
    assert_eq!(session.username().unwrap(), None);
    assert_eq!(fake.profile_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_profile_without_login_is_invalid() {
    let fake = FakeProfiles::default();
    fake.empty_login.store(true, Ordering::SeqCst);
    let (mut session, _) = session_with(fake);

    let result = session.set_username("octocat").await;

    assert!(matches!(result, Err(DashError::InvalidPayload(_))));
    assert!(current(&session).error().is_some());
    // Only the username was written
    assert_eq!(session.cache.storage().write_count(), 1);
  }

  #[tokio::test]
  async fn test_profile_without_login_skips_social_accounts() {
    let fake = FakeProfiles::default();
    fake.empty_login.store(true, Ordering::SeqCst);
    let (mut session, fake) = session_with(fake);

    session.set_username("octocat").await.unwrap_err();

    assert_eq!(fake.profile_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fake.social_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_fetch_failure_sets_error() {
    let fake = FakeProfiles::default();
    fake.fail_profile.store(true, Ordering::SeqCst);
    let (mut session, _) = session_with(fake);

    let result = session.set_username("octocat").await;

    assert!(matches!(result, Err(DashError::FetchFailure(_))));
    assert_eq!(
      current(&session),
      SessionState::Error("fetch failed: HTTP 500".to_string())
    );
  }

  #[tokio::test]
  async fn test_changing_username_never_serves_old_profile() {
    let (mut session, fake) = session_with(FakeProfiles::default());
    session.set_username("octocat").await.unwrap();

    let loaded = session.set_username("hubot").await.unwrap();

    assert_eq!(loaded.login, "hubot");
    assert_eq!(fake.profile_calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_loading_is_observable_during_fetch() {
    let gate = Arc::new(Notify::new());
    let (mut session, _) = session_with(FakeProfiles {
      gate: Some(gate.clone()),
      ..Default::default()
    });
    session
      .cache
      .storage()
      .write(&DashboardKey::Username.cache_hash(), "octocat")
      .unwrap();
    let mut rx = session.subscribe();

    let observer = async {
      rx.wait_for(SessionState::is_loading).await.unwrap();
      gate.notify_one();
    };
    let (loaded, _) = tokio::join!(session.load_user(), observer);

    assert_eq!(loaded.unwrap().login, "octocat");
    assert!(current(&session).profile().is_some());
  }
}
