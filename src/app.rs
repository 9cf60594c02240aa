use chrono::{DateTime, Local, Utc};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

use crate::cache::poll::spawn_poll;
use crate::cache::{CacheLayer, CacheResult, CacheSource, Clock, SqliteStorage, SystemClock};
use crate::config::Config;
use crate::feed::ActivityFeed;
use crate::github::{
  ActivityEvent, ContributionsClient, GitHubClient, GithubStats, ReadmeStatsClient, TopLanguages,
  UserProfile,
};
use crate::keys::DashboardKey;
use crate::leetcode::LeetCodeClient;
use crate::now_playing::{NowPlayingClient, Track};
use crate::session::{SessionState, UserSessionStore};
use crate::stats::StatsBoard;
use crate::todos::{Todo, TodoList};
use crate::tracker::{StreakReport, StreakTracker};

type Session = UserSessionStore<SqliteStorage, GitHubClient>;
type Feed = ActivityFeed<SqliteStorage, GitHubClient>;

/// Wired services behind the command line
pub struct App {
  config: Config,
  cache: CacheLayer<SqliteStorage>,
  session: Session,
  feed: Feed,
  contributions: StreakTracker<SqliteStorage, ContributionsClient>,
  stats: StatsBoard<SqliteStorage, ReadmeStatsClient>,
  todos: TodoList<SqliteStorage>,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let storage = Arc::new(SqliteStorage::open(config.cache.path.as_deref())?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = CacheLayer::shared(storage.clone())
      .with_clock(clock.clone())
      .with_stale_fallback(config.cache.serve_stale_on_error);

    let token = Config::get_github_token();
    let github = Arc::new(GitHubClient::new(&config.github, token.as_deref())?);
    let contributions = Arc::new(ContributionsClient::new(
      &config.contributions,
      &config.github,
    )?);

    let readme_stats = Arc::new(ReadmeStatsClient::new(&config.stats, &config.github)?);

    let session = UserSessionStore::new(cache.clone(), github.clone())
      .with_profile_ttl(config.cache.profile_ttl()?);
    let feed = ActivityFeed::new(cache.clone(), github).with_ttl(config.cache.activity_ttl()?);
    let contributions =
      StreakTracker::new(cache.clone(), contributions, config.cache.calendar_ttl()?);
    let stats = StatsBoard::new(cache.clone(), readme_stats).with_ttl(config.cache.stats_ttl()?);
    let todos = TodoList::new(storage, clock);

    Ok(Self {
      config,
      cache,
      session,
      feed,
      contributions,
      stats,
      todos,
    })
  }

  pub async fn set_user(&mut self, name: &str) -> Result<()> {
    let profile = self.session.set_username(name).await?;
    print_profile(&profile);
    Ok(())
  }

  /// Profile, activity, and streak of the stored user.
  pub async fn show(&mut self) -> Result<()> {
    let profile = self.session.load_user().await?;
    print_profile(&profile);

    let today = Local::now().date_naive();
    let (events, report) = futures::try_join!(
      self.feed.load(&profile.login),
      self.contributions.report(&profile.login, today),
    )?;

    println!();
    print_events(&events);
    println!();
    print_report("GitHub", &report);
    Ok(())
  }

  /// Refetch everything cached for the stored user.
  pub async fn refresh(&mut self) -> Result<()> {
    let profile = self.session.refresh().await?;
    self.feed.refresh(&profile.login).await?;
    self.cache.invalidate(&DashboardKey::calendar(
      self.contributions.source(),
      &profile.login,
    ))?;
    self.stats.invalidate(&profile.login)?;

    print_profile(&profile);
    println!("Activity and contributions refreshed.");
    Ok(())
  }

  pub fn remove(&mut self) -> Result<()> {
    let username = self.session.username()?;
    self.session.remove()?;

    if let Some(name) = username {
      for key in [
        DashboardKey::events(&name),
        DashboardKey::calendar(self.contributions.source(), &name),
      ] {
        self.cache.invalidate(&key)?;
      }
      self.stats.invalidate(&name)?;
    }

    println!("Username removed.");
    Ok(())
  }

  pub async fn activity(&mut self, refresh: bool) -> Result<()> {
    let username = self.require_username()?;
    let events = if refresh {
      self.feed.refresh(&username).await?
    } else {
      self.feed.load(&username).await?
    };

    print_events(&events);
    Ok(())
  }

  /// GitHub streak, plus LeetCode when a LeetCode username is known.
  pub async fn streak(&mut self, leetcode_user: Option<String>) -> Result<()> {
    let username = self.require_username()?;
    let today = Local::now().date_naive();

    let report = self.contributions.report(&username, today).await?;
    print_report("GitHub", &report);

    let leetcode_user = leetcode_user.or_else(|| self.config.leetcode.username.clone());
    if let Some(leetcode_user) = leetcode_user {
      let client = LeetCodeClient::new(&self.config.leetcode, &self.config.github)?;
      let tracker = StreakTracker::daily(
        self.cache.clone(),
        Arc::new(client),
        *Local::now().offset(),
      );
      let report = tracker.report(&leetcode_user, today).await?;
      println!();
      print_report("LeetCode", &report);
    }

    Ok(())
  }

  /// Aggregate GitHub stats of the stored user.
  pub async fn stats(&self) -> Result<()> {
    let username = self.require_username()?;
    let stats = self.stats.stats(&username).await?;
    print_stats(&stats);
    Ok(())
  }

  /// Top languages of the stored user by code size.
  pub async fn languages(&self) -> Result<()> {
    let username = self.require_username()?;
    let languages = self.stats.top_languages(&username).await?;
    print_languages(&languages);
    Ok(())
  }

  pub fn todo_list(&self) -> Result<()> {
    let todos = self.todos.list()?;
    if todos.is_empty() {
      println!("Nothing to focus on.");
    }
    for todo in &todos {
      print_todo(todo);
    }
    Ok(())
  }

  pub fn todo_add(&self, text: &str) -> Result<()> {
    print_todo(&self.todos.add(text)?);
    Ok(())
  }

  pub fn todo_toggle(&self, id: i64) -> Result<()> {
    print_todo(&self.todos.toggle(id)?);
    Ok(())
  }

  pub fn todo_delete(&self, id: i64) -> Result<()> {
    if self.todos.delete(id)? {
      println!("Deleted {}.", id);
    } else {
      println!("No todo with id {}.", id);
    }
    Ok(())
  }

  /// Print the playing track, and with `follow` keep printing changes until Ctrl-C.
  pub async fn now_playing(&self, follow: bool) -> Result<()> {
    let client = NowPlayingClient::new(&self.config.now_playing, &self.config.github)?;
    let track = client.current().await?;
    print_track(track.as_ref());
    if !follow {
      return Ok(());
    }

    let period = self.config.now_playing.poll_interval();
    let last = Arc::new(Mutex::new(track));
    let handle = spawn_poll(period, move || {
      let client = client.clone();
      let last = last.clone();
      async move {
        match client.current().await {
          Ok(track) => {
            let mut last = last.lock().await;
            if *last != track {
              print_track(track.as_ref());
              *last = track;
            }
          }
          Err(e) => warn!(error = %e, "now-playing poll failed"),
        }
      }
    });

    wait_for_ctrl_c().await?;
    handle.cancel();
    Ok(())
  }

  /// Load once, then re-check staleness on the poll interval until Ctrl-C.
  pub async fn watch(self) -> Result<()> {
    let username = self.require_username()?;
    let period = self.config.cache.poll_interval();

    let mut session = self.session;
    let profile = session.load_user().await?;
    print_profile(&profile);
    let events = self.feed.load(&username).await?;
    print_events(&events);

    let printer = tokio::spawn(print_session_changes(session.subscribe(), profile));
    let session = Arc::new(Mutex::new(session));
    let feed = Arc::new(self.feed);
    info!(username = %username, ?period, "watching for updates");
    println!("\nWatching every {}s, press Ctrl-C to stop.", period.as_secs());

    let handle = spawn_poll(period, move || {
      let session = session.clone();
      let feed = feed.clone();
      let username = username.clone();
      async move {
        // Failures reach the terminal through the session state
        if let Err(e) = session.lock().await.load_user().await {
          warn!(error = %e, "profile poll failed");
        }

        match feed.load(&username).await {
          Ok(events) if events.is_from_network() => {
            println!();
            print_events(&events);
          }
          Ok(_) => {}
          Err(e) => {
            warn!(error = %e, "activity poll failed");
            eprintln!("activity: {}", e);
          }
        }
      }
    });

    wait_for_ctrl_c().await?;
    handle.cancel();
    printer.abort();
    info!("watch stopped");
    Ok(())
  }

  fn require_username(&self) -> Result<String> {
    self
      .session
      .username()?
      .ok_or_else(|| eyre!("No username stored, run `ghdash set-user <name>` first"))
  }
}

async fn wait_for_ctrl_c() -> Result<()> {
  tokio::signal::ctrl_c()
    .await
    .map_err(|e| eyre!("Failed to listen for Ctrl-C: {}", e))
}

/// Print the profile when it changes and any load error, skipping loading states.
async fn print_session_changes(
  mut states: watch::Receiver<SessionState>,
  mut shown: UserProfile,
) {
  while states.changed().await.is_ok() {
    let state = states.borrow_and_update().clone();
    if state.is_loading() {
      continue;
    }
    if let Some(error) = state.error() {
      eprintln!("profile: {}", error);
    } else if let Some(profile) = state.profile() {
      if *profile != shown {
        println!();
        print_profile(profile);
        shown = profile.clone();
      }
    }
  }
}

fn print_profile(profile: &UserProfile) {
  println!("{} (@{})", profile.display_name(), profile.login);
  if let Some(bio) = &profile.bio {
    println!("  {}", bio);
  }
  for (label, value) in [
    ("Company", &profile.company),
    ("Location", &profile.location),
    ("Blog", &profile.blog),
  ] {
    if let Some(value) = value {
      println!("  {}: {}", label, value);
    }
  }
  println!(
    "  {} repos · {} followers · {} following",
    profile.public_repos, profile.followers, profile.following
  );
  if let Some(accounts) = &profile.social_accounts {
    for account in accounts {
      println!("  {}: {}", account.provider, account.url);
    }
  }
}

fn print_events(events: &CacheResult<Vec<ActivityEvent>>) {
  println!("Recent activity ({})", freshness(events.source, events.cached_at));
  if events.data.is_empty() {
    println!("  No recent public activity.");
  }
  for event in &events.data {
    println!(
      "  {} {} {} ({})",
      event.created_at.with_timezone(&Local).format("%b %d %H:%M"),
      event.kind().action(),
      event.repo,
      event.actor_login
    );
  }
}

fn print_report(label: &str, report: &StreakReport) {
  let summary = &report.summary;
  println!("{} streak", label);
  println!("  Current: {} days", summary.current_streak);
  if let Some(range) = &summary.current_range {
    println!("    {} to {}", range.start, range.end);
  }
  println!("  Longest: {} days", summary.longest_streak);
  println!("  Total:   {}", summary.total_contributions);
  println!("  Today:   {}", report.today_count);
  println!("  {}", report.cheer.message());
}

fn print_stats(stats: &CacheResult<GithubStats>) {
  let data = &stats.data;
  println!("{} ({})", data.name, freshness(stats.source, stats.cached_at));
  println!("  Rank {} (top {:.1}%)", data.rank.level, data.rank.percentile);
  for (label, value) in [
    ("Stars", data.total_stars),
    ("Commits", data.total_commits),
    ("PRs", data.total_prs),
    ("Merged PRs", data.total_prs_merged),
    ("Reviews", data.total_reviews),
    ("Issues", data.total_issues),
    ("Contributed to", data.contributed_to),
  ] {
    println!("  {:<15}{}", format!("{}:", label), value);
  }
}

fn print_languages(languages: &CacheResult<TopLanguages>) {
  println!("Top languages ({})", freshness(languages.source, languages.cached_at));
  let data = &languages.data;
  if data.languages.is_empty() {
    println!("  No public code.");
  }
  for language in data.top(TopLanguages::SHOWN) {
    println!("  {:<15}{:>5.1}%", language.name, data.share(language));
  }
}

fn print_todo(todo: &Todo) {
  let mark = if todo.completed { "x" } else { " " };
  println!("[{}] {} {}", mark, todo.id, todo.text);
}

fn print_track(track: Option<&Track>) {
  match track {
    Some(track) => {
      println!("Now playing: {} by {}", track.title, track.artist_names());
      if let Some(album) = &track.album {
        println!("  from {}", album);
      }
      if let Some(url) = &track.url {
        println!("  {}", url);
      }
    }
    None => println!("Not playing."),
  }
}

fn freshness(source: CacheSource, cached_at: DateTime<Utc>) -> String {
  let minutes = (Utc::now() - cached_at).num_minutes().max(0);
  let age = match minutes {
    0 => "just now".to_string(),
    1 => "1 minute ago".to_string(),
    n => format!("{} minutes ago", n),
  };
  match source {
    CacheSource::Offline => format!("offline, updated {}", age),
    _ => format!("updated {}", age),
  }
}
