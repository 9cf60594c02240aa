mod app;
mod cache;
mod config;
mod error;
mod feed;
mod fetch;
mod github;
mod keys;
mod leetcode;
mod logging;
mod now_playing;
mod session;
mod stats;
mod streak;
mod todos;
mod tracker;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ghdash")]
#[command(about = "Cached GitHub profile, activity, and coding streaks")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/ghdash/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Also log debug output to stderr
  #[arg(short, long)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Store the GitHub username and load its profile
  SetUser { name: String },
  /// Show profile, recent activity, and contribution streak
  Show,
  /// Refetch all data for the stored username
  Refresh,
  /// Forget the stored username and its cached data
  Remove,
  /// Show recent public activity
  Activity {
    /// Skip the cache
    #[arg(long)]
    refresh: bool,
  },
  /// Show contribution streaks
  Streak {
    /// LeetCode username (default: leetcode.username from config)
    #[arg(long)]
    leetcode: Option<String>,
  },
  /// Show aggregate GitHub stats and rank
  Stats,
  /// Show the top languages by code size
  Langs,
  /// Manage the focus board todo list
  Todo {
    #[command(subcommand)]
    action: TodoAction,
  },
  /// Show the track playing on Spotify
  NowPlaying {
    /// Keep printing track changes until interrupted
    #[arg(short, long)]
    follow: bool,
  },
  /// Keep data fresh until interrupted
  Watch,
}

#[derive(Subcommand, Debug)]
enum TodoAction {
  /// List todos, newest first
  List,
  /// Add a todo
  Add {
    #[arg(required = true)]
    text: Vec<String>,
  },
  /// Mark a todo done, or not done again
  Toggle { id: i64 },
  /// Delete a todo
  Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let _guard = logging::init(&config, args.verbose)?;
  tracing::debug!(?args, "ghdash starting");

  let mut app = app::App::new(config)?;
  match args.command {
    Command::SetUser { name } => app.set_user(&name).await?,
    Command::Show => app.show().await?,
    Command::Refresh => app.refresh().await?,
    Command::Remove => app.remove()?,
    Command::Activity { refresh } => app.activity(refresh).await?,
    Command::Streak { leetcode } => app.streak(leetcode).await?,
    Command::Stats => app.stats().await?,
    Command::Langs => app.languages().await?,
    Command::Todo { action } => match action {
      TodoAction::List => app.todo_list()?,
      TodoAction::Add { text } => app.todo_add(&text.join(" "))?,
      TodoAction::Toggle { id } => app.todo_toggle(id)?,
      TodoAction::Delete { id } => app.todo_delete(id)?,
    },
    Command::NowPlaying { follow } => app.now_playing(follow).await?,
    Command::Watch => app.watch().await?,
  }

  Ok(())
}
