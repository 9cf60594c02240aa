use color_eyre::eyre::eyre;
use color_eyre::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "ghdash.log";

/// Initialize logging to a daily rolling file in the data directory.
///
/// Level comes from `RUST_LOG`, defaulting to `ghdash=info`. With `verbose`
/// debug output is mirrored to stderr. Keep the returned guard alive until
/// exit so buffered lines are flushed.
pub fn init(config: &Config, verbose: bool) -> Result<WorkerGuard> {
  let log_dir = config.log_dir();
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", log_dir.display(), e))?;

  let (writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX));

  let file_filter =
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ghdash=info"));
  let file_layer = fmt::layer()
    .with_writer(writer)
    .with_ansi(false)
    .with_filter(file_filter);

  let stderr_layer = verbose.then(|| {
    fmt::layer()
      .with_writer(std::io::stderr)
      .with_target(false)
      .with_filter(EnvFilter::new("ghdash=debug"))
  });

  tracing_subscriber::registry()
    .with(file_layer)
    .with(stderr_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
