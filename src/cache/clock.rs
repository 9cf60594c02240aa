//! Time source for cache freshness checks.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;

  /// Current time as epoch milliseconds.
  fn now_millis(&self) -> i64 {
    self.now().timestamp_millis()
  }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}
