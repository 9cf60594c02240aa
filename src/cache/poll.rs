//! Periodic staleness checks.
//!
//! A poll re-runs a cached read on a fixed period so stale entries get
//! refetched while a session is open. The poll stops when its handle is
//! cancelled or dropped.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Default period between staleness checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Handle to a running poll. Dropping it stops the poll.
#[derive(Debug)]
pub struct PollHandle {
  task: JoinHandle<()>,
}

impl PollHandle {
  /// Stop the poll.
  pub fn cancel(self) {
    self.task.abort();
  }
}

impl Drop for PollHandle {
  fn drop(&mut self) {
    self.task.abort();
  }
}

/// Run `tick` every `period` until the returned handle is dropped.
///
/// The first run happens one full period after spawning, since callers load
/// their data before starting the poll.
pub fn spawn_poll<F, Fut>(period: Duration, mut tick: F) -> PollHandle
where
  F: FnMut() -> Fut + Send + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  let task = tokio::spawn(async move {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick completes immediately
    interval.tick().await;

    loop {
      interval.tick().await;
      debug!("staleness poll tick");
      tick().await;
    }
  });

  PollHandle { task }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  fn counting_poll(period: Duration) -> (PollHandle, Arc<AtomicUsize>) {
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();
    let handle = spawn_poll(period, move || {
      let counter = counter_clone.clone();
      async move {
        counter.fetch_add(1, Ordering::SeqCst);
      }
    });
    (handle, counter)
  }

  #[tokio::test(start_paused = true)]
  async fn test_poll_runs_periodically() {
    let (handle, counter) = counting_poll(Duration::from_millis(10));

    tokio::time::sleep(Duration::from_millis(65)).await;

    assert_eq!(counter.load(Ordering::SeqCst), 6);
    handle.cancel();
  }

  #[tokio::test(start_paused = true)]
  async fn test_poll_skips_immediate_tick() {
    let (_handle, counter) = counting_poll(Duration::from_millis(200));

    tokio::time::sleep(Duration::from_millis(199)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_cancel_stops_poll() {
    let (handle, counter) = counting_poll(Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(35)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 3);

    handle.cancel();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(counter.load(Ordering::SeqCst), 3);
  }

  #[tokio::test(start_paused = true)]
  async fn test_drop_stops_poll() {
    let (handle, counter) = counting_poll(Duration::from_millis(10));
    drop(handle);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(counter.load(Ordering::SeqCst), 0);
  }
}
