//! Generic caching layer for remote resources.
//!
//! This module provides a source-agnostic caching mechanism that:
//! - Stores each value as a timestamped entry behind a key-value persistence backend
//! - Serves values that are at most TTL-stale, fetching only when necessary
//! - Supports explicit invalidation and forced refreshes
//! - Optionally serves stale data when the network is unavailable

mod clock;
mod layer;
pub mod poll;
mod storage;
mod traits;

#[cfg(test)]
pub mod testing;

pub use clock::{Clock, SystemClock};
pub use layer::{CacheLayer, Ttl};
pub use storage::{Persistence, SqliteStorage};
pub use traits::{CacheKey, CacheResult, CacheSource, Payload};
