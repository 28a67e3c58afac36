//! Redis-backed counter storage.
//!
//! Provides a distributed counter backend using Redis, allowing the rate
//! limiter's windows to be shared across multiple application instances.
//! Available with the `redis-limiter` feature.
//!
//! ## Architecture
//!
//! Each `(key, window)` pair maps to a Redis key that embeds the current
//! window's index, computed from wall-clock time so every instance lands in
//! the same bucket:
//!
//! ```text
//! <prefix><key>:<epoch_seconds / window_seconds>
//! ```
//!
//! The counter is incremented with `INCR` and given a TTL of one window via
//! an atomic pipeline, so stale buckets expire on their own.
//!
//! ## Error Handling
//!
//! Redis failures are logged as warnings and the increment reports a count
//! of 0, which the limiter reads as "not limited". Losing rate limiting
//! during a Redis outage is preferable to blocking ingestion on it. The
//! connection is dropped on error and re-established on the next call.

use crate::application::ports::CounterStore;
use redis::{Client, Connection, RedisError};
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Configuration for Redis counters.
#[derive(Debug, Clone)]
pub struct RedisCounterConfig {
    /// Key prefix for Redis keys (default: "similarity-gate:")
    pub key_prefix: String,
}

impl Default for RedisCounterConfig {
    fn default() -> Self {
        Self {
            key_prefix: "similarity-gate:".to_string(),
        }
    }
}

/// Redis-backed counters for distributed rate limiting.
pub struct RedisCounterStore {
    client: Client,
    connection: Mutex<Option<Connection>>,
    config: RedisCounterConfig,
}

impl fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RedisCounterStore {
    /// Connect to Redis with default configuration.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://127.0.0.1/")
    ///
    /// # Errors
    /// Returns error if the URL is invalid. The connection itself is
    /// established lazily on first use.
    pub fn connect(url: &str) -> Result<Self, RedisError> {
        Self::connect_with_config(url, RedisCounterConfig::default())
    }

    /// Connect to Redis with custom configuration.
    pub fn connect_with_config(
        url: &str,
        config: RedisCounterConfig,
    ) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        Ok(Self {
            client,
            connection: Mutex::new(None),
            config,
        })
    }

    /// Redis key for `key`'s current window bucket.
    fn bucket_key(&self, key: &str, window: Duration) -> String {
        let window_secs = window.as_secs().max(1);
        let epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        format!("{}{}:{}", self.config.key_prefix, key, epoch / window_secs)
    }

    fn try_increment(&self, key: &str, window: Duration) -> Result<u64, RedisError> {
        let bucket = self.bucket_key(key, window);
        let ttl_secs = window.as_secs().max(1) as i64;

        let mut guard = self
            .connection
            .lock()
            .expect("redis connection mutex poisoned - a thread panicked while holding the lock");

        let mut conn = match guard.take() {
            Some(conn) => conn,
            None => self.client.get_connection()?,
        };

        let result: Result<(u64,), RedisError> = redis::pipe()
            .atomic()
            .incr(&bucket, 1u64)
            .expire(&bucket, ttl_secs)
            .ignore()
            .query(&mut conn);

        match result {
            Ok((count,)) => {
                *guard = Some(conn);
                Ok(count)
            }
            // The broken connection stays dropped; the next call reconnects
            Err(err) => Err(err),
        }
    }
}

impl CounterStore for RedisCounterStore {
    fn increment(&self, key: &str, window: Duration) -> u64 {
        match self.try_increment(key, window) {
            Ok(count) => count,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    key = %key,
                    "redis counter increment failed, failing open"
                );
                0
            }
        }
    }
}
