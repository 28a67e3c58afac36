//! Counter storage implementations.
//!
//! Provides concurrent, in-process counting-window counters for the rate
//! limiter. For state shared across instances, see the Redis adapter in
//! `redis_counters` (behind the `redis-limiter` feature).

use crate::application::ports::{Clock, CounterStore};
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    window_start: Instant,
    count: u64,
}

/// Thread-safe per-key counting-window counters backed by DashMap.
///
/// Each key tracks a count within its current window; once the window has
/// fully elapsed the count restarts from zero. DashMap's per-entry locking
/// keeps the increment atomic per key without a global lock.
#[derive(Debug)]
pub struct InMemoryCounterStore {
    buckets: DashMap<String, WindowCounter, RandomState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryCounterStore {
    /// Create a new counter store using the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: DashMap::with_hasher(RandomState::new()),
            clock,
        }
    }

    /// Current count for `key` without incrementing it.
    ///
    /// Reads the stored count as-is; window expiry only happens on
    /// increments.
    pub fn peek(&self, key: &str) -> u64 {
        self.buckets.get(key).map(|bucket| bucket.count).unwrap_or(0)
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if no keys are tracked.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Drop all counters.
    pub fn clear(&self) {
        self.buckets.clear();
    }
}

impl CounterStore for InMemoryCounterStore {
    fn increment(&self, key: &str, window: Duration) -> u64 {
        let now = self.clock.now();
        let mut bucket = self
            .buckets
            .entry(key.to_owned())
            .or_insert(WindowCounter {
                window_start: now,
                count: 0,
            });

        if now.saturating_duration_since(bucket.window_start) >= window {
            bucket.window_start = now;
            bucket.count = 0;
        }

        bucket.count += 1;
        bucket.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockClock;

    fn store() -> (InMemoryCounterStore, Arc<MockClock>) {
        let clock = Arc::new(MockClock::new(Instant::now()));
        (InMemoryCounterStore::new(clock.clone()), clock)
    }

    #[test]
    fn test_counts_within_window() {
        let (store, _clock) = store();
        let window = Duration::from_secs(1);

        assert_eq!(store.increment("k", window), 1);
        assert_eq!(store.increment("k", window), 2);
        assert_eq!(store.increment("k", window), 3);
        assert_eq!(store.peek("k"), 3);
    }

    #[test]
    fn test_window_expiry_restarts_count() {
        let (store, clock) = store();
        let window = Duration::from_secs(1);

        store.increment("k", window);
        store.increment("k", window);

        clock.advance(Duration::from_millis(1001));
        assert_eq!(store.increment("k", window), 1);
    }

    #[test]
    fn test_keys_are_independent() {
        let (store, _clock) = store();
        let window = Duration::from_secs(1);

        store.increment("a", window);
        store.increment("a", window);
        assert_eq!(store.increment("b", window), 1);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_peek_never_increments() {
        let (store, _clock) = store();

        assert_eq!(store.peek("missing"), 0);
        store.increment("k", Duration::from_secs(1));
        store.peek("k");
        store.peek("k");
        assert_eq!(store.peek("k"), 1);
    }

    #[test]
    fn test_concurrent_increments() {
        use std::thread;

        let clock = Arc::new(crate::infrastructure::clock::SystemClock::new());
        let store = Arc::new(InMemoryCounterStore::new(clock));
        let window = Duration::from_secs(60);

        let mut handles = vec![];
        for _ in 0..10 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    store.increment("shared", window);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.peek("shared"), 1000);
    }
}
