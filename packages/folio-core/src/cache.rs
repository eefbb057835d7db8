//! Expiring key-value cache handed to data collaborators.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::trace;

/// Cache operations a data collaborator relies on.
///
/// Implementations decide how entries expire; callers only see hits and misses.
pub trait Cache<V> {
    /// Live value for `key`, if any.
    fn get(&self, key: &str) -> Option<V>;

    /// Insert or replace `key`.
    fn set(&mut self, key: String, value: V);

    /// Remove `key`, returning its value even if it had expired.
    fn evict(&mut self, key: &str) -> Option<V>;
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// In-memory cache where every entry lives for a fixed time-to-live.
///
/// A zero TTL disables the cache: `set` becomes a no-op.
#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    ttl: Duration,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_disabled(&self) -> bool {
        self.ttl.is_zero()
    }

    /// Value for `key` if it has not expired at `now`.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let hit = self
            .entries
            .get(key)
            .filter(|entry| now <= entry.expires_at)
            .map(|entry| entry.value.clone());
        trace!(key, hit = hit.is_some(), "cache lookup");
        hit
    }

    /// Insert `value`, expiring one TTL after `now`. Entries already expired at
    /// `now` are dropped first.
    pub fn set_at(&mut self, key: String, value: V, now: Instant) {
        if self.is_disabled() {
            return;
        }
        let evicted = self.evict_expired_at(now);
        if evicted > 0 {
            trace!(evicted, "evicted expired cache entries");
        }
        let expires_at = now + self.ttl;
        self.entries.insert(key, CacheEntry { value, expires_at });
    }

    /// Drop every entry that has expired at `now`.
    pub fn evict_expired_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at >= now);
        before - self.entries.len()
    }

    pub fn evict_expired(&mut self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries, including any that expired since the last insert.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone> Cache<V> for TtlCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    fn set(&mut self, key: String, value: V) {
        self.set_at(key, value, Instant::now());
    }

    fn evict(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }
}
