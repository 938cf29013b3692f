//! Response Cache Module
//!
//! In-memory key to payload store with per-entry expiry and hit/miss
//! accounting.

use std::collections::HashMap;

use serde_json::Value;

use crate::cache::{CacheEntry, CacheStats};

// == Response Cache ==
/// Upstream payload cache with lazy expiry on read.
#[derive(Debug)]
pub struct ResponseCache {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Hit/miss counters
    stats: CacheStats,
    /// TTL used when a caller passes zero
    default_ttl: u64,
}

impl ResponseCache {
    // == Constructor ==
    /// Creates an empty cache.
    ///
    /// # Arguments
    /// * `default_ttl` - Seconds applied when `set` is called with a zero TTL
    pub fn new(default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            default_ttl: default_ttl.max(1),
        }
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl_seconds`, replacing any previous
    /// entry and its expiry.
    pub fn set(&mut self, key: impl Into<String>, value: Value, ttl_seconds: u64) {
        let ttl = if ttl_seconds == 0 {
            self.default_ttl
        } else {
            ttl_seconds
        };
        self.entries.insert(key.into(), CacheEntry::new(value, ttl));
    }

    // == Get ==
    /// Returns a live value for `key`.
    ///
    /// Every call records exactly one hit or one miss. An expired entry is
    /// removed here and counted as a miss even if the sweep has not run yet.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.record_miss();
                None
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Delete ==
    /// Removes `key`. Returns whether an entry was present; absent keys are
    /// not an error.
    pub fn delete(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    // == Stats ==
    /// Returns current counters.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_keys(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries. Counters are untouched.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(crate::cache::DEFAULT_TTL_SECS)
    }
}
