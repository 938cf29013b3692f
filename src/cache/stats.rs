//! Cache Statistics Module
//!
//! Tracks cache hit/miss counters and the live key count.

use serde::Serialize;

// == Cache Stats ==
/// Aggregate counters exposed by the response cache.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    /// Current number of stored entries (expired but unswept included)
    pub keys: usize,
    /// Number of lookups that returned a live entry
    pub hits: u64,
    /// Number of lookups for absent or expired keys
    pub misses: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn set_keys(&mut self, count: usize) {
        self.keys = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.keys, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_serializes_flat_counters() {
        let mut stats = CacheStats::new();
        stats.record_miss();
        stats.set_keys(4);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json, serde_json::json!({"keys": 4, "hits": 0, "misses": 1}));
    }
}
