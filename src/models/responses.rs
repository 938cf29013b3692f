//! Payload DTOs produced by the gateway itself (not forwarded upstream data).

use serde::Serialize;

use crate::cache::CacheStats;

/// Response data for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always "OK" while the process serves requests
    pub status: String,
    pub uptime_seconds: u64,
    pub environment: String,
    pub cache: CacheHealth,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheHealth {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

impl HealthResponse {
    pub fn new(uptime_seconds: u64, environment: impl Into<String>, stats: CacheStats) -> Self {
        Self {
            status: "OK".to_string(),
            uptime_seconds,
            environment: environment.into(),
            cache: CacheHealth {
                hit_rate: stats.hit_rate(),
                stats,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_response_serialize() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_miss();
        stats.set_keys(1);

        let json = serde_json::to_value(HealthResponse::new(42, "development", stats)).unwrap();
        assert_eq!(json["status"], "OK");
        assert_eq!(json["uptime_seconds"], 42);
        assert_eq!(json["cache"]["hits"], 1);
        assert_eq!(json["cache"]["misses"], 1);
        assert_eq!(json["cache"]["keys"], 1);
        assert_eq!(json["cache"]["hit_rate"], 0.5);
    }
}
