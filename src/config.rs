//! Configuration Module
//!
//! Loads gateway configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Key sent to api.nasa.gov endpoints
    pub nasa_api_key: String,
    /// Base URL of api.nasa.gov (APOD, Mars photos, EPIC, NeoWs)
    pub nasa_api_base_url: String,
    /// EPIC image archive root
    pub epic_archive_url: String,
    /// Image and Video Library API
    pub images_api_url: String,
    /// Image and Video Library static assets (popular.json)
    pub images_assets_url: String,
    /// EONET v3 API root
    pub eonet_api_url: String,
    /// GIBS root (WMTS and WMS live below it)
    pub gibs_base_url: String,
    /// HTTP server port
    pub server_port: u16,
    /// Runtime mode; rate limiting only runs in "production"
    pub environment: String,
    /// Fallback TTL in seconds
    pub default_ttl: u64,
    /// Background sweep interval in seconds
    pub cleanup_interval: u64,
    /// Rate limit window length in milliseconds
    pub rate_limit_window_ms: u64,
    /// Requests allowed per client per window across the whole service
    pub rate_limit_max: u32,
    /// Timeout for JSON upstream calls in milliseconds
    pub upstream_timeout_ms: u64,
    /// Timeout for binary imagery upstream calls in milliseconds
    pub imagery_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `NASA_API_KEY` (default: `DEMO_KEY`)
    /// - `NASA_API_BASE_URL`, `EPIC_ARCHIVE_URL`, `NASA_IMAGES_API_URL`,
    ///   `NASA_IMAGES_ASSETS_URL`, `EONET_API_URL`, `GIBS_BASE_URL`
    /// - `SERVER_PORT` (default: 5000)
    /// - `APP_ENV` (default: `development`)
    /// - `CACHE_DEFAULT_TTL` (default: 3600)
    /// - `CLEANUP_INTERVAL` (default: 600)
    /// - `RATE_LIMIT_WINDOW_MS` (default: 900000), `RATE_LIMIT_MAX` (default: 100)
    /// - `UPSTREAM_TIMEOUT_MS` (default: 10000), `IMAGERY_TIMEOUT_MS` (default: 20000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            nasa_api_key: text_var("NASA_API_KEY", defaults.nasa_api_key),
            nasa_api_base_url: url_var("NASA_API_BASE_URL", defaults.nasa_api_base_url),
            epic_archive_url: url_var("EPIC_ARCHIVE_URL", defaults.epic_archive_url),
            images_api_url: url_var("NASA_IMAGES_API_URL", defaults.images_api_url),
            images_assets_url: url_var("NASA_IMAGES_ASSETS_URL", defaults.images_assets_url),
            eonet_api_url: url_var("EONET_API_URL", defaults.eonet_api_url),
            gibs_base_url: url_var("GIBS_BASE_URL", defaults.gibs_base_url),
            server_port: parsed_var("SERVER_PORT", defaults.server_port),
            environment: text_var("APP_ENV", defaults.environment),
            default_ttl: positive_var("CACHE_DEFAULT_TTL", defaults.default_ttl),
            cleanup_interval: positive_var("CLEANUP_INTERVAL", defaults.cleanup_interval),
            rate_limit_window_ms: positive_var("RATE_LIMIT_WINDOW_MS", defaults.rate_limit_window_ms),
            rate_limit_max: positive_var("RATE_LIMIT_MAX", defaults.rate_limit_max),
            upstream_timeout_ms: positive_var("UPSTREAM_TIMEOUT_MS", defaults.upstream_timeout_ms),
            imagery_timeout_ms: positive_var("IMAGERY_TIMEOUT_MS", defaults.imagery_timeout_ms),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn imagery_timeout(&self) -> Duration {
        Duration::from_millis(self.imagery_timeout_ms)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    /// Budget of each endpoint group's secondary limiter.
    pub fn group_rate_limit_max(&self) -> u32 {
        (self.rate_limit_max / 2).max(1)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nasa_api_key: "DEMO_KEY".to_string(),
            nasa_api_base_url: "https://api.nasa.gov".to_string(),
            epic_archive_url: "https://epic.gsfc.nasa.gov/archive".to_string(),
            images_api_url: "https://images-api.nasa.gov".to_string(),
            images_assets_url: "https://images-assets.nasa.gov".to_string(),
            eonet_api_url: "https://eonet.gsfc.nasa.gov/api/v3".to_string(),
            gibs_base_url: "https://gibs.earthdata.nasa.gov".to_string(),
            server_port: 5000,
            environment: "development".to_string(),
            default_ttl: 3600,
            cleanup_interval: 600,
            rate_limit_window_ms: 15 * 60 * 1000,
            rate_limit_max: 100,
            upstream_timeout_ms: 10_000,
            imagery_timeout_ms: 20_000,
        }
    }
}

fn text_var(name: &str, default: String) -> String {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

fn url_var(name: &str, default: String) -> String {
    text_var(name, default).trim_end_matches('/').to_string()
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn positive_var<T: FromStr + PartialOrd + Default + Copy>(name: &str, default: T) -> T {
    let value = parsed_var(name, default);
    if value > T::default() {
        value
    } else {
        default
    }
}
