//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::cache::{ResponseCache, SharedCache, TtlPolicy};
use crate::config::Config;
use crate::middleware::RateLimits;
use crate::upstream::{HttpForwarder, Upstream};

/// Process-scoped services, constructed once and injected into the router.
///
/// Tests build isolated instances with their own cache, limiters and a
/// stand-in [`Upstream`].
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe response cache
    pub cache: SharedCache,
    /// Outbound forwarder
    pub upstream: Arc<dyn Upstream>,
    pub ttl_policy: Arc<TtlPolicy>,
    pub limits: RateLimits,
    pub config: Arc<Config>,
    started_at: Instant,
}

impl AppState {
    /// Creates a new AppState around the given forwarder.
    pub fn new(config: Config, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            cache: Arc::new(RwLock::new(ResponseCache::new(config.default_ttl))),
            upstream,
            ttl_policy: Arc::new(TtlPolicy::new(config.default_ttl)),
            limits: RateLimits::from_config(&config),
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Creates a new AppState that forwards over HTTP.
    pub fn from_config(config: Config) -> Result<Self, reqwest::Error> {
        let forwarder = HttpForwarder::from_user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))?;
        Ok(Self::new(config, Arc::new(forwarder)))
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
