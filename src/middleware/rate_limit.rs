//! Fixed-window rate limiting per client.
//!
//! Each limiter counts requests per client identity in non-overlapping
//! windows. Over-budget requests get a 429 envelope before any handler,
//! cache lookup or upstream call runs.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::GatewayError;

/// Endpoint groups that each get their own secondary limiter.
pub const ENDPOINT_GROUPS: [&str; 7] = [
    "apod",
    "mars-rover",
    "epic",
    "asteroids",
    "media",
    "eonet",
    "gibs",
];

// == Rate Window ==
/// Counter state for one client.
#[derive(Debug, Clone, Copy)]
pub struct RateWindow {
    pub window_start: Instant,
    pub count: u32,
}

/// Outcome of a single [`FixedWindowLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

// == Fixed Window Limiter ==
#[derive(Debug)]
pub struct FixedWindowLimiter {
    window: Duration,
    max_requests: u32,
    enabled: bool,
    windows: DashMap<String, RateWindow>,
}

impl FixedWindowLimiter {
    /// A disabled limiter allows everything and keeps no state.
    pub fn new(window: Duration, max_requests: u32, enabled: bool) -> Self {
        Self {
            window,
            max_requests,
            enabled,
            windows: DashMap::new(),
        }
    }

    // == Check ==
    /// Counts one request for `client` and decides whether it may proceed.
    ///
    /// The window restarts once `window` has elapsed since its start; the
    /// `max_requests + 1`th request inside a window is limited.
    pub fn check(&self, client: &str) -> RateDecision {
        if !self.enabled {
            return RateDecision::Allowed {
                remaining: self.max_requests,
            };
        }

        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(client.to_string())
            .or_insert(RateWindow {
                window_start: now,
                count: 0,
            });

        if now.duration_since(entry.window_start) >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            let retry_after = (entry.window_start + self.window).saturating_duration_since(now);
            return RateDecision::Limited { retry_after };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.max_requests - entry.count,
        }
    }

    // == Purge Stale ==
    /// Drops windows that have fully elapsed. Returns how many were dropped.
    pub fn purge_stale(&self) -> usize {
        let now = Instant::now();
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.duration_since(w.window_start) < self.window);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

// == Rate Limits ==
/// The service-wide limiter plus one limiter per endpoint group.
#[derive(Debug, Clone)]
pub struct RateLimits {
    pub global: Arc<FixedWindowLimiter>,
    groups: HashMap<&'static str, Arc<FixedWindowLimiter>>,
}

impl RateLimits {
    pub fn new(window: Duration, max_requests: u32, group_max: u32, enabled: bool) -> Self {
        let groups = ENDPOINT_GROUPS
            .iter()
            .map(|&name| {
                (
                    name,
                    Arc::new(FixedWindowLimiter::new(window, group_max, enabled)),
                )
            })
            .collect();

        Self {
            global: Arc::new(FixedWindowLimiter::new(window, max_requests, enabled)),
            groups,
        }
    }

    /// Enabled only when the config runs in production mode.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.rate_limit_window(),
            config.rate_limit_max,
            config.group_rate_limit_max(),
            config.is_production(),
        )
    }

    /// Limiter for an endpoint group. Unknown groups get a fresh limiter
    /// with the group budget of the global one.
    pub fn group(&self, name: &str) -> Arc<FixedWindowLimiter> {
        match self.groups.get(name) {
            Some(limiter) => Arc::clone(limiter),
            None => Arc::new(FixedWindowLimiter::new(
                self.global.window,
                (self.global.max_requests / 2).max(1),
                self.global.enabled,
            )),
        }
    }

    /// Purges stale windows on every limiter.
    pub fn purge_stale(&self) -> usize {
        self.global.purge_stale() + self.groups.values().map(|l| l.purge_stale()).sum::<usize>()
    }
}

// == Middleware ==
/// Client identity: peer address, else the first `X-Forwarded-For` hop,
/// else `"unknown"`.
pub fn client_identity(request: &Request) -> String {
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Axum middleware applying `limiter` to every request it wraps.
pub async fn enforce_rate_limit(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let client = client_identity(&request);
    match limiter.check(&client) {
        RateDecision::Allowed { remaining } => {
            debug!(client = %client, remaining, "Rate limit check passed");
            next.run(request).await
        }
        RateDecision::Limited { retry_after } => {
            warn!(client = %client, path = %request.uri().path(), "Rate limit exceeded");
            let mut response = GatewayError::RateLimited.into_response();
            let secs = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}
