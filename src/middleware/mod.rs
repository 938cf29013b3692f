//! Middleware Module
//!
//! Request filters applied ahead of the handlers.

pub mod rate_limit;

pub use rate_limit::{
    client_identity, enforce_rate_limit, FixedWindowLimiter, RateDecision, RateLimits, RateWindow,
    ENDPOINT_GROUPS,
};
