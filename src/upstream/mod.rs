//! Upstream Module
//!
//! Single-attempt HTTP forwarding to the NASA data services.

mod error;
mod forwarder;

pub use error::UpstreamError;
pub use forwarder::{HttpForwarder, Upstream, UpstreamRequest, UpstreamResponse};
