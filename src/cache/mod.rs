//! Cache Module
//!
//! Response caching for upstream payloads: key derivation, TTL policy and
//! the expiring in-memory store.

mod entry;
mod key;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use key::{build_key, ParamValue, KEY_DELIMITER};
pub use stats::CacheStats;
pub use store::ResponseCache;
pub use ttl::{resolve_ttl, TtlCategory, TtlPolicy, DEFAULT_TTL_SECS};

/// Cache handle shared between handlers and the sweep task.
pub type SharedCache = std::sync::Arc<tokio::sync::RwLock<ResponseCache>>;
