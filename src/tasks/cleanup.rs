//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries and
//! forgets rate-limit windows that have run out.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;
use crate::middleware::RateLimits;

/// Spawns a background task that sweeps the cache and limiters.
///
/// Expired entries are also dropped lazily on lookup; the sweep bounds
/// memory held by keys nobody asks for again.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let cleanup_handle = spawn_cleanup_task(state.cache.clone(), state.limits.clone(), 600);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(
    cache: SharedCache,
    limits: RateLimits,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.write().await.cleanup_expired();
            let windows = limits.purge_stale();

            if removed > 0 || windows > 0 {
                info!(
                    removed_entries = removed,
                    purged_windows = windows,
                    "Expiry sweep complete"
                );
            } else {
                debug!("Expiry sweep: nothing to remove");
            }
        }
    })
}
