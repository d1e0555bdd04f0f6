//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired entries from every
//! region, so that entries which are never read again still release memory
//! and their tag associations.

use std::ops::Deref;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheManager;

/// Spawns a background task that periodically purges expired cache entries.
///
/// The task runs until aborted, sleeping for `interval` between sweeps.
/// Purging takes each region lock in turn, never more than one at a time.
///
/// # Arguments
/// * `manager` - Handle to the cache, e.g. `Arc<CacheManager<V>>` or
///   `CacheManager::global()`
/// * `interval` - Time between sweeps
///
/// # Returns
/// A JoinHandle which can be used to abort the task on shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweeper_task(CacheManager::global(), Duration::from_secs(30));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweeper_task<M, V>(manager: M, interval: Duration) -> JoinHandle<()>
where
    M: Deref<Target = CacheManager<V>> + Send + 'static,
    V: Clone + Send + 'static,
{
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "starting cache expiry sweeper");

        loop {
            tokio::time::sleep(interval).await;

            let removed = manager.purge_expired();

            if removed > 0 {
                info!("expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("expiry sweep: no expired entries found");
            }
        }
    })
}

/// Spawns the sweeper at the interval configured on the manager
/// (`CACHE_SWEEP_INTERVAL` for the global instance).
pub fn spawn_configured_sweeper<M, V>(manager: M) -> JoinHandle<()>
where
    M: Deref<Target = CacheManager<V>> + Send + 'static,
    V: Clone + Send + 'static,
{
    let interval = manager.config().sweep_interval();
    spawn_sweeper_task(manager, interval)
}
