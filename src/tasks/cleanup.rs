//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries. Lazy
//! expiry on `get` only reclaims entries that are read again; the sweep
//! reclaims idle ones too.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The task loops forever, sleeping for the configured interval between
/// sweeps, and acquires a write lock on the store for each pass. The
/// returned handle must be aborted during engine teardown; the timer is an
/// owned resource, not something to leave to drop order.
///
/// # Arguments
/// * `store` - Shared reference to the cache store
/// * `interval` - Time between sweep passes
pub fn spawn_cleanup_task(store: Arc<RwLock<CacheStore>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_ms = interval.as_millis() as u64, "starting TTL sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let (removed, freed) = {
                let mut store = store.write().await;
                store.cleanup_expired()
            };

            if removed > 0 {
                info!(removed, freed_bytes = freed, "TTL sweep removed expired entries");
            } else {
                debug!("TTL sweep found no expired entries");
            }
        }
    })
}
