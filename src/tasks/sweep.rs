//! Expired-Entry Sweep Task
//!
//! Background task that periodically removes expired entries from every
//! domain cache, bounding memory for cold keys that are never re-queried
//! (lazy deletion on access only covers hot keys).

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheRegistry;

/// Spawns the sweep task.
///
/// The task loops forever, sleeping `interval` between sweeps. Abort the
/// returned handle during graceful shutdown.
pub fn spawn_sweep_task(registry: Arc<CacheRegistry>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "starting cache sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = registry.sweep_expired().await;

            if removed > 0 {
                info!(removed, "cache sweep removed expired entries");
            } else {
                debug!("cache sweep found no expired entries");
            }
        }
    })
}
