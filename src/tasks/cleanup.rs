//! Coordinator Housekeeping Task
//!
//! Periodically drops stale throttle timestamps and stale open breakers
//! from the request coordinator, so per-key bookkeeping does not grow
//! without bound over a long process lifetime.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::coordinator::RequestCoordinator;

/// Spawns the coordinator housekeeping task.
///
/// Every `interval`, state older than `max_age` is dropped. Abort the
/// returned handle during graceful shutdown.
pub fn spawn_coordinator_cleanup_task<T>(
    coordinator: RequestCoordinator<T>,
    interval: Duration,
    max_age: Duration,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        debug!(
            interval_secs = interval.as_secs(),
            max_age_secs = max_age.as_secs(),
            "starting coordinator cleanup task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = coordinator.cleanup(max_age).await;
            if removed > 0 {
                debug!(removed, "coordinator cleanup dropped stale state");
            }
        }
    })
}
