//! Bounded-concurrency resource pool.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;

// == Pool Stats ==
/// Snapshot of pool utilization.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    /// Operations currently running
    pub active: usize,
    /// Callers waiting for a slot
    pub queued: usize,
    /// active / max_concurrent, as a percentage
    pub utilization_pct: f64,
}

// == Resource Pool ==
/// Bounds how many async operations run at once. `acquire` runs the
/// operation immediately when a slot is free; otherwise the caller waits
/// in FIFO order until one frees. Slots are released on success and
/// failure alike.
///
/// Caller contract: an operation must not call `acquire` on the same pool
/// it is running in. With every slot held, the nested call waits for a
/// slot that can never free, and the pool deadlocks. The pool does not
/// detect this.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    active: Arc<AtomicUsize>,
    queued: Arc<AtomicUsize>,
}

impl ResourcePool {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            active: Arc::new(AtomicUsize::new(0)),
            queued: Arc::new(AtomicUsize::new(0)),
        }
    }

    // == Acquire ==
    /// Runs `op` within a pool slot, waiting FIFO for one if none is free.
    /// Returns whatever `op` returns.
    pub async fn acquire<F, O>(&self, op: F) -> O
    where
        F: Future<Output = O>,
    {
        let permit = match self.semaphore.try_acquire() {
            Ok(permit) => permit,
            Err(_) => {
                self.queued.fetch_add(1, Ordering::SeqCst);
                let permit = self
                    .semaphore
                    .acquire()
                    .await
                    .expect("pool semaphore is never closed");
                self.queued.fetch_sub(1, Ordering::SeqCst);
                permit
            }
        };

        self.active.fetch_add(1, Ordering::SeqCst);
        let active_guard = ActiveGuard(&self.active);

        let output = op.await;

        drop(active_guard);
        drop(permit);
        output
    }

    // == Stats ==
    /// Reports active count, queued count, and utilization percentage.
    pub fn stats(&self) -> PoolStats {
        let active = self.active.load(Ordering::SeqCst);
        PoolStats {
            active,
            queued: self.queued.load(Ordering::SeqCst),
            utilization_pct: active as f64 / self.max_concurrent as f64 * 100.0,
        }
    }
}

/// Decrements the active counter even if the operation panics.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
