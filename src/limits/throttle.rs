//! Leading-edge throttle.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

// == Throttler ==
/// Bounds call frequency: the first call runs immediately, subsequent
/// calls are dropped until `limit` has elapsed, then the next call runs.
/// Leading edge only; dropped calls are never replayed later.
#[derive(Debug, Clone)]
pub struct Throttler {
    limit: Duration,
    last_run: Arc<Mutex<Option<Instant>>>,
}

impl Throttler {
    pub fn new(limit: Duration) -> Self {
        Self {
            limit,
            last_run: Arc::new(Mutex::new(None)),
        }
    }

    // == Try Call ==
    /// Runs `work` if the limit window has elapsed since the last accepted
    /// call. Returns whether the work ran.
    pub async fn try_call<F>(&self, work: F) -> bool
    where
        F: Future<Output = ()>,
    {
        {
            let mut last_run = self.last_run.lock().await;
            let now = Instant::now();
            match *last_run {
                Some(last) if now.duration_since(last) < self.limit => return false,
                _ => *last_run = Some(now),
            }
        }

        work.await;
        true
    }
}
