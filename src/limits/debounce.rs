//! Trailing-edge debounce.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

// == Debouncer ==
/// Collapses a burst of calls into a single trailing execution.
///
/// Each `call` cancels any previously scheduled run and schedules the new
/// one `wait` later, so only the last call in a burst executes.
#[derive(Debug, Clone)]
pub struct Debouncer {
    wait: Duration,
    scheduled: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Debouncer {
    pub fn new(wait: Duration) -> Self {
        Self {
            wait,
            scheduled: Arc::new(Mutex::new(None)),
        }
    }

    // == Call ==
    /// Schedules `work` to run after the wait elapses, cancelling any run
    /// scheduled by a previous call.
    pub async fn call<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut scheduled = self.scheduled.lock().await;
        if let Some(previous) = scheduled.take() {
            previous.abort();
        }

        let wait = self.wait;
        *scheduled = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            work.await;
        }));
    }

    // == Cancel ==
    /// Cancels any pending scheduled run.
    pub async fn cancel(&self) {
        if let Some(previous) = self.scheduled.lock().await.take() {
            previous.abort();
        }
    }
}
