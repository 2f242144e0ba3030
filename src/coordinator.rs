//! Request Coordinator
//!
//! Coordinates the fetches that happen on cache misses: at most one
//! in-flight operation per key (deduplication), minimum spacing between
//! attempts (throttling), and fail-fast once a key has failed repeatedly
//! (circuit breaking).
//!
//! The coordinator never raises on its own. It informs callers whether to
//! proceed, and it passes fetcher errors through to every waiter untouched.
//! Whether to retry or back off after a failure is the caller's decision.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::warn;

// == Shared Error ==
/// Cloneable wrapper for a fetcher error, so every waiter on a
/// deduplicated operation observes the same failure.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SharedError(pub Arc<anyhow::Error>);

impl SharedError {
    fn new(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }
}

type SharedResult<T> = Result<T, SharedError>;
type SharedFuture<T> = Shared<BoxFuture<'static, SharedResult<T>>>;

// == Breaker ==
#[derive(Debug, Clone, Copy)]
struct Breaker {
    open: bool,
    opened_at: Instant,
}

// == Coordinator State ==
/// Bookkeeping keyed by `(context, key)` slots. The `pending` map holds
/// the shared in-flight result per slot; the rest back the throttle and
/// breaker decisions.
struct CoordinatorState<T> {
    pending: HashMap<String, SharedFuture<T>>,
    last_call: HashMap<String, Instant>,
    failures: HashMap<String, u32>,
    breakers: HashMap<String, Breaker>,
}

impl<T> CoordinatorState<T> {
    fn new() -> Self {
        Self {
            pending: HashMap::new(),
            last_call: HashMap::new(),
            failures: HashMap::new(),
            breakers: HashMap::new(),
        }
    }
}

// == Request Coordinator ==
/// Process-wide coordination state, generic over the shared payload.
///
/// Cheap to clone; clones share the same state. All bookkeeping lives
/// behind one async mutex that is never held across an await, so a
/// check-and-record pair (throttle) or check-and-insert pair (dedup
/// registration) cannot interleave with another caller.
///
/// State is a performance optimization layer only, never a source of
/// truth; a restart clears everything.
pub struct RequestCoordinator<T> {
    inner: Arc<Mutex<CoordinatorState<T>>>,
}

impl<T> std::fmt::Debug for RequestCoordinator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCoordinator").finish_non_exhaustive()
    }
}

impl<T> Clone for RequestCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for RequestCoordinator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RequestCoordinator<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CoordinatorState::new())),
        }
    }

    fn slot(context: &str, key: &str) -> String {
        format!("{context}::{key}")
    }
}

impl<T> RequestCoordinator<T>
where
    T: Clone + Send + Sync + 'static,
{
    // == Deduplicate ==
    /// Runs `f` with at-most-one-in-flight semantics per `(context, key)`.
    ///
    /// If an identical operation is already in flight, its shared result is
    /// awaited instead of invoking `f` again; all waiters observe the same
    /// outcome. The operation runs on its own task, so it completes (and the
    /// slot is freed) even if every waiter is cancelled. The slot is removed
    /// on completion regardless of success or failure, making the key
    /// eligible for a fresh attempt.
    pub async fn deduplicate<F, Fut>(&self, context: &str, key: &str, f: F) -> SharedResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let slot = Self::slot(context, key);

        let shared = {
            let mut state = self.inner.lock().await;
            if let Some(existing) = state.pending.get(&slot) {
                existing.clone()
            } else {
                let fut = f();
                let inner = Arc::clone(&self.inner);
                let task_slot = slot.clone();
                let handle = tokio::spawn(async move {
                    let result = fut.await.map_err(SharedError::new);
                    inner.lock().await.pending.remove(&task_slot);
                    result
                });

                let shared: SharedFuture<T> = async move {
                    match handle.await {
                        Ok(result) => result,
                        Err(join_err) => Err(SharedError::new(anyhow::anyhow!(
                            "coordinated operation aborted: {join_err}"
                        ))),
                    }
                }
                .boxed()
                .shared();

                state.pending.insert(slot, shared.clone());
                shared
            }
        };

        shared.await
    }

    // == Throttle ==
    /// Returns true when less than `delay` has elapsed since the last
    /// recorded attempt for this key, in which case the caller must skip or
    /// defer. Otherwise records now as the last attempt and returns false.
    /// Check-and-record is a single atomic step.
    pub async fn should_throttle(&self, context: &str, key: &str, delay: Duration) -> bool {
        let slot = Self::slot(context, key);
        let mut state = self.inner.lock().await;
        let now = Instant::now();

        match state.last_call.get(&slot) {
            Some(last) if now.duration_since(*last) < delay => true,
            _ => {
                state.last_call.insert(slot, now);
                false
            }
        }
    }

    // == Circuit Breaker ==
    /// Returns whether the breaker for this key is open.
    ///
    /// An open breaker past `timeout` auto-closes: the breaker and the
    /// failure count are cleared and false is returned, independent of any
    /// success having been recorded.
    pub async fn is_circuit_open(&self, context: &str, key: &str, timeout: Duration) -> bool {
        let slot = Self::slot(context, key);
        let mut state = self.inner.lock().await;

        let Some(breaker) = state.breakers.get(&slot).copied() else {
            return false;
        };

        if breaker.open && breaker.opened_at.elapsed() > timeout {
            state.breakers.remove(&slot);
            state.failures.remove(&slot);
            return false;
        }

        breaker.open
    }

    /// Clears the failure count and breaker for this key.
    pub async fn record_success(&self, context: &str, key: &str) {
        let slot = Self::slot(context, key);
        let mut state = self.inner.lock().await;
        state.failures.remove(&slot);
        state.breakers.remove(&slot);
    }

    /// Records a failure. Once the consecutive-failure count reaches
    /// `max_failures` the breaker opens and true is returned (the breaker
    /// just tripped); otherwise false.
    pub async fn record_failure(&self, context: &str, key: &str, max_failures: u32) -> bool {
        let slot = Self::slot(context, key);
        let mut state = self.inner.lock().await;

        let count = state.failures.entry(slot.clone()).or_insert(0);
        *count += 1;
        let count = *count;

        if count >= max_failures {
            state.breakers.insert(
                slot,
                Breaker {
                    open: true,
                    opened_at: Instant::now(),
                },
            );
            warn!(context, key, failures = count, "circuit breaker opened");
            true
        } else {
            false
        }
    }

    // == Cleanup ==
    /// Housekeeping: drops throttle timestamps and open breakers older than
    /// `max_age` (with the breaker's failure count), bounding memory growth
    /// over long process lifetimes. Returns the number of entries dropped.
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        let mut state = self.inner.lock().await;
        let mut removed = 0;

        let before = state.last_call.len();
        state.last_call.retain(|_, last| last.elapsed() <= max_age);
        removed += before - state.last_call.len();

        let stale: Vec<String> = state
            .breakers
            .iter()
            .filter(|(_, breaker)| breaker.open && breaker.opened_at.elapsed() > max_age)
            .map(|(slot, _)| slot.clone())
            .collect();
        for slot in &stale {
            state.breakers.remove(slot);
            state.failures.remove(slot);
        }
        removed += stale.len();

        removed
    }

    /// Number of operations currently in flight across all contexts.
    pub async fn pending_len(&self) -> usize {
        self.inner.lock().await.pending.len()
    }
}
