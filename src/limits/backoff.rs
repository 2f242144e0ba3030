//! Jittered exponential backoff.

use rand::Rng;

// == Exponential Backoff ==
/// Computes the delay in milliseconds before retry number `attempt`:
/// `min(base_delay * factor^attempt, max_delay)` plus up to 10% random
/// jitter, floored to an integer. The jitter spreads out retries from
/// callers that failed at the same moment.
pub fn exponential_backoff(attempt: u32, base_delay_ms: u64, max_delay_ms: u64, factor: f64) -> u64 {
    let exponential = base_delay_ms as f64 * factor.powi(attempt as i32);
    let capped = exponential.min(max_delay_ms as f64);
    let jitter = capped * 0.1 * rand::thread_rng().gen::<f64>();
    (capped + jitter).floor() as u64
}
