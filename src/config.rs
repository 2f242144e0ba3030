//! Configuration Module
//!
//! Handles loading and managing service configuration from environment
//! variables. Cache TTLs and coordinator windows are in milliseconds;
//! background task intervals are in seconds.

use std::env;
use std::str::FromStr;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible
/// defaults. Per-domain TTL/capacity pairs reflect how quickly each kind
/// of data churns: course data is nearly static, submission data is not.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,

    /// User cache: TTL in milliseconds and max entries
    pub user_cache_ttl_ms: u64,
    pub user_cache_capacity: usize,
    /// Course cache
    pub course_cache_ttl_ms: u64,
    pub course_cache_capacity: usize,
    /// Task cache
    pub task_cache_ttl_ms: u64,
    pub task_cache_capacity: usize,
    /// Submission cache
    pub submission_cache_ttl_ms: u64,
    pub submission_cache_capacity: usize,
    /// General-purpose cache (rankings, dashboard, chat)
    pub general_cache_ttl_ms: u64,
    pub general_cache_capacity: usize,

    /// Background expired-entry sweep interval in seconds
    pub sweep_interval_secs: u64,
    /// Coordinator housekeeping interval in seconds
    pub coordinator_cleanup_interval_secs: u64,
    /// Age past which throttle timestamps and open breakers are dropped, ms
    pub coordinator_max_age_ms: u64,

    /// TTL for the cached dashboard aggregate, ms
    pub dashboard_stats_ttl_ms: u64,
    /// Minimum spacing between dashboard refresh attempts, ms
    pub dashboard_throttle_ms: u64,
    /// Consecutive failures before the dashboard breaker opens
    pub breaker_max_failures: u32,
    /// How long an open breaker rejects calls before auto-closing, ms
    pub breaker_timeout_ms: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `USER_CACHE_TTL_MS` / `USER_CACHE_CAPACITY` (default: 600000 / 50)
    /// - `COURSE_CACHE_TTL_MS` / `COURSE_CACHE_CAPACITY` (default: 1800000 / 100)
    /// - `TASK_CACHE_TTL_MS` / `TASK_CACHE_CAPACITY` (default: 900000 / 200)
    /// - `SUBMISSION_CACHE_TTL_MS` / `SUBMISSION_CACHE_CAPACITY` (default: 300000 / 500)
    /// - `GENERAL_CACHE_TTL_MS` / `GENERAL_CACHE_CAPACITY` (default: 300000 / 100)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    /// - `COORDINATOR_CLEANUP_INTERVAL` - Housekeeping frequency in seconds (default: 300)
    /// - `COORDINATOR_MAX_AGE_MS` - Stale coordinator state age (default: 300000)
    /// - `DASHBOARD_STATS_TTL_MS` (default: 300000)
    /// - `DASHBOARD_THROTTLE_MS` (default: 1000)
    /// - `BREAKER_MAX_FAILURES` (default: 3)
    /// - `BREAKER_TIMEOUT_MS` (default: 30000)
    pub fn from_env() -> Self {
        Self {
            server_port: env_or("SERVER_PORT", 3000),
            user_cache_ttl_ms: env_or("USER_CACHE_TTL_MS", 600_000),
            user_cache_capacity: env_or("USER_CACHE_CAPACITY", 50),
            course_cache_ttl_ms: env_or("COURSE_CACHE_TTL_MS", 1_800_000),
            course_cache_capacity: env_or("COURSE_CACHE_CAPACITY", 100),
            task_cache_ttl_ms: env_or("TASK_CACHE_TTL_MS", 900_000),
            task_cache_capacity: env_or("TASK_CACHE_CAPACITY", 200),
            submission_cache_ttl_ms: env_or("SUBMISSION_CACHE_TTL_MS", 300_000),
            submission_cache_capacity: env_or("SUBMISSION_CACHE_CAPACITY", 500),
            general_cache_ttl_ms: env_or("GENERAL_CACHE_TTL_MS", 300_000),
            general_cache_capacity: env_or("GENERAL_CACHE_CAPACITY", 100),
            sweep_interval_secs: env_or("SWEEP_INTERVAL", 60),
            coordinator_cleanup_interval_secs: env_or("COORDINATOR_CLEANUP_INTERVAL", 300),
            coordinator_max_age_ms: env_or("COORDINATOR_MAX_AGE_MS", 300_000),
            dashboard_stats_ttl_ms: env_or("DASHBOARD_STATS_TTL_MS", 300_000),
            dashboard_throttle_ms: env_or("DASHBOARD_THROTTLE_MS", 1_000),
            breaker_max_failures: env_or("BREAKER_MAX_FAILURES", 3),
            breaker_timeout_ms: env_or("BREAKER_TIMEOUT_MS", 30_000),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            user_cache_ttl_ms: 600_000,
            user_cache_capacity: 50,
            course_cache_ttl_ms: 1_800_000,
            course_cache_capacity: 100,
            task_cache_ttl_ms: 900_000,
            task_cache_capacity: 200,
            submission_cache_ttl_ms: 300_000,
            submission_cache_capacity: 500,
            general_cache_ttl_ms: 300_000,
            general_cache_capacity: 100,
            sweep_interval_secs: 60,
            coordinator_cleanup_interval_secs: 300,
            coordinator_max_age_ms: 300_000,
            dashboard_stats_ttl_ms: 300_000,
            dashboard_throttle_ms: 1_000,
            breaker_max_failures: 3,
            breaker_timeout_ms: 30_000,
        }
    }
}

/// Reads an environment variable, falling back to `default` when unset or
/// unparseable.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
