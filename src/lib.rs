//! Campus Cache - in-memory caching and request coordination for
//! learning-platform dashboards
//!
//! Provides per-domain TTL caches with FIFO eviction and pattern
//! invalidation, a request coordinator (deduplication, throttling,
//! circuit breaking), and rate-limiting primitives, behind a thin HTTP
//! surface.

pub mod api;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod limits;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{build_key, CacheRegistry, TtlCache};
pub use config::Config;
pub use coordinator::RequestCoordinator;
pub use tasks::{spawn_coordinator_cleanup_task, spawn_sweep_task};
