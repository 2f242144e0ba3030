//! Cache Module
//!
//! In-memory caching with TTL expiration, FIFO eviction, and regex-based
//! bulk invalidation, plus the named per-domain cache registry.

mod entry;
mod fifo;
mod key;
mod registry;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use fifo::InsertionOrder;
pub use key::build_key;
pub use registry::{
    course_key, course_modules_key, get_cached, student_submissions_key, submission_key,
    task_key, task_submissions_key, topic_tasks_key, user_key, CacheDomain, CacheRegistry,
    RegistryStats, SharedCache, CHAT_RECENT_KEY, COURSES_ALL_KEY, DASHBOARD_STATS_KEY,
    RANKINGS_KEY,
};
pub use stats::CacheStats;
pub use store::TtlCache;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
