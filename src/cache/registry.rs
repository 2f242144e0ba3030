//! Named Cache Registry
//!
//! A fixed set of independently configured cache instances, one per data
//! domain, plus the invalidation helpers that know which keys belong to
//! which domain event. Payloads are `serde_json::Value`; the caller owns
//! the shape stored under each key.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{CacheStats, TtlCache};
use crate::config::Config;

// == Well-Known Keys ==
/// Cached leaderboard across all students.
pub const RANKINGS_KEY: &str = "rankings";
/// Cached dashboard aggregate view.
pub const DASHBOARD_STATS_KEY: &str = "dashboard:stats";
/// Cached recent chat messages.
pub const CHAT_RECENT_KEY: &str = "chat:recent";
/// Cached list of all courses.
pub const COURSES_ALL_KEY: &str = "courses:all";

pub fn user_key(user_id: &str) -> String {
    format!("user:{user_id}")
}

pub fn course_key(course_id: &str) -> String {
    format!("course:{course_id}")
}

pub fn course_modules_key(course_id: &str) -> String {
    format!("course:{course_id}:modules")
}

pub fn task_key(task_id: &str) -> String {
    format!("task:{task_id}")
}

pub fn topic_tasks_key(topic_id: &str) -> String {
    format!("topic:{topic_id}:tasks")
}

pub fn submission_key(submission_id: &str) -> String {
    format!("submission:{submission_id}")
}

pub fn student_submissions_key(student_id: &str) -> String {
    format!("submissions:student:{student_id}")
}

pub fn task_submissions_key(task_id: &str) -> String {
    format!("submissions:task:{task_id}")
}

// == Cache Domain ==
/// Logical data domains, each backed by its own cache instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDomain {
    Users,
    Courses,
    Tasks,
    Submissions,
    General,
}

impl FromStr for CacheDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "users" => Ok(Self::Users),
            "courses" => Ok(Self::Courses),
            "tasks" => Ok(Self::Tasks),
            "submissions" => Ok(Self::Submissions),
            "general" => Ok(Self::General),
            other => Err(format!("unknown cache domain '{other}'")),
        }
    }
}

impl std::fmt::Display for CacheDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Users => "users",
            Self::Courses => "courses",
            Self::Tasks => "tasks",
            Self::Submissions => "submissions",
            Self::General => "general",
        };
        f.write_str(name)
    }
}

/// Shared handle to a single domain cache.
pub type SharedCache = Arc<RwLock<TtlCache<Value>>>;

// == Registry Stats ==
/// Per-domain statistics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub users: CacheStats,
    pub courses: CacheStats,
    pub tasks: CacheStats,
    pub submissions: CacheStats,
    pub general: CacheStats,
}

// == Cache Registry ==
/// All domain caches, constructed once at application start and shared
/// through application state. Dropping the registry drops every entry;
/// nothing here persists across restarts.
#[derive(Debug)]
pub struct CacheRegistry {
    pub users: SharedCache,
    pub courses: SharedCache,
    pub tasks: SharedCache,
    pub submissions: SharedCache,
    pub general: SharedCache,
}

impl CacheRegistry {
    // == Constructor ==
    /// Creates the registry with per-domain capacity and TTL from config.
    ///
    /// Each domain is tuned to its data's churn rate: user data changes
    /// rarely, submissions churn constantly.
    pub fn from_config(config: &Config) -> Self {
        Self {
            users: shared_cache(config.user_cache_capacity, config.user_cache_ttl_ms),
            courses: shared_cache(config.course_cache_capacity, config.course_cache_ttl_ms),
            tasks: shared_cache(config.task_cache_capacity, config.task_cache_ttl_ms),
            submissions: shared_cache(
                config.submission_cache_capacity,
                config.submission_cache_ttl_ms,
            ),
            general: shared_cache(config.general_cache_capacity, config.general_cache_ttl_ms),
        }
    }

    /// Returns the cache backing the given domain.
    pub fn cache(&self, domain: CacheDomain) -> &SharedCache {
        match domain {
            CacheDomain::Users => &self.users,
            CacheDomain::Courses => &self.courses,
            CacheDomain::Tasks => &self.tasks,
            CacheDomain::Submissions => &self.submissions,
            CacheDomain::General => &self.general,
        }
    }

    // == Invalidation Helpers ==
    // Each helper touches only the keys logically affected by its domain
    // event. The touches are idempotent and commute, so no ordering between
    // caches is required.

    /// A user changed: drop the user entry, their submission lists, and the
    /// rankings (which aggregate over users).
    pub async fn invalidate_user(&self, user_id: &str) -> usize {
        let mut removed = 0;

        removed += bool_as_count(self.users.write().await.delete(&user_key(user_id)));

        let pattern = prefix_pattern(&student_submissions_key(user_id));
        removed += self.submissions.write().await.invalidate_pattern(&pattern);

        removed += bool_as_count(self.general.write().await.delete(RANKINGS_KEY));

        debug!(user_id, removed, "user cache entries invalidated");
        removed
    }

    /// A course changed: drop the course entry, the all-courses list, and
    /// the course's module list.
    pub async fn invalidate_course(&self, course_id: &str) -> usize {
        let mut courses = self.courses.write().await;
        let removed = bool_as_count(courses.delete(&course_key(course_id)))
            + bool_as_count(courses.delete(COURSES_ALL_KEY))
            + bool_as_count(courses.delete(&course_modules_key(course_id)));
        drop(courses);

        debug!(course_id, removed, "course cache entries invalidated");
        removed
    }

    /// A task changed: drop the task entry, its parent topic's task list
    /// when known, and all submission lists for the task.
    pub async fn invalidate_task(&self, task_id: &str, topic_id: Option<&str>) -> usize {
        let mut removed = 0;

        {
            let mut tasks = self.tasks.write().await;
            removed += bool_as_count(tasks.delete(&task_key(task_id)));
            if let Some(topic_id) = topic_id {
                removed += bool_as_count(tasks.delete(&topic_tasks_key(topic_id)));
            }
        }

        let pattern = prefix_pattern(&task_submissions_key(task_id));
        removed += self.submissions.write().await.invalidate_pattern(&pattern);

        debug!(task_id, removed, "task cache entries invalidated");
        removed
    }

    /// A submission changed: drop the submission entry, the student's and
    /// the task's submission lists, and the aggregate views that depend on
    /// submissions (rankings, dashboard stats).
    pub async fn invalidate_submission(
        &self,
        submission_id: &str,
        student_id: &str,
        task_id: &str,
    ) -> usize {
        let mut removed = 0;

        {
            let mut submissions = self.submissions.write().await;
            removed += bool_as_count(submissions.delete(&submission_key(submission_id)));
            removed += bool_as_count(submissions.delete(&student_submissions_key(student_id)));
            removed += bool_as_count(submissions.delete(&task_submissions_key(task_id)));
        }

        {
            let mut general = self.general.write().await;
            removed += bool_as_count(general.delete(RANKINGS_KEY));
            removed += bool_as_count(general.delete(DASHBOARD_STATS_KEY));
        }

        debug!(submission_id, removed, "submission cache entries invalidated");
        removed
    }

    /// Chat activity: drop the cached recent-messages entry.
    pub async fn invalidate_chat(&self) -> usize {
        let removed = bool_as_count(self.general.write().await.delete(CHAT_RECENT_KEY));
        debug!(removed, "chat cache entries invalidated");
        removed
    }

    /// Clears every cache. Reserved for exceptional recovery, not normal
    /// operation.
    pub async fn clear_all(&self) {
        self.users.write().await.clear();
        self.courses.write().await.clear();
        self.tasks.write().await.clear();
        self.submissions.write().await.clear();
        self.general.write().await.clear();
        debug!("all caches cleared");
    }

    // == Sweep ==
    /// Removes expired entries from every domain cache. Returns the total
    /// number removed.
    pub async fn sweep_expired(&self) -> usize {
        self.users.write().await.sweep_expired()
            + self.courses.write().await.sweep_expired()
            + self.tasks.write().await.sweep_expired()
            + self.submissions.write().await.sweep_expired()
            + self.general.write().await.sweep_expired()
    }

    // == Stats ==
    /// Per-domain statistics snapshot.
    pub async fn stats(&self) -> RegistryStats {
        RegistryStats {
            users: self.users.read().await.stats(),
            courses: self.courses.read().await.stats(),
            tasks: self.tasks.read().await.stats(),
            submissions: self.submissions.read().await.stats(),
            general: self.general.read().await.stats(),
        }
    }
}

// == Get Cached ==
/// Cache-or-fetch helper: looks up `key`; on a hit returns immediately, on
/// a miss invokes `fetcher`, stores the result under `ttl` (or the cache
/// default), and returns it.
///
/// This helper does not deduplicate concurrent misses for the same key.
/// Under concurrent callers it will fetch once per caller (a cache
/// stampede); compose it with
/// [`RequestCoordinator::deduplicate`](crate::coordinator::RequestCoordinator::deduplicate)
/// when concurrent misses are possible.
pub async fn get_cached<F, Fut>(
    cache: &RwLock<TtlCache<Value>>,
    key: &str,
    ttl: Option<Duration>,
    fetcher: F,
) -> anyhow::Result<Value>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = anyhow::Result<Value>>,
{
    if let Some(hit) = cache.write().await.get(key) {
        return Ok(hit);
    }

    let value = fetcher().await?;
    cache.write().await.set(key, value.clone(), ttl);
    Ok(value)
}

fn shared_cache(capacity: usize, ttl_ms: u64) -> SharedCache {
    Arc::new(RwLock::new(TtlCache::new(
        capacity,
        Duration::from_millis(ttl_ms),
    )))
}

/// Anchored prefix pattern for a literal key prefix.
fn prefix_pattern(prefix: &str) -> Regex {
    Regex::new(&format!("^{}", regex::escape(prefix)))
        .expect("escaped literal is always a valid pattern")
}

fn bool_as_count(removed: bool) -> usize {
    usize::from(removed)
}
