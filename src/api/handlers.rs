//! API Handlers
//!
//! HTTP request handlers for each service endpoint. These are the thin
//! collaborator layer over the cache core: domain reads and writes,
//! mutation-event invalidation, and the coordinated dashboard read path.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::cache::{
    get_cached, CacheDomain, CacheRegistry, RegistryStats, DASHBOARD_STATS_KEY,
};
use crate::config::Config;
use crate::coordinator::RequestCoordinator;
use crate::error::{ApiError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, InvalidateResponse, InvalidateSubmissionRequest,
    InvalidateTaskQuery, SetRequest, SetResponse,
};

/// Coordinator namespace for dashboard reads.
const DASHBOARD_CONTEXT: &str = "dashboard";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Named domain caches
    pub registry: Arc<CacheRegistry>,
    /// Dedup/throttle/breaker state for coordinated reads
    pub coordinator: RequestCoordinator<Value>,
    /// Service configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new AppState from configuration.
    pub fn from_config(config: Config) -> Self {
        Self {
            registry: Arc::new(CacheRegistry::from_config(&config)),
            coordinator: RequestCoordinator::new(),
            config: Arc::new(config),
        }
    }
}

fn parse_domain(domain: &str) -> Result<CacheDomain> {
    domain
        .parse()
        .map_err(|_| ApiError::UnknownDomain(domain.to_string()))
}

/// Handler for PUT /cache/:domain/set
///
/// Stores a JSON payload in the named domain cache with optional TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Path(domain): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let domain = parse_domain(&domain)?;
    let ttl = req.ttl_ms.map(Duration::from_millis);

    let mut cache = state.registry.cache(domain).write().await;
    cache.set(req.key.clone(), req.value, ttl);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /cache/:domain/get/:key
///
/// Retrieves a value from the named domain cache. A miss (absent or
/// expired) is a 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path((domain, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    let domain = parse_domain(&domain)?;

    // Write lock: get lazily deletes expired entries and updates stats
    let mut cache = state.registry.cache(domain).write().await;
    match cache.get(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(ApiError::NotFound(key)),
    }
}

/// Handler for DELETE /cache/:domain/del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((domain, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let domain = parse_domain(&domain)?;

    let mut cache = state.registry.cache(domain).write().await;
    if cache.delete(&key) {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(ApiError::NotFound(key))
    }
}

// == Invalidation Handlers ==
// Mutation endpoints call these after writing to the system of record, so
// subsequent reads are never stale beyond their own TTL window.

/// Handler for POST /invalidate/user/:id
pub async fn invalidate_user_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.registry.invalidate_user(&user_id).await;
    Json(InvalidateResponse::new(&format!("user {user_id}"), removed))
}

/// Handler for POST /invalidate/course/:id
pub async fn invalidate_course_handler(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.registry.invalidate_course(&course_id).await;
    Json(InvalidateResponse::new(
        &format!("course {course_id}"),
        removed,
    ))
}

/// Handler for POST /invalidate/task/:id?topic_id=...
pub async fn invalidate_task_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Query(query): Query<InvalidateTaskQuery>,
) -> Json<InvalidateResponse> {
    let removed = state
        .registry
        .invalidate_task(&task_id, query.topic_id.as_deref())
        .await;
    Json(InvalidateResponse::new(&format!("task {task_id}"), removed))
}

/// Handler for POST /invalidate/submission
pub async fn invalidate_submission_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateSubmissionRequest>,
) -> Json<InvalidateResponse> {
    let removed = state
        .registry
        .invalidate_submission(&req.submission_id, &req.student_id, &req.task_id)
        .await;
    Json(InvalidateResponse::new(
        &format!("submission {}", req.submission_id),
        removed,
    ))
}

/// Handler for POST /invalidate/chat
pub async fn invalidate_chat_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let removed = state.registry.invalidate_chat().await;
    Json(InvalidateResponse::new("chat", removed))
}

/// Handler for POST /invalidate/all
pub async fn invalidate_all_handler(State(state): State<AppState>) -> Json<InvalidateResponse> {
    state.registry.clear_all().await;
    Json(InvalidateResponse::new("all domains", 0))
}

// == Dashboard ==

/// Handler for GET /dashboard/stats
///
/// The coordinated read path: serve from cache when fresh; otherwise gate
/// the refresh behind the circuit breaker and the throttle, deduplicate
/// concurrent refreshes, and cache the aggregate for the configured TTL.
pub async fn dashboard_stats_handler(State(state): State<AppState>) -> Result<Json<Value>> {
    let config = &state.config;

    if let Some(hit) = state
        .registry
        .general
        .write()
        .await
        .get(DASHBOARD_STATS_KEY)
    {
        return Ok(Json(hit));
    }

    let breaker_timeout = Duration::from_millis(config.breaker_timeout_ms);
    if state
        .coordinator
        .is_circuit_open(DASHBOARD_CONTEXT, DASHBOARD_STATS_KEY, breaker_timeout)
        .await
    {
        return Err(ApiError::Unavailable(
            "dashboard aggregation is failing, retry shortly".to_string(),
        ));
    }

    let throttle = Duration::from_millis(config.dashboard_throttle_ms);
    if state
        .coordinator
        .should_throttle(DASHBOARD_CONTEXT, DASHBOARD_STATS_KEY, throttle)
        .await
    {
        return Err(ApiError::Unavailable(
            "dashboard is refreshing too frequently, retry shortly".to_string(),
        ));
    }

    let result = state
        .coordinator
        .deduplicate(DASHBOARD_CONTEXT, DASHBOARD_STATS_KEY, {
            let registry = Arc::clone(&state.registry);
            let ttl = Duration::from_millis(config.dashboard_stats_ttl_ms);
            move || async move {
                get_cached(&registry.general, DASHBOARD_STATS_KEY, Some(ttl), || async {
                    let stats = registry.stats().await;
                    build_dashboard_stats(&stats)
                })
                .await
            }
        })
        .await;

    match result {
        Ok(value) => {
            state
                .coordinator
                .record_success(DASHBOARD_CONTEXT, DASHBOARD_STATS_KEY)
                .await;
            Ok(Json(value))
        }
        Err(err) => {
            let tripped = state
                .coordinator
                .record_failure(
                    DASHBOARD_CONTEXT,
                    DASHBOARD_STATS_KEY,
                    config.breaker_max_failures,
                )
                .await;
            if tripped {
                warn!("dashboard aggregation breaker tripped");
            }
            Err(ApiError::Upstream(err.to_string()))
        }
    }
}

/// Builds the dashboard aggregate from a per-domain stats snapshot.
fn build_dashboard_stats(stats: &RegistryStats) -> anyhow::Result<Value> {
    let domains = [
        &stats.users,
        &stats.courses,
        &stats.tasks,
        &stats.submissions,
        &stats.general,
    ];

    let hits: u64 = domains.iter().map(|s| s.hits).sum();
    let misses: u64 = domains.iter().map(|s| s.misses).sum();
    let entries: usize = domains.iter().map(|s| s.total_entries).sum();
    let requests = hits + misses;
    let hit_rate = if requests == 0 {
        0.0
    } else {
        hits as f64 / requests as f64
    };

    Ok(json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "totals": {
            "hits": hits,
            "misses": misses,
            "entries": entries,
            "hit_rate": hit_rate,
        },
        "domains": serde_json::to_value(stats)?,
    }))
}

/// Handler for GET /stats
///
/// Returns per-domain cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<RegistryStats> {
    Json(state.registry.stats().await)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
