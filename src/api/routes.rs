//! API Routes
//!
//! Configures the Axum router with all service endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    dashboard_stats_handler, delete_handler, get_handler, health_handler,
    invalidate_all_handler, invalidate_chat_handler, invalidate_course_handler,
    invalidate_submission_handler, invalidate_task_handler, invalidate_user_handler, set_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache/:domain/set` - Store a payload in a domain cache
/// - `GET /cache/:domain/get/:key` - Retrieve a payload by key
/// - `DELETE /cache/:domain/del/:key` - Delete a key
/// - `POST /invalidate/user/:id` - User-changed event
/// - `POST /invalidate/course/:id` - Course-changed event
/// - `POST /invalidate/task/:id` - Task-changed event (`?topic_id=` optional)
/// - `POST /invalidate/submission` - Submission-changed event
/// - `POST /invalidate/chat` - Chat-activity event
/// - `POST /invalidate/all` - Clear every cache (recovery only)
/// - `GET /dashboard/stats` - Coordinated, cached dashboard aggregate
/// - `GET /stats` - Per-domain cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/cache/:domain/set", put(set_handler))
        .route("/cache/:domain/get/:key", get(get_handler))
        .route("/cache/:domain/del/:key", delete(delete_handler))
        .route("/invalidate/user/:id", post(invalidate_user_handler))
        .route("/invalidate/course/:id", post(invalidate_course_handler))
        .route("/invalidate/task/:id", post(invalidate_task_handler))
        .route("/invalidate/submission", post(invalidate_submission_handler))
        .route("/invalidate/chat", post(invalidate_chat_handler))
        .route("/invalidate/all", post(invalidate_all_handler))
        .route("/dashboard/stats", get(dashboard_stats_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
