//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle for each endpoint, including the
//! coordinated dashboard read path and mutation-event invalidation.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use campus_cache::{api::create_router, AppState, Config};
use serde_json::{json, Value};
use std::thread::sleep;
use std::time::Duration;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_router(AppState::from_config(Config::default()))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn put_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// == SET Endpoint Tests ==

#[tokio::test]
async fn test_set_endpoint_success() {
    let app = create_test_app();

    let response = app
        .oneshot(put_json(
            "/cache/users/set",
            r#"{"key":"user:1","value":{"name":"Ada"}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_to_json(response.into_body()).await;
    assert!(body["message"].as_str().unwrap().contains("user:1"));
}

#[tokio::test]
async fn test_set_endpoint_with_ttl() {
    let app = create_test_app();

    let response = app
        .oneshot(put_json(
            "/cache/tasks/set",
            r#"{"key":"task:9","value":[1,2,3],"ttl_ms":60000}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_set_endpoint_unknown_domain() {
    let app = create_test_app();

    let response = app
        .oneshot(put_json("/cache/bogus/set", r#"{"key":"k","value":1}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == GET Endpoint Tests ==

#[tokio::test]
async fn test_get_endpoint_success() {
    let app = create_test_app();

    let set_response = app
        .clone()
        .oneshot(put_json(
            "/cache/courses/set",
            r#"{"key":"course:7","value":{"title":"Rust"}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = app
        .oneshot(get_req("/cache/courses/get/course:7"))
        .await
        .unwrap();

    assert_eq!(get_response.status(), StatusCode::OK);
    let body = body_to_json(get_response.into_body()).await;
    assert_eq!(body["key"].as_str().unwrap(), "course:7");
    assert_eq!(body["value"], json!({"title": "Rust"}));
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app();

    let response = app
        .oneshot(get_req("/cache/users/get/nonexistent_key"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_to_json(response.into_body()).await;
    assert!(body.get("error").is_some());
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let app = create_test_app();

    let set_response = app
        .clone()
        .oneshot(put_json(
            "/cache/general/set",
            r#"{"key":"rankings","value":["u1","u2"]}"#,
        ))
        .await
        .unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    let del_response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache/general/del/rankings")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(del_response.status(), StatusCode::OK);

    let get_response = app
        .oneshot(get_req("/cache/general/get/rankings"))
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_not_found() {
    let app = create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache/general/del/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == Invalidation Endpoint Tests ==

#[tokio::test]
async fn test_invalidate_submission_endpoint() {
    let app = create_test_app();

    // Seed the caches a mutation would make stale
    for (uri, body) in [
        (
            "/cache/submissions/set",
            r#"{"key":"submission:s1","value":{"grade":null}}"#,
        ),
        (
            "/cache/submissions/set",
            r#"{"key":"submissions:student:u1","value":[]}"#,
        ),
        (
            "/cache/submissions/set",
            r#"{"key":"submissions:task:t1","value":[]}"#,
        ),
        ("/cache/general/set", r#"{"key":"rankings","value":[]}"#),
    ] {
        let response = app.clone().oneshot(put_json(uri, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(post_json(
            "/invalidate/submission",
            r#"{"submission_id":"s1","student_id":"u1","task_id":"t1"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["removed"].as_u64().unwrap(), 4);

    // All affected keys are gone
    for uri in [
        "/cache/submissions/get/submission:s1",
        "/cache/submissions/get/submissions:student:u1",
        "/cache/submissions/get/submissions:task:t1",
        "/cache/general/get/rankings",
    ] {
        let response = app.clone().oneshot(get_req(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri} should be gone");
    }
}

#[tokio::test]
async fn test_invalidate_user_endpoint_leaves_other_users() {
    let app = create_test_app();

    for body in [
        r#"{"key":"submissions:student:u1","value":[]}"#,
        r#"{"key":"submissions:student:u2","value":[]}"#,
    ] {
        let response = app
            .clone()
            .oneshot(put_json("/cache/submissions/set", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(post_json("/invalidate/user/u1", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let gone = app
        .clone()
        .oneshot(get_req("/cache/submissions/get/submissions:student:u1"))
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let kept = app
        .oneshot(get_req("/cache/submissions/get/submissions:student:u2"))
        .await
        .unwrap();
    assert_eq!(kept.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_invalidate_all_endpoint() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(put_json(
            "/cache/users/set",
            r#"{"key":"user:1","value":{}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json("/invalidate/all", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_req("/cache/users/get/user:1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == Dashboard Scenario Tests ==

#[tokio::test]
async fn test_dashboard_stats_end_to_end() {
    let app = create_test_app();

    // First request: cache miss, the aggregate is computed and cached
    let first = app
        .clone()
        .oneshot(get_req("/dashboard/stats"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_to_json(first.into_body()).await;
    assert!(first.get("totals").is_some());

    // Second request inside the TTL window: served from cache, so the
    // payload is byte-identical even though counters have since moved
    let second = app
        .clone()
        .oneshot(get_req("/dashboard/stats"))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_to_json(second.into_body()).await;
    assert_eq!(first, second);

    // A submission-changed event drops the cached aggregate
    let invalidate = app
        .clone()
        .oneshot(post_json(
            "/invalidate/submission",
            r#"{"submission_id":"s1","student_id":"u1","task_id":"t1"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(invalidate.status(), StatusCode::OK);

    // Throttle window for the dashboard refresh is 1s by default
    sleep(Duration::from_millis(1100));

    // Next request recomputes: the cached-hit counter moved, so the
    // aggregate differs from the first one
    let third = app
        .clone()
        .oneshot(get_req("/dashboard/stats"))
        .await
        .unwrap();
    assert_eq!(third.status(), StatusCode::OK);
    let third = body_to_json(third.into_body()).await;
    assert_ne!(first, third);
    assert!(
        third["totals"]["hits"].as_u64().unwrap() > first["totals"]["hits"].as_u64().unwrap()
    );
}

#[tokio::test]
async fn test_dashboard_stats_throttled_miss_returns_503() {
    let config = Config {
        dashboard_throttle_ms: 60_000,
        ..Config::default()
    };
    let state = AppState::from_config(config);
    let app = create_router(state.clone());

    // Populate the cache and record a refresh attempt
    let first = app
        .clone()
        .oneshot(get_req("/dashboard/stats"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // Force a miss inside the throttle window
    state
        .registry
        .general
        .write()
        .await
        .delete(campus_cache::cache::DASHBOARD_STATS_KEY);

    let second = app.oneshot(get_req("/dashboard/stats")).await.unwrap();
    assert_eq!(second.status(), StatusCode::SERVICE_UNAVAILABLE);
}

// == STATS Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(put_json(
            "/cache/users/set",
            r#"{"key":"user:1","value":{}}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // One hit, one miss
    let hit = app
        .clone()
        .oneshot(get_req("/cache/users/get/user:1"))
        .await
        .unwrap();
    assert_eq!(hit.status(), StatusCode::OK);
    let miss = app
        .clone()
        .oneshot(get_req("/cache/users/get/nonexistent"))
        .await
        .unwrap();
    assert_eq!(miss.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get_req("/stats")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;

    assert_eq!(body["users"]["hits"].as_u64().unwrap(), 1);
    assert_eq!(body["users"]["misses"].as_u64().unwrap(), 1);
    assert_eq!(body["users"]["total_entries"].as_u64().unwrap(), 1);
    assert_eq!(body["submissions"]["total_entries"].as_u64().unwrap(), 0);
}

// == HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = app.oneshot(get_req("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["status"].as_str().unwrap(), "healthy");
    assert!(body.get("timestamp").is_some());
}

// == Error Response Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();

    let response = app
        .oneshot(put_json("/cache/users/set", r#"{"invalid json"#))
        .await
        .unwrap();

    // Axum returns 400 or 422 for JSON parsing errors depending on stage
    assert!(
        response.status() == StatusCode::BAD_REQUEST
            || response.status() == StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = create_test_app();

    let response = app
        .oneshot(put_json("/cache/users/set", r#"{"key":"","value":1}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_to_json(response.into_body()).await;
    assert!(body.get("error").is_some());
}

// == TTL Expiration via API Tests ==

#[tokio::test]
async fn test_ttl_expiration_via_api() {
    let app = create_test_app();

    let set_response = app
        .clone()
        .oneshot(put_json(
            "/cache/general/set",
            r#"{"key":"chat:recent","value":["hi"],"ttl_ms":200}"#,
        ))
        .await
        .unwrap();
    assert_eq!(set_response.status(), StatusCode::OK);

    let get_response = app
        .clone()
        .oneshot(get_req("/cache/general/get/chat:recent"))
        .await
        .unwrap();
    assert_eq!(get_response.status(), StatusCode::OK);

    sleep(Duration::from_millis(300));

    let get_response = app
        .oneshot(get_req("/cache/general/get/chat:recent"))
        .await
        .unwrap();

    assert_eq!(get_response.status(), StatusCode::NOT_FOUND);
}
