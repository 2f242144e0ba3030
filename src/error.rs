//! Error types for the HTTP surface
//!
//! Provides unified error handling using thiserror. Only the API layer
//! has errors: inside the cache core, a miss is an `Option`, not an error,
//! and the coordinator passes fetcher failures through untouched.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Api Error Enum ==
/// Unified error type for the service endpoints.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not present (or expired) in the requested cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Request named a cache domain that does not exist
    #[error("Unknown cache domain: {0}")]
    UnknownDomain(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transient refusal: open circuit or throttled refresh
    #[error("Temporarily unavailable: {0}")]
    Unavailable(String),

    /// The fetch behind a coordinated read failed
    #[error("Upstream fetch failed: {0}")]
    Upstream(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UnknownDomain(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the service endpoints.
pub type Result<T> = std::result::Result<T, ApiError>;
