//! Request DTOs for the service API

use serde::Deserialize;
use serde_json::Value;

use crate::cache::MAX_KEY_LENGTH;

/// Request body for the SET operation (PUT /cache/:domain/set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Arbitrary JSON payload; the cache never inspects it
/// - `ttl_ms`: Optional TTL in milliseconds (domain default if omitted)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl SetRequest {
    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {MAX_KEY_LENGTH} bytes"
            ));
        }
        None
    }
}

/// Request body for POST /invalidate/submission.
///
/// A submission event touches more than one cache, so all three
/// identifiers are required.
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateSubmissionRequest {
    pub submission_id: String,
    pub student_id: String,
    pub task_id: String,
}

/// Query parameters for POST /invalidate/task/:id.
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateTaskQuery {
    /// Parent topic whose task list should also be dropped, when known
    #[serde(default)]
    pub topic_id: Option<String>,
}
