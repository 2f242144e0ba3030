//! Request and Response models for the service API
//!
//! DTOs used for serializing/deserializing HTTP request and response
//! bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{InvalidateSubmissionRequest, InvalidateTaskQuery, SetRequest};
pub use responses::{
    DeleteResponse, ErrorResponse, GetResponse, HealthResponse, InvalidateResponse, SetResponse,
};
