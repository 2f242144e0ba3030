//! API Module
//!
//! HTTP handlers and routing for the service REST API: domain cache reads
//! and writes, mutation-event invalidation, the coordinated dashboard
//! aggregate, statistics, and health.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
