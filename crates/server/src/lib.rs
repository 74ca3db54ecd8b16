//! HTTP server for the Larder update pipeline.
//!
//! This crate provides:
//! - Signed update intake (`POST /v1/databases`)
//! - Reads of the current record per schema version
//! - Health and Prometheus endpoints
//!
//! The HTTP-independent pipeline lives in [`service`].

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod service;
pub mod state;
pub mod trace;

pub use error::ApiError;
pub use routes::create_router;
pub use service::{ServiceError, ServiceResult};
pub use state::AppState;
pub use trace::TraceId;
