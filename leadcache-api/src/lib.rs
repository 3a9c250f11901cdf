//! LeadCache API - REST Layer
//!
//! Axum server over the lead cache: single-key envelope reads and writes,
//! namespace aggregates, and the email suggestion proxy. State is built
//! once at startup ([`AppState::connect`]) and shared read-only by every
//! request.

pub mod config;
pub mod error;
pub mod macros;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod state;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, CacheSettings};
pub use error::{ApiError, ApiResult, ErrorBody, ErrorCode};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::{AppState, SharedGenerator};
pub use types::*;
