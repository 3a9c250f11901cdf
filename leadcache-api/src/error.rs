//! Error Types for the LeadCache API
//!
//! This module defines error handling for the API layer, including:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! Every error renders as `{success: false, error, code, details?}` with the
//! HTTP status derived from its code.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use leadcache_core::{
    DecodeError, EncodeError, GenerationError, LeadCacheError, StoreError, ValidationError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Invalid input data
    InvalidInput,

    /// Required field is missing
    MissingField,

    // ========================================================================
    // Server Errors (500, 502, 503, 504)
    // ========================================================================
    /// A stored entry could not be decoded
    CorruptEntry,

    /// Store command failed
    StoreError,

    /// Internal server error
    InternalError,

    /// Store is unreachable
    ServiceUnavailable,

    /// Store connection pool exhausted
    ConnectionPoolExhausted,

    /// Generation provider is not configured
    NotConfigured,

    /// Generation provider call failed
    GenerationFailed,

    /// Operation timed out
    Timeout,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed | ErrorCode::InvalidInput | ErrorCode::MissingField => {
                StatusCode::BAD_REQUEST
            }

            ErrorCode::ServiceUnavailable
            | ErrorCode::ConnectionPoolExhausted
            | ErrorCode::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,

            ErrorCode::GenerationFailed => StatusCode::BAD_GATEWAY,

            ErrorCode::Timeout => StatusCode::GATEWAY_TIMEOUT,

            ErrorCode::CorruptEntry | ErrorCode::StoreError | ErrorCode::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::CorruptEntry => "Stored entry is corrupt",
            ErrorCode::StoreError => "Store operation failed",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
            ErrorCode::ConnectionPoolExhausted => "Connection pool exhausted",
            ErrorCode::NotConfigured => "Generation provider not configured",
            ErrorCode::GenerationFailed => "Generation request failed",
            ErrorCode::Timeout => "Operation timed out",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Wire shape of an error response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`
    pub success: bool,
    /// Human-readable error message
    pub error: String,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create a new API error with the given code, using the default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    /// Add additional details to the error.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors for common errors
    // ========================================================================

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
    }

    pub fn corrupt_entry(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CorruptEntry, message)
    }

    pub fn store_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreError, message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn not_configured() -> Self {
        Self::from_code(ErrorCode::NotConfigured)
    }

    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::GenerationFailed, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Timeout, message)
    }

    /// The response body for this error.
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: self.message.clone(),
            code: self.code,
            details: self.details.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.body())).into_response()
    }
}

// ============================================================================
// CONVERSIONS FROM CORE ERRORS
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match &err {
            ValidationError::RequiredFieldMissing { field } => ApiError::missing_field(field),
            _ => ApiError::validation_failed(err.to_string()),
        }
    }
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        tracing::error!(error = %err, "Corrupt cache entry");
        ApiError::corrupt_entry(err.to_string())
    }
}

impl From<EncodeError> for ApiError {
    fn from(err: EncodeError) -> Self {
        tracing::error!(error = %err, "Failed to encode envelope");
        ApiError::internal_error(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = ?err, "Store error");
        match &err {
            StoreError::PoolTimeout { .. } => {
                ApiError::new(ErrorCode::ConnectionPoolExhausted, err.to_string())
            }
            e if e.is_connectivity() => ApiError::service_unavailable(err.to_string()),
            _ => ApiError::store_error(err.to_string()),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        tracing::error!(error = %err, "Generation error");
        match err {
            GenerationError::NotConfigured => ApiError::not_configured(),
            GenerationError::Timeout { .. } => ApiError::timeout(err.to_string()),
            GenerationError::Status { status, ref body } => {
                ApiError::generation_failed(format!("Generation endpoint returned status {}", status))
                    .with_details(serde_json::json!({
                        "status": status,
                        "body": body,
                    }))
            }
            GenerationError::Request { .. } => ApiError::generation_failed(err.to_string()),
        }
    }
}

impl From<LeadCacheError> for ApiError {
    fn from(err: LeadCacheError) -> Self {
        match err {
            LeadCacheError::Validation(e) => e.into(),
            LeadCacheError::Decode(e) => e.into(),
            LeadCacheError::Encode(e) => e.into(),
            LeadCacheError::Store(e) => e.into(),
            LeadCacheError::Generation(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation_failed(rejection.body_text())
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
