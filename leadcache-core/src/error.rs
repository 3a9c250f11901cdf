//! Error types for LeadCache operations

use std::sync::Arc;
use thiserror::Error;

use crate::envelope::EncodeError;

/// Shared, cloneable handle to an underlying cause.
pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Caller-side input errors. Never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Identity is empty after normalization")]
    EmptyIdentity,

    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Payload must be a JSON object")]
    PayloadNotObject,
}

/// A stored envelope could not be decoded.
///
/// Decoding fails closed: a `DecodeError` is returned instead of any
/// partially populated envelope.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Stored value is not valid JSON: {reason}")]
    InvalidJson { reason: String },

    #[error("Stored value is not a JSON object")]
    NotAnObject,

    #[error("Stored envelope is missing field '{field}'")]
    MissingField { field: &'static str },

    #[error("Stored envelope field '{field}' is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// Operational failures of the backing key-value store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Store connection failed: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<ErrorSource>,
    },

    #[error("Timed out waiting for a store connection after {waited_ms}ms")]
    PoolTimeout { waited_ms: u64 },

    #[error("Store command {operation} failed: {reason}")]
    Command {
        operation: &'static str,
        reason: String,
        #[source]
        source: Option<ErrorSource>,
    },

    #[error("Store is unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Wrap a client error raised while running `operation`.
    pub fn command<E>(operation: &'static str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Command {
            operation,
            reason: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }

    /// Wrap a client error raised while acquiring a connection.
    pub fn connection<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            reason: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }

    /// True for failures that mean the store could not be reached at all.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::PoolTimeout { .. } | Self::Unavailable { .. }
        )
    }
}

/// Failures of the outbound text-generation call.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("No generation provider configured")]
    NotConfigured,

    #[error("Generation request failed: {reason}")]
    Request {
        reason: String,
        #[source]
        source: Option<ErrorSource>,
    },

    #[error("Generation request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Generation endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },
}

impl GenerationError {
    pub fn request<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Request {
            reason: err.to_string(),
            source: Some(Arc::new(err)),
        }
    }
}

/// Master error type for all LeadCache errors.
#[derive(Debug, Clone, Error)]
pub enum LeadCacheError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

/// Result type alias for LeadCache operations.
pub type LeadCacheResult<T> = Result<T, LeadCacheError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_decode_error_display_missing_field() {
        let err = DecodeError::MissingField { field: "payload" };
        assert_eq!(err.to_string(), "Stored envelope is missing field 'payload'");
    }

    #[test]
    fn test_store_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = StoreError::command("GET", io);
        assert!(err.to_string().contains("GET"));
        assert!(err.source().is_some());
        assert!(!err.is_connectivity());
    }

    #[test]
    fn test_store_error_connectivity() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(StoreError::connection(io).is_connectivity());
        assert!(StoreError::PoolTimeout { waited_ms: 10 }.is_connectivity());
        assert!(!StoreError::LockPoisoned.is_connectivity());
    }

    #[test]
    fn test_generation_status_display() {
        let err = GenerationError::Status {
            status: 429,
            body: "slow down".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("429"));
        assert!(msg.contains("slow down"));
    }

    #[test]
    fn test_master_error_from() {
        let err: LeadCacheError = ValidationError::EmptyIdentity.into();
        assert!(matches!(err, LeadCacheError::Validation(_)));

        let err: LeadCacheError = DecodeError::NotAnObject.into();
        assert!(err.to_string().starts_with("Decode error"));
    }
}
