//! Persisted envelope and its JSON codec.
//!
//! An envelope is stored as a JSON object with exactly three top-level
//! fields: `identity`, `payload` (nested verbatim) and `written_at`
//! (milliseconds since the Unix epoch). Payload keys serialize in sorted
//! order, so encoding is deterministic and `encode(decode(encode(x)))`
//! is byte-identical to `encode(x)`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;
use crate::identity::Identity;
use crate::EpochMillis;

/// Open-ended verification/lead result owned by the caller.
pub type Payload = serde_json::Map<String, Value>;

const FIELD_IDENTITY: &str = "identity";
const FIELD_PAYLOAD: &str = "payload";
const FIELD_WRITTEN_AT: &str = "written_at";

/// The unit of cache storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Envelope {
    /// Normalized lookup key.
    pub identity: String,
    /// Caller payload, stored verbatim.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub payload: Payload,
    /// Write time assigned by the cache layer.
    pub written_at: EpochMillis,
}

/// Serialization failed. Only reachable with non-JSON-representable data.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Failed to encode envelope: {reason}")]
pub struct EncodeError {
    pub reason: String,
}

/// Borrowing view used for encoding so the payload is not cloned.
#[derive(Serialize)]
struct EnvelopeRef<'a> {
    identity: &'a str,
    payload: &'a Payload,
    written_at: EpochMillis,
}

impl Envelope {
    /// Encode an envelope for `identity` written at `written_at`.
    pub fn encode(
        identity: &Identity,
        payload: &Payload,
        written_at: EpochMillis,
    ) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(&EnvelopeRef {
            identity: identity.as_str(),
            payload,
            written_at,
        })
        .map_err(|e| EncodeError {
            reason: e.to_string(),
        })
    }

    /// Re-encode an already decoded envelope.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(&EnvelopeRef {
            identity: &self.identity,
            payload: &self.payload,
            written_at: self.written_at,
        })
        .map_err(|e| EncodeError {
            reason: e.to_string(),
        })
    }

    /// Decode stored bytes. Payload sub-fields are not inspected.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| DecodeError::InvalidJson {
            reason: e.to_string(),
        })?;

        let Value::Object(mut object) = value else {
            return Err(DecodeError::NotAnObject);
        };

        let identity = match object.remove(FIELD_IDENTITY) {
            Some(Value::String(s)) => s,
            Some(other) => {
                return Err(DecodeError::InvalidField {
                    field: FIELD_IDENTITY,
                    reason: format!("expected string, found {}", json_kind(&other)),
                })
            }
            None => return Err(DecodeError::MissingField { field: FIELD_IDENTITY }),
        };

        let payload = match object.remove(FIELD_PAYLOAD) {
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(DecodeError::InvalidField {
                    field: FIELD_PAYLOAD,
                    reason: format!("expected object, found {}", json_kind(&other)),
                })
            }
            None => return Err(DecodeError::MissingField { field: FIELD_PAYLOAD }),
        };

        let written_at = match object.remove(FIELD_WRITTEN_AT) {
            Some(Value::Number(n)) => n.as_i64().ok_or_else(|| DecodeError::InvalidField {
                field: FIELD_WRITTEN_AT,
                reason: format!("expected integer milliseconds, found {}", n),
            })?,
            Some(other) => {
                return Err(DecodeError::InvalidField {
                    field: FIELD_WRITTEN_AT,
                    reason: format!("expected integer, found {}", json_kind(&other)),
                })
            }
            None => return Err(DecodeError::MissingField { field: FIELD_WRITTEN_AT }),
        };

        Ok(Self {
            identity,
            payload,
            written_at,
        })
    }

    /// Age of this envelope relative to `now`, never negative.
    pub fn age_ms(&self, now: EpochMillis) -> i64 {
        now.saturating_sub(self.written_at).max(0)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A successful single-key read.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheHit {
    pub envelope: Envelope,
    /// `now - written_at` at read time, clamped to zero.
    pub age_ms: i64,
}

/// Outcome of a single-key read. A miss is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Hit(CacheHit),
    Miss,
}

impl CacheLookup {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit(_))
    }

    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }

    /// The hit, if any.
    pub fn hit(self) -> Option<CacheHit> {
        match self {
            Self::Hit(hit) => Some(hit),
            Self::Miss => None,
        }
    }
}
