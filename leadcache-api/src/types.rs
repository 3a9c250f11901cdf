//! Request and response types for the REST API.
//!
//! All wire fields are camelCase.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use leadcache_core::{CacheHit, ClassificationTally, Envelope, EpochMillis, Payload, StatsSnapshot};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// HEALTH
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PingResponse {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub store: ComponentHealth,
    pub generation_configured: bool,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
}

// ============================================================================
// CACHE
// ============================================================================

/// Result of a single-key read. Every optional field is present on a hit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheReadResponse {
    pub success: bool,
    pub cached: bool,
    /// Normalized identity the entry is stored under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_at: Option<EpochMillis>,
    /// Milliseconds since the entry was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age: Option<i64>,
}

impl CacheReadResponse {
    pub fn hit(hit: CacheHit) -> Self {
        let Envelope {
            identity,
            payload,
            written_at,
        } = hit.envelope;
        Self {
            success: true,
            cached: true,
            identity: Some(identity),
            data: Some(payload),
            written_at: Some(written_at),
            cache_age: Some(hit.age_ms),
        }
    }

    pub fn miss() -> Self {
        Self {
            success: true,
            cached: false,
            identity: None,
            data: None,
            written_at: None,
            cache_age: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheWriteResponse {
    pub success: bool,
    pub message: String,
    pub written_at: EpochMillis,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CacheDeleteResponse {
    pub success: bool,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheClearResponse {
    pub success: bool,
    pub deleted_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ============================================================================
// AGGREGATES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: u64,
    pub newest_entry: EpochMillis,
    pub oldest_entry: EpochMillis,
}

impl From<StatsSnapshot> for CacheStats {
    fn from(snapshot: StatsSnapshot) -> Self {
        Self {
            total_entries: snapshot.total_entries,
            newest_entry: snapshot.newest_timestamp,
            oldest_entry: snapshot.oldest_timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: CacheStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeadCountResponse {
    pub success: bool,
    pub valid_unexported: u64,
    pub valid_exported: u64,
    pub invalid_count: u64,
    pub total_leads: u64,
    pub lead_count_per_list: BTreeMap<String, u64>,
}

impl From<ClassificationTally> for LeadCountResponse {
    fn from(tally: ClassificationTally) -> Self {
        Self {
            success: true,
            valid_unexported: tally.valid_unexported,
            valid_exported: tally.valid_exported,
            invalid_count: tally.invalid,
            total_leads: tally.total,
            lead_count_per_list: tally.per_list_counts,
        }
    }
}

// ============================================================================
// GENERATION
// ============================================================================

/// Missing fields deserialize as empty and are rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateEmailRequest {
    pub company_info: String,
    pub person_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateEmailResponse {
    pub success: bool,
    pub subject: String,
    pub body: String,
    /// True when the model output was returned verbatim.
    pub fallback: bool,
}
