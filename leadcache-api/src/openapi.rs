//! OpenAPI Specification for the LeadCache API
//!
//! Generated by utoipa from the route annotations and wire types.

use utoipa::OpenApi;

use crate::error::{ErrorBody, ErrorCode};
use crate::routes::{cache, generate, health, leads};
use crate::telemetry::metrics;
use crate::types::*;

/// OpenAPI document for the LeadCache API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "LeadCache API",
        version = "0.1.0",
        description = "Lead and email-verification cache with lead aggregation and email draft generation",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3001", description = "Local Development")
    ),
    tags(
        (name = "Health", description = "Liveness and store reachability"),
        (name = "Cache", description = "Single-key envelope reads, writes and deletes"),
        (name = "Leads", description = "Namespace statistics, lead classification and CSV export"),
        (name = "Generation", description = "Cold-email draft suggestions"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        health::ping,
        health::health,
        cache::read_entry,
        cache::write_entry,
        cache::delete_entry,
        cache::clear_entries,
        leads::stats,
        leads::lead_count,
        leads::export_leads,
        generate::generate_email_suggestion,
        metrics::metrics_handler,
    ),
    components(schemas(
        ErrorBody,
        ErrorCode,
        PingResponse,
        HealthStatus,
        ComponentHealth,
        HealthResponse,
        CacheReadResponse,
        CacheWriteResponse,
        CacheDeleteResponse,
        CacheClearResponse,
        CacheStats,
        StatsResponse,
        LeadCountResponse,
        GenerateEmailRequest,
        GenerateEmailResponse,
    ))
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate OpenAPI spec as JSON string.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
