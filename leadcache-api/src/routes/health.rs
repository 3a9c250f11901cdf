//! Health Check Endpoints
//!
//! - /ping - Liveness, never touches the store
//! - /health - Store reachability, version and uptime
//!
//! Health stays 200 when the store is down; the body reports `degraded`.

use std::time::Instant;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;

use crate::state::AppState;
use crate::types::{ComponentHealth, HealthResponse, HealthStatus, PingResponse};

/// GET /ping - Simple pong response
#[utoipa::path(
    get,
    path = "/ping",
    tag = "Health",
    responses(
        (status = 200, description = "Service is responding", body = PingResponse),
    ),
)]
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        message: "pong".to_string(),
        timestamp: Utc::now(),
    })
}

/// GET /health - Store connectivity check
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health, degraded when the store is unreachable", body = HealthResponse),
    ),
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let started = Instant::now();
    let store = match state.store.ping().await {
        Ok(()) => ComponentHealth {
            reachable: true,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Store health check failed");
            ComponentHealth {
                reachable: false,
                latency_ms: None,
                error: Some(e.to_string()),
            }
        }
    };

    let status = if store.reachable {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    Json(HealthResponse {
        status,
        store,
        generation_configured: state.generator.is_some(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

/// Create health check router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        let json = serde_json::to_string(&HealthStatus::Degraded).unwrap();
        assert_eq!(json, "\"degraded\"");
    }

    #[test]
    fn test_component_health_with_error() {
        let component = ComponentHealth {
            reachable: false,
            latency_ms: None,
            error: Some("Connection refused".to_string()),
        };

        let json = serde_json::to_string(&component).unwrap();
        assert!(json.contains("\"reachable\":false"));
        assert!(json.contains("Connection refused"));
        assert!(!json.contains("latencyMs"));
    }

    #[tokio::test]
    async fn test_ping_says_pong() {
        let Json(body) = ping().await;
        assert_eq!(body.message, "pong");
    }
}
