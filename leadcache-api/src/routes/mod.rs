//! REST API Routes Module
//!
//! Route handlers grouped by concern:
//! - Health checks (`/ping`, `/health`)
//! - Single-key cache operations (`/cache/...`)
//! - Aggregates (`/stats`, `/leads/count`)
//! - Email suggestions (`/generate-email-suggestion`)
//!
//! Every route shares one [`AppState`]. CORS and the observability
//! middleware wrap the whole router.

pub mod cache;
pub mod generate;
pub mod health;
pub mod leads;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

// ============================================================================
// OPENAPI ENDPOINT
// ============================================================================

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> axum::Json<utoipa::openapi::OpenApi> {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

// ============================================================================
// ROUTER
// ============================================================================

/// Build the complete API router.
pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    let router = Router::new()
        .merge(health::create_router())
        .merge(cache::create_router())
        .merge(leads::create_router())
        .merge(generate::create_router())
        .route("/metrics", get(metrics_handler));

    #[cfg(feature = "openapi")]
    let router = router.route("/openapi.json", get(openapi_json));

    router
        .layer(from_fn(observability_middleware))
        .layer(build_cors_layer(config))
        .with_state(state)
}

/// Build the CORS layer from ApiConfig.
///
/// With no configured origins, or a literal `*`, every origin is allowed.
/// Otherwise only the configured origins are.
fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.allows_any_origin() {
        tracing::info!("CORS: allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!(origins = ?config.cors_origins, "CORS: restricting origins");
        let exact: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter(|o| !o.starts_with("*."))
            .filter_map(|o| o.parse().ok())
            .collect();

        let cors = if exact.len() == config.cors_origins.len() {
            cors.allow_origin(exact)
        } else {
            let config = config.clone();
            cors.allow_origin(tower_http::cors::AllowOrigin::predicate(
                move |origin: &HeaderValue, _| {
                    origin
                        .to_str()
                        .map(|o| config.is_origin_allowed(o))
                        .unwrap_or(false)
                },
            ))
        };

        if config.cors_allow_credentials {
            cors.allow_credentials(true)
        } else {
            cors
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_layer_builds_for_every_mode() {
        let _ = build_cors_layer(&ApiConfig::default());

        let mut config = ApiConfig::default();
        config.cors_origins = vec!["https://app.example.com".to_string()];
        config.cors_allow_credentials = true;
        let _ = build_cors_layer(&config);

        config.cors_origins.push("*.example.org".to_string());
        let _ = build_cors_layer(&config);
    }

    #[test]
    fn test_cors_layer_accepts_literal_star() {
        let mut config = ApiConfig::default();
        config.cors_origins = vec!["*".to_string()];
        let _ = build_cors_layer(&config);

        config.cors_origins.push("https://app.example.com".to_string());
        let _ = build_cors_layer(&config);
    }
}
