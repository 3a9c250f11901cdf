//! LeadCache API Server Entry Point
//!
//! Loads configuration, connects to the store and serves HTTP until
//! SIGINT/SIGTERM, then drains in-flight requests for a bounded grace
//! period before closing the store pool.

use std::sync::Arc;
use std::time::Duration;

use leadcache_api::telemetry::{init_tracing, TelemetryConfig};
use leadcache_api::{create_router, ApiConfig, ApiError, ApiResult, AppState, CacheSettings};
use leadcache_llm::GenerationConfig;
use leadcache_storage::RedisConfig;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

type ServerHandle = JoinHandle<std::io::Result<()>>;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::from_env();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let addr = api_config.bind_addr()?;
    let cache_settings = CacheSettings::from_env()?;
    let redis_config = RedisConfig::from_env();
    let generation_config = GenerationConfig::from_env();

    let state = AppState::connect(&redis_config, &cache_settings, &generation_config).await?;
    let app = create_router(state.clone(), &api_config);

    tracing::info!(%addr, "Starting LeadCache API server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let stop = Arc::new(Notify::new());
    let deadline = Arc::new(Notify::new());
    spawn_signal_watcher(stop.clone(), deadline.clone(), api_config.shutdown_grace);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { stop.notified().await });
    let server: ServerHandle = tokio::spawn(async move { server.await });
    let abort = server.abort_handle();

    let result = tokio::select! {
        joined = server => server_result(joined),
        _ = deadline.notified() => {
            tracing::warn!("Grace period elapsed, abandoning in-flight requests");
            abort.abort();
            Ok(())
        }
    };

    state.shutdown().await;
    tracing::info!("Shutdown complete");
    result
}

/// On SIGINT/SIGTERM, stop accepting connections, then fire `deadline`
/// once `grace` has passed.
fn spawn_signal_watcher(stop: Arc<Notify>, deadline: Arc<Notify>, grace: Duration) {
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!(grace_secs = grace.as_secs(), "Shutdown signal received, draining");
        stop.notify_one();
        tokio::time::sleep(grace).await;
        deadline.notify_one();
    });
}

fn server_result(joined: Result<std::io::Result<()>, tokio::task::JoinError>) -> ApiResult<()> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(ApiError::internal_error(format!("Server error: {}", e))),
        Err(e) => Err(ApiError::internal_error(format!("Server task failed: {}", e))),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
