//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use leadcache_core::GenerationError;
use leadcache_llm::{GenerationConfig, GenerationProvider, OpenAIGenerationProvider};
use leadcache_storage::{Aggregator, CacheStore, RedisBackend, RedisConfig};

use crate::config::CacheSettings;
use crate::error::{ApiError, ApiResult};

/// The configured generation provider, if any.
pub type SharedGenerator = Option<Arc<dyn GenerationProvider>>;

/// Application-wide state shared across all routes.
///
/// Built once at startup and read-only afterwards.
#[derive(Clone)]
pub struct AppState {
    pub store: CacheStore,
    /// Aggregation engine over the same store.
    pub aggregator: Aggregator,
    pub generator: SharedGenerator,
    pub start_time: Instant,
}

crate::impl_from_ref!(CacheStore, store);
crate::impl_from_ref!(Aggregator, aggregator);
crate::impl_from_ref!(SharedGenerator, generator);
crate::impl_from_ref!(Instant, start_time);

impl AppState {
    pub fn new(store: CacheStore, settings: &CacheSettings, generator: SharedGenerator) -> Self {
        let aggregator = Aggregator::new(store.clone(), settings.aggregation.clone());
        Self {
            store,
            aggregator,
            generator,
            start_time: Instant::now(),
        }
    }

    /// Connect to the store and build the generation provider.
    ///
    /// Fails when the store cannot be reached. A missing API key only
    /// disables generation.
    pub async fn connect(
        redis: &RedisConfig,
        settings: &CacheSettings,
        generation: &GenerationConfig,
    ) -> ApiResult<Self> {
        let backend = RedisBackend::from_config(redis)?;
        let store = CacheStore::new(Arc::new(backend), settings.key_prefix.clone());

        store.ping().await.map_err(|e| {
            ApiError::service_unavailable(format!(
                "Store at {} is unreachable: {}",
                redis.redacted_url(),
                e
            ))
        })?;

        tracing::info!(
            url = %redis.redacted_url(),
            prefix = %settings.key_prefix,
            "Connected to store"
        );

        let generator = build_generator(generation)?;
        Ok(Self::new(store, settings, generator))
    }

    /// Release the store connection pool.
    pub async fn shutdown(&self) {
        self.store.close().await;
        tracing::info!("Store connections closed");
    }
}

fn build_generator(config: &GenerationConfig) -> ApiResult<SharedGenerator> {
    match OpenAIGenerationProvider::from_config(config) {
        Ok(provider) => {
            tracing::info!(model = provider.model(), "Generation provider configured");
            Ok(Some(Arc::new(provider)))
        }
        Err(GenerationError::NotConfigured) => {
            tracing::warn!("No generation API key set, email suggestions are disabled");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
