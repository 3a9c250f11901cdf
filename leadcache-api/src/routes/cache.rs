//! Single-key cache routes
//!
//! Read, write and delete one envelope by identity, plus a namespace-wide
//! clear.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};
use leadcache_core::{CacheLookup, Identity, ValidationError};
use leadcache_storage::CacheStore;
use serde_json::Value;

use crate::error::{ApiResult, ErrorBody};
use crate::state::AppState;
use crate::telemetry::{observe_store_op, METRICS};
use crate::types::{CacheClearResponse, CacheDeleteResponse, CacheReadResponse, CacheWriteResponse};

/// GET /cache/:identity - Read a cached entry
#[utoipa::path(
    get,
    path = "/cache/{identity}",
    tag = "Cache",
    params(("identity" = String, Path, description = "Lookup key, normalized before use")),
    responses(
        (status = 200, description = "Hit or miss", body = CacheReadResponse),
        (status = 400, description = "Identity is empty", body = ErrorBody),
        (status = 500, description = "Stored entry is corrupt", body = ErrorBody),
        (status = 503, description = "Store unreachable", body = ErrorBody),
    ),
)]
pub async fn read_entry(
    State(store): State<CacheStore>,
    Path(raw): Path<String>,
) -> ApiResult<Json<CacheReadResponse>> {
    let identity = Identity::parse(&raw)?;
    let lookup = observe_store_op("read", store.read(&identity)).await?;

    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_cache_lookup(lookup.is_hit());
    }

    let response = match lookup {
        CacheLookup::Hit(hit) => {
            tracing::debug!(identity = %identity, age_ms = hit.age_ms, "Cache hit");
            CacheReadResponse::hit(hit)
        }
        CacheLookup::Miss => {
            tracing::debug!(identity = %identity, "Cache miss");
            CacheReadResponse::miss()
        }
    };
    Ok(Json(response))
}

/// POST /cache/:identity - Write an entry
#[utoipa::path(
    post,
    path = "/cache/{identity}",
    tag = "Cache",
    params(("identity" = String, Path, description = "Lookup key, normalized before use")),
    request_body(content = Object, description = "Payload to cache; must be a JSON object"),
    responses(
        (status = 200, description = "Entry written", body = CacheWriteResponse),
        (status = 400, description = "Empty identity or non-object payload", body = ErrorBody),
        (status = 503, description = "Store unreachable", body = ErrorBody),
    ),
)]
pub async fn write_entry(
    State(store): State<CacheStore>,
    Path(raw): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<CacheWriteResponse>> {
    let identity = Identity::parse(&raw)?;
    let Json(value) = body?;
    let payload = match value {
        Value::Object(map) => map,
        _ => return Err(ValidationError::PayloadNotObject.into()),
    };

    let written_at = observe_store_op("write", store.write(&identity, &payload)).await?;
    tracing::info!(identity = %identity, written_at, "Cached entry");

    Ok(Json(CacheWriteResponse {
        success: true,
        message: "Cached successfully".to_string(),
        written_at,
    }))
}

/// DELETE /cache/:identity - Delete an entry
#[utoipa::path(
    delete,
    path = "/cache/{identity}",
    tag = "Cache",
    params(("identity" = String, Path, description = "Lookup key, normalized before use")),
    responses(
        (status = 200, description = "Whether an entry was removed", body = CacheDeleteResponse),
        (status = 400, description = "Identity is empty", body = ErrorBody),
        (status = 503, description = "Store unreachable", body = ErrorBody),
    ),
)]
pub async fn delete_entry(
    State(store): State<CacheStore>,
    Path(raw): Path<String>,
) -> ApiResult<Json<CacheDeleteResponse>> {
    let identity = Identity::parse(&raw)?;
    let deleted = observe_store_op("delete", store.delete(&identity)).await?;
    tracing::info!(identity = %identity, deleted, "Deleted entry");

    Ok(Json(CacheDeleteResponse {
        success: true,
        deleted,
    }))
}

/// DELETE /cache - Delete every entry in the active namespace
#[utoipa::path(
    delete,
    path = "/cache",
    tag = "Cache",
    responses(
        (status = 200, description = "Number of entries removed", body = CacheClearResponse),
        (status = 503, description = "Store unreachable", body = ErrorBody),
    ),
)]
pub async fn clear_entries(State(store): State<CacheStore>) -> ApiResult<Json<CacheClearResponse>> {
    let deleted_count = observe_store_op("clear", store.clear()).await?;
    tracing::info!(prefix = %store.prefix(), deleted_count, "Cleared namespace");

    let message = if deleted_count == 0 {
        "No cache entries to clear".to_string()
    } else {
        format!("Cleared {} cache entries", deleted_count)
    };

    Ok(Json(CacheClearResponse {
        success: true,
        deleted_count,
        message: Some(message),
    }))
}

/// Create cache router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/cache", axum::routing::delete(clear_entries))
        .route(
            "/cache/:identity",
            get(read_entry).post(write_entry).delete(delete_entry),
        )
}
