//! Property-Based Tests for the cache routes
//!
//! For any identity text and payload the HTTP surface and the store agree:
//! - A write through the API is readable from the store under the normalized identity
//! - A delete through the API leaves the store with a miss
//! - Arbitrary lead populations classify into balanced buckets
//! - Undecodable stored bytes surface as decode errors, never as hits

use std::collections::BTreeMap;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use leadcache_api::{create_router, ApiConfig, AppState, CacheSettings};
use leadcache_test_utils::assertions::{assert_balanced, assert_decode_error, assert_hit, assert_miss};
use leadcache_test_utils::fixtures::MemoryFixture;
use leadcache_test_utils::generators::{arb_identity, arb_lead_payload, arb_payload, arb_raw_identity};
use leadcache_test_utils::{Identity, Payload};
use proptest::prelude::*;
use serde_json::Value;
use tokio::runtime::Runtime;
use tower::ServiceExt;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

fn app(fixture: &MemoryFixture) -> Router {
    let state = AppState::new(fixture.store.clone(), &CacheSettings::default(), None);
    create_router(state, &ApiConfig::default())
}

/// Percent-encode the whitespace the raw identity strategy produces.
fn cache_uri(raw: &str) -> String {
    let mut uri = String::from("/cache/");
    for c in raw.chars() {
        match c {
            ' ' => uri.push_str("%20"),
            '\t' => uri.push_str("%09"),
            '\n' => uri.push_str("%0A"),
            other => uri.push(other),
        }
    }
    uri
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<&Payload>) -> Result<(StatusCode, Value), TestCaseError> {
    let body = match body {
        Some(payload) => Body::from(
            serde_json::to_vec(payload).map_err(|e| TestCaseError::fail(format!("Encode failed: {}", e)))?,
        ),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .map_err(|e| TestCaseError::fail(format!("Bad request: {}", e)))?;
    let response = app
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| TestCaseError::fail(format!("Router failed: {}", e)))?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| TestCaseError::fail(format!("Body read failed: {}", e)))?;
    Ok((status, serde_json::from_slice(&bytes).unwrap_or(Value::Null)))
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Writes under any spelling of an identity land on its normalized key.
    #[test]
    fn prop_write_read_back_through_store(raw in arb_raw_identity(), payload in arb_payload()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let fixture = MemoryFixture::new();
            let app = app(&fixture);

            let (status, _) = call(&app, Method::POST, &cache_uri(&raw), Some(&payload)).await?;
            prop_assert_eq!(status, StatusCode::OK);

            let identity = Identity::parse(&raw)
                .map_err(|e| TestCaseError::fail(format!("Generated identity rejected: {}", e)))?;
            let stored = assert_hit(fixture.store.read(&identity).await);
            prop_assert_eq!(stored, payload);
            prop_assert_eq!(fixture.backend.len(), 1);
            Ok(())
        })?;
    }

    /// Deleting through the API removes exactly the addressed entry.
    #[test]
    fn prop_delete_leaves_miss(identity in arb_identity(), payload in arb_payload()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let fixture = MemoryFixture::new();
            fixture
                .store
                .write(&identity, &payload)
                .await
                .map_err(|e| TestCaseError::fail(format!("Seed failed: {}", e)))?;
            let app = app(&fixture);

            let uri = format!("/cache/{}", identity.as_str());
            let (status, body) = call(&app, Method::DELETE, &uri, None).await?;
            prop_assert_eq!(status, StatusCode::OK);
            prop_assert_eq!(&body["deleted"], &Value::Bool(true));

            assert_miss(&fixture.store.read(&identity).await);
            prop_assert!(fixture.backend.is_empty());
            Ok(())
        })?;
    }

    /// Every stored lead falls in exactly one bucket.
    #[test]
    fn prop_lead_count_is_balanced(
        leads in prop::collection::btree_map(arb_identity(), arb_lead_payload(), 0..12)
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let fixture = MemoryFixture::new();
            let entries: Vec<(Identity, Payload)> = leads.into_iter().collect();
            fixture
                .seed(&entries)
                .await
                .map_err(|e| TestCaseError::fail(format!("Seed failed: {}", e)))?;

            let tally = fixture
                .aggregator()
                .classify()
                .await
                .map_err(|e| TestCaseError::fail(format!("Classify failed: {}", e)))?;
            assert_balanced(&tally);
            prop_assert_eq!(tally.total, entries.len() as u64);
            prop_assert!(tally.per_list_counts.values().sum::<u64>() <= tally.valid_unexported);

            let (status, body) = call(&app(&fixture), Method::GET, "/leads/count", None).await?;
            prop_assert_eq!(status, StatusCode::OK);
            prop_assert_eq!(body["totalLeads"].as_u64(), Some(tally.total));
            prop_assert_eq!(body["validUnexported"].as_u64(), Some(tally.valid_unexported));
            prop_assert_eq!(body["validExported"].as_u64(), Some(tally.valid_exported));
            prop_assert_eq!(body["invalidCount"].as_u64(), Some(tally.invalid));

            let per_list: BTreeMap<String, u64> = serde_json::from_value(body["leadCountPerList"].clone())
                .map_err(|e| TestCaseError::fail(format!("Bad per-list map: {}", e)))?;
            prop_assert_eq!(per_list, tally.per_list_counts);
            Ok(())
        })?;
    }

    /// Bytes that are not an envelope never read as a hit.
    #[test]
    fn prop_undecodable_entry_is_decode_error(identity in arb_identity(), junk in "[a-zA-Z0-9 {}:,]{0,40}") {
        let rt = test_runtime()?;
        rt.block_on(async {
            let fixture = MemoryFixture::new();
            let key = fixture.store.prefix().key_for(&identity);
            fixture
                .backend
                .insert_raw(key, format!("not json {}", junk))
                .map_err(|e| TestCaseError::fail(format!("Insert failed: {}", e)))?;

            assert_decode_error(&fixture.store.read(&identity).await);

            let uri = format!("/cache/{}", identity.as_str());
            let (status, body) = call(&app(&fixture), Method::GET, &uri, None).await?;
            prop_assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            prop_assert_eq!(&body["code"], &Value::String("CORRUPT_ENTRY".to_string()));
            Ok(())
        })?;
    }
}
