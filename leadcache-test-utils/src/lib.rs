//! LeadCache Test Utilities
//!
//! Shared test infrastructure for the workspace:
//! - Proptest generators for identities, payloads and leads
//! - Fixtures for in-memory stores and common lead populations
//! - A scripted mock generation provider
//! - Assertions for tally and lookup results

pub use leadcache_core::{
    CacheLookup, ClassificationTally, GenerationError, Identity, KeyPrefix, LeadCacheError,
    LeadCacheResult, ManualClock, Payload, StatsSnapshot,
};
pub use leadcache_llm::{DraftRequest, EmailDraft, GeneratedDraft, GenerationProvider};
pub use leadcache_storage::{AggregationConfig, Aggregator, CacheStore, InMemoryBackend};

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// MOCK PROVIDERS
// ============================================================================

/// Mock generation provider for testing (async).
///
/// Replies come from a script, one per call, in order. Once the script is
/// exhausted every call returns the default reply.
#[derive(Debug)]
pub struct MockGenerationProvider {
    script: Mutex<VecDeque<Result<GeneratedDraft, GenerationError>>>,
    default_reply: Result<GeneratedDraft, GenerationError>,
    delay: Option<Duration>,
    calls: AtomicU64,
}

impl MockGenerationProvider {
    /// Always answer with a parsed draft built from the request.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_reply: Ok(GeneratedDraft::parsed(EmailDraft {
                subject: "Mock subject".to_string(),
                body: "<p>Mock body</p>".to_string(),
            })),
            delay: None,
            calls: AtomicU64::new(0),
        }
    }

    /// Always answer with `reply`.
    pub fn always(reply: Result<GeneratedDraft, GenerationError>) -> Self {
        Self {
            default_reply: reply,
            ..Self::new()
        }
    }

    /// Queue a reply for the next unscripted call.
    pub fn push_reply(&self, reply: Result<GeneratedDraft, GenerationError>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(reply);
        }
    }

    /// Sleep for `delay` before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockGenerationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn generate(&self, _request: &DraftRequest) -> Result<GeneratedDraft, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.script.lock().ok().and_then(|mut script| script.pop_front());
        scripted.unwrap_or_else(|| self.default_reply.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for identities, payloads and leads.

    use super::*;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    /// A normalized email-like identity.
    pub fn arb_identity() -> impl Strategy<Value = Identity> {
        ("[a-z0-9._]{1,16}", "[a-z]{1,10}", prop_oneof!["com", "io", "org"]).prop_filter_map(
            "identity must normalize",
            |(local, domain, tld)| Identity::parse(&format!("{}@{}.{}", local, domain, tld)).ok(),
        )
    }

    /// Raw identity text with random casing and surrounding whitespace.
    pub fn arb_raw_identity() -> impl Strategy<Value = String> {
        ("[ \t]{0,3}", "[a-zA-Z0-9.]{1,12}@[a-zA-Z]{1,8}\\.com", "[ \t\n]{0,3}")
            .prop_map(|(lead, core, trail)| format!("{}{}{}", lead, core, trail))
    }

    /// An arbitrary JSON value of bounded depth.
    pub fn arb_json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 ._@-]{0,24}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
                prop::collection::btree_map("[a-zA-Z_]{1,10}", inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    /// An arbitrary payload object.
    pub fn arb_payload() -> impl Strategy<Value = Payload> {
        prop::collection::btree_map("[a-zA-Z_]{1,12}", arb_json_value(), 0..8)
            .prop_map(|m| m.into_iter().collect())
    }

    /// A lead payload using the default field names, with optional fields
    /// sometimes missing or of the wrong type.
    pub fn arb_lead_payload() -> impl Strategy<Value = Payload> {
        let status = prop::option::of(prop_oneof![
            3 => Just(json!("valid")),
            1 => Just(json!("invalid")),
            1 => Just(json!("catch_all")),
            1 => Just(json!(true)),
        ]);
        let exported = prop::option::of(prop_oneof![
            Just(json!(true)),
            Just(json!(false)),
            Just(json!("false")),
        ]);
        let list = prop::option::of(prop_oneof![
            Just(json!("")),
            Just(json!("L1")),
            Just(json!("L2")),
            Just(json!(7)),
        ]);
        (status, exported, list, arb_payload()).prop_map(|(status, exported, list, mut extra)| {
            extra.remove("emailStatus");
            extra.remove("exported");
            extra.remove("listLeadBelongsTo");
            if let Some(status) = status {
                extra.insert("emailStatus".to_string(), status);
            }
            if let Some(exported) = exported {
                extra.insert("exported".to_string(), exported);
            }
            if let Some(list) = list {
                extra.insert("listLeadBelongsTo".to_string(), list);
            }
            extra
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built fixtures for common scenarios.

    use super::*;
    use serde_json::{json, Value};
    use std::sync::Arc;

    /// Build a payload from a JSON object literal. Non-objects yield an empty payload.
    pub fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    /// A lead payload with the default field names.
    pub fn lead(status: &str, exported: bool, list: Option<&str>) -> Payload {
        let mut p = payload(json!({
            "emailStatus": status,
            "exported": exported,
        }));
        if let Some(list) = list {
            p.insert("listLeadBelongsTo".to_string(), json!(list));
        }
        p
    }

    /// Parse an identity that is known to be valid.
    #[track_caller]
    pub fn identity(raw: &str) -> Identity {
        match Identity::parse(raw) {
            Ok(identity) => identity,
            Err(e) => panic!("invalid fixture identity {:?}: {}", raw, e),
        }
    }

    /// The three-lead population: one valid unexported lead on list `L1`, one
    /// valid exported lead, one bounced lead.
    pub fn three_lead_scenario() -> Vec<(Identity, Payload)> {
        vec![
            (identity("a@x.com"), lead("valid", false, Some("L1"))),
            (identity("b@x.com"), lead("valid", true, None)),
            (identity("c@x.com"), lead("bounced", false, None)),
        ]
    }

    /// An in-memory store in the lead namespace driven by a manual clock.
    pub struct MemoryFixture {
        pub backend: Arc<InMemoryBackend>,
        pub clock: Arc<ManualClock>,
        pub store: CacheStore,
    }

    impl MemoryFixture {
        pub fn new() -> Self {
            Self::with_prefix(KeyPrefix::lead())
        }

        pub fn with_prefix(prefix: KeyPrefix) -> Self {
            let backend = Arc::new(InMemoryBackend::new());
            let clock = Arc::new(ManualClock::new(1_700_000_000_000));
            let store = CacheStore::with_clock(backend.clone(), prefix, clock.clone());
            Self {
                backend,
                clock,
                store,
            }
        }

        pub fn aggregator(&self) -> Aggregator {
            Aggregator::new(self.store.clone(), AggregationConfig::default())
        }

        /// Write every entry, in order.
        pub async fn seed(&self, entries: &[(Identity, Payload)]) -> LeadCacheResult<()> {
            for (identity, payload) in entries {
                self.store.write(identity, payload).await?;
            }
            Ok(())
        }
    }

    impl Default for MemoryFixture {
        fn default() -> Self {
            Self::new()
        }
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions for lookups and tallies.

    use super::*;

    /// Assert that a tally's buckets add up to its total.
    #[track_caller]
    pub fn assert_balanced(tally: &ClassificationTally) {
        assert_eq!(
            tally.valid_exported + tally.valid_unexported + tally.invalid,
            tally.total,
            "Unbalanced tally: {:?}",
            tally
        );
    }

    /// Assert that a lookup is a miss.
    #[track_caller]
    pub fn assert_miss(lookup: &LeadCacheResult<CacheLookup>) {
        match lookup {
            Ok(CacheLookup::Miss) => {}
            other => panic!("Expected Miss, got: {:?}", other),
        }
    }

    /// Assert that a lookup is a hit and return its payload.
    #[track_caller]
    pub fn assert_hit(lookup: LeadCacheResult<CacheLookup>) -> Payload {
        match lookup {
            Ok(CacheLookup::Hit(hit)) => hit.envelope.payload,
            other => panic!("Expected Hit, got: {:?}", other),
        }
    }

    /// Assert that a result is a decode error.
    #[track_caller]
    pub fn assert_decode_error<T: std::fmt::Debug>(result: &LeadCacheResult<T>) {
        match result {
            Err(LeadCacheError::Decode(_)) => {}
            other => panic!("Expected Decode error, got: {:?}", other),
        }
    }
}
