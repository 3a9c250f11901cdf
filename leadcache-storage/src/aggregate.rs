//! Aggregation over the active namespace.
//!
//! Every aggregation starts from a fresh `scan_prefix` and is computed per
//! request; nothing is cached. They are not transactionally consistent with
//! concurrent writers: a key removed between the scan and its read is
//! skipped by [`Aggregator::stats`], counted invalid by
//! [`Aggregator::classify`] and left out of [`Aggregator::export_valid`].

use std::collections::HashSet;

use futures_util::stream::{self, Stream, StreamExt};
use leadcache_core::{
    CacheLookup, ClassificationTally, Envelope, ExportReport, ExportRow, Identity, LeadCacheResult,
    LeadClass, LeadSchema, StatsSnapshot, StoreError, ValidationError,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::store::CacheStore;

/// Tuning knobs for the aggregation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationConfig {
    /// Maximum number of entries read to compute the freshness window.
    pub sample_limit: usize,
    /// Maximum number of concurrent per-key reads.
    pub read_concurrency: usize,
    pub schema: LeadSchema,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            sample_limit: 100,
            read_concurrency: 16,
            schema: LeadSchema::default(),
        }
    }
}

#[derive(Clone)]
pub struct Aggregator {
    store: CacheStore,
    config: AggregationConfig,
}

impl Aggregator {
    pub fn new(store: CacheStore, config: AggregationConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Entry count plus the write-time window of the first `sample_limit`
    /// keys in scan order.
    ///
    /// Only the scan itself can fail; unreadable sampled entries are skipped.
    pub async fn stats(&self) -> Result<StatsSnapshot, StoreError> {
        let keys = self.store.scan_prefix().await?;
        let now = self.store.clock().now_millis();
        let mut snapshot = StatsSnapshot::start(keys.len() as u64, now);

        let sample: Vec<String> = keys.into_iter().take(self.config.sample_limit).collect();
        let mut reads = self.read_keys(sample);

        while let Some((key, result)) = reads.next().await {
            match result {
                Ok(CacheLookup::Hit(hit)) => snapshot.observe(hit.envelope.written_at),
                Ok(CacheLookup::Miss) => {
                    debug!(key = %key, "Sampled key vanished before read");
                }
                Err(e) => {
                    debug!(key = %key, error = %e, "Skipping unreadable entry in stats sample");
                }
            }
        }

        Ok(snapshot)
    }

    /// Classify every entry in the namespace.
    ///
    /// Only the scan itself can fail. Every scanned key lands in exactly one
    /// bucket, so the tally stays balanced.
    pub async fn classify(&self) -> Result<ClassificationTally, StoreError> {
        let keys = self.store.scan_prefix().await?;
        let mut tally = ClassificationTally::new();
        let mut reads = self.read_keys(keys);

        while let Some((key, result)) = reads.next().await {
            tally.record(self.classify_lookup(&key, result));
        }

        debug!(
            total = tally.total,
            valid_exported = tally.valid_exported,
            valid_unexported = tally.valid_unexported,
            invalid = tally.invalid,
            "Classification complete"
        );
        Ok(tally)
    }

    /// Collect every valid lead not yet exported and flag it as exported.
    ///
    /// Candidates are visited in key order. A lead without an email, or
    /// whose email was already taken by an earlier key, is skipped and left
    /// unflagged. A row is returned only once its flag has been written back,
    /// so a failed write leaves the lead for the next export.
    pub async fn export_valid(&self) -> Result<ExportReport, StoreError> {
        let keys = self.store.scan_prefix().await?;
        let mut report = ExportReport::default();
        let mut candidates: Vec<(String, Envelope)> = Vec::new();

        let mut reads = self.read_keys(keys);
        while let Some((key, result)) = reads.next().await {
            let envelope = match result {
                Ok(CacheLookup::Hit(hit)) => hit.envelope,
                Ok(CacheLookup::Miss) => {
                    debug!(key = %key, "Key vanished before export");
                    report.skipped_invalid += 1;
                    continue;
                }
                Err(e) => {
                    debug!(key = %key, error = %e, "Unreadable entry, not exported");
                    report.skipped_invalid += 1;
                    continue;
                }
            };
            match self.config.schema.classify(&envelope.payload) {
                LeadClass::ValidUnexported { .. } => candidates.push((key, envelope)),
                LeadClass::ValidExported => report.skipped_exported += 1,
                LeadClass::Invalid => report.skipped_invalid += 1,
            }
        }
        candidates.sort_by(|a, b| a.0.cmp(&b.0));

        let mut seen = HashSet::new();
        for (key, envelope) in candidates {
            let Some(row) = ExportRow::from_payload(&envelope.payload) else {
                report.skipped_no_email += 1;
                continue;
            };
            if !seen.insert(row.email.to_lowercase()) {
                report.skipped_duplicate += 1;
                continue;
            }
            match self.mark_exported(&key, envelope).await {
                Ok(()) => report.rows.push(row),
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to flag lead as exported, leaving it out");
                    report.failed += 1;
                }
            }
        }

        info!(
            exported = report.exported(),
            with_draft = report.with_draft(),
            skipped_exported = report.skipped_exported,
            skipped_invalid = report.skipped_invalid,
            skipped_no_email = report.skipped_no_email,
            skipped_duplicate = report.skipped_duplicate,
            failed = report.failed,
            "Export complete"
        );
        Ok(report)
    }

    /// Rewrite the entry at `key` with the export flag set.
    async fn mark_exported(&self, key: &str, envelope: Envelope) -> LeadCacheResult<()> {
        let prefix = self.store.prefix();
        let identity = Identity::parse(prefix.strip(key).unwrap_or_default())?;
        if prefix.key_for(&identity) != key {
            return Err(ValidationError::InvalidValue {
                field: "key".to_string(),
                reason: format!("{} is not a normalized key of namespace {}", key, prefix),
            }
            .into());
        }

        let mut payload = envelope.payload;
        payload.insert(self.config.schema.export_field.clone(), Value::Bool(true));
        self.store.write(&identity, &payload).await?;
        Ok(())
    }

    fn classify_lookup(&self, key: &str, result: LeadCacheResult<CacheLookup>) -> LeadClass {
        match result {
            Ok(CacheLookup::Hit(hit)) => self.config.schema.classify(&hit.envelope.payload),
            Ok(CacheLookup::Miss) => {
                debug!(key = %key, "Key vanished before read, counting invalid");
                LeadClass::Invalid
            }
            Err(e) => {
                debug!(key = %key, error = %e, "Unreadable entry, counting invalid");
                LeadClass::Invalid
            }
        }
    }

    /// Read `keys` with bounded concurrency, in completion order.
    ///
    /// Each read owns its key and a store handle, so the stream borrows
    /// nothing from `self`.
    fn read_keys(
        &self,
        keys: Vec<String>,
    ) -> impl Stream<Item = (String, LeadCacheResult<CacheLookup>)> + Send {
        let store = self.store.clone();
        stream::iter(keys)
            .map(move |key| {
                let store = store.clone();
                async move {
                    let result = store.read_key(&key).await;
                    (key, result)
                }
            })
            .buffer_unordered(self.concurrency())
    }

    fn concurrency(&self) -> usize {
        self.config.read_concurrency.max(1)
    }
}
