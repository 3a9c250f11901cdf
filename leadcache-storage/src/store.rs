//! Cache store adapter.
//!
//! Every operation keys by `prefix + identity`. The adapter stamps
//! `written_at` from its clock immediately before persisting, and reads
//! report the entry age relative to the same clock.

use std::sync::Arc;

use leadcache_core::{
    CacheHit, CacheLookup, Clock, Envelope, EpochMillis, Identity, KeyPrefix, LeadCacheResult,
    Payload, StoreError, SystemClock,
};
use tracing::{debug, info};

use crate::backend::KvBackend;

/// Maximum number of keys removed per bulk-delete store command.
pub const BULK_DELETE_BATCH: usize = 500;

/// Namespaced envelope store over a [`KvBackend`].
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn KvBackend>,
    prefix: KeyPrefix,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Create a store using the system clock.
    pub fn new(backend: Arc<dyn KvBackend>, prefix: KeyPrefix) -> Self {
        Self::with_clock(backend, prefix, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(backend: Arc<dyn KvBackend>, prefix: KeyPrefix, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            prefix,
            clock,
        }
    }

    pub fn prefix(&self) -> &KeyPrefix {
        &self.prefix
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Read the envelope stored for `identity`.
    ///
    /// An absent key is [`CacheLookup::Miss`]. Undecodable bytes surface as a
    /// decode error, never as a partial envelope.
    pub async fn read(&self, identity: &Identity) -> LeadCacheResult<CacheLookup> {
        self.read_key(&self.prefix.key_for(identity)).await
    }

    /// Read a raw store key, as returned by [`CacheStore::scan_prefix`].
    pub async fn read_key(&self, key: &str) -> LeadCacheResult<CacheLookup> {
        let Some(bytes) = self.backend.get(key).await? else {
            return Ok(CacheLookup::Miss);
        };
        let envelope = Envelope::decode(&bytes)?;
        let age_ms = envelope.age_ms(self.clock.now_millis());
        Ok(CacheLookup::Hit(CacheHit { envelope, age_ms }))
    }

    /// Overwrite the entry for `identity`. Returns the assigned `written_at`.
    pub async fn write(&self, identity: &Identity, payload: &Payload) -> LeadCacheResult<EpochMillis> {
        let key = self.prefix.key_for(identity);
        let written_at = self.clock.now_millis();
        let bytes = Envelope::encode(identity, payload, written_at)?;
        self.backend.set(&key, bytes).await?;

        info!(key = %key, written_at, "Cached entry");
        Ok(written_at)
    }

    /// Remove the entry for `identity`. `false` when it was absent.
    pub async fn delete(&self, identity: &Identity) -> Result<bool, StoreError> {
        let key = self.prefix.key_for(identity);
        let deleted = self.backend.delete(&key).await?;
        if deleted {
            info!(key = %key, "Deleted entry");
        }
        Ok(deleted)
    }

    /// All keys in the active namespace.
    pub async fn scan_prefix(&self) -> Result<Vec<String>, StoreError> {
        self.backend.scan_prefix(&self.prefix).await
    }

    /// Delete `keys`, ignoring any outside the active namespace.
    ///
    /// An empty key set returns 0 without contacting the store.
    pub async fn bulk_delete(&self, keys: &[String]) -> Result<u64, StoreError> {
        let owned: Vec<String> = keys
            .iter()
            .filter(|key| self.prefix.owns(key))
            .cloned()
            .collect();
        if owned.len() < keys.len() {
            debug!(
                ignored = keys.len() - owned.len(),
                prefix = %self.prefix,
                "Ignoring keys outside namespace"
            );
        }
        if owned.is_empty() {
            return Ok(0);
        }

        let mut deleted = 0u64;
        for batch in owned.chunks(BULK_DELETE_BATCH) {
            deleted += self.backend.delete_many(batch).await?;
        }
        info!(deleted, prefix = %self.prefix, "Bulk delete complete");
        Ok(deleted)
    }

    /// Delete every key in the active namespace.
    pub async fn clear(&self) -> Result<u64, StoreError> {
        let keys = self.scan_prefix().await?;
        self.bulk_delete(&keys).await
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.backend.ping().await
    }

    pub async fn close(&self) {
        self.backend.close().await
    }
}
