//! Key-value backend trait.
//!
//! This trait abstracts over the store that holds encoded envelopes (Redis
//! in production, an in-memory map in tests). Backends deal in raw keys and
//! bytes; namespacing and the envelope format live in [`crate::CacheStore`].

use async_trait::async_trait;
use leadcache_core::{KeyPrefix, StoreError};

/// Pluggable key-value backend.
///
/// Implementations must be safe to share across request tasks.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Fetch the raw value stored at `key`.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `value` at `key`, replacing any previous value. No expiration.
    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError>;

    /// Remove `key`. Returns `false` when it was absent.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// All keys owned by `prefix`, each reported once.
    ///
    /// A point-in-time view; keys written or removed concurrently may or may
    /// not appear.
    async fn scan_prefix(&self, prefix: &KeyPrefix) -> Result<Vec<String>, StoreError>;

    /// Remove every key in `keys` with a single store command and return how
    /// many existed.
    async fn delete_many(&self, keys: &[String]) -> Result<u64, StoreError>;

    /// Reachability check.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Release pooled resources. Later calls fail with a store error.
    async fn close(&self) {}

    /// Short name used in logs and health output.
    fn backend_name(&self) -> &'static str;
}
