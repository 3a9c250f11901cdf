//! In-memory backend for tests and local development.
//!
//! Keys live in a `BTreeMap`, so scans come back in lexical order. The
//! backend can be told to fail individual keys or go offline entirely, and
//! it counts the bulk-delete commands it receives.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use leadcache_core::{KeyPrefix, StoreError};

use crate::backend::KvBackend;

#[derive(Debug, Default)]
pub struct InMemoryBackend {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    failing_keys: RwLock<BTreeSet<String>>,
    offline: AtomicBool,
    delete_many_calls: AtomicU64,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw bytes at `key`, bypassing the envelope codec.
    pub fn insert_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        entries.insert(key.into(), value.into());
        Ok(())
    }

    /// Raw bytes at `key`, bypassing the offline and failure switches.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.read().ok().and_then(|entries| entries.get(key).cloned())
    }

    /// Make every `get`/`set`/`delete` of `key` fail with a command error.
    pub fn fail_key(&self, key: impl Into<String>) {
        if let Ok(mut failing) = self.failing_keys.write() {
            failing.insert(key.into());
        }
    }

    /// Toggle whole-backend unavailability.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `delete_many` commands received so far.
    pub fn delete_many_calls(&self) -> u64 {
        self.delete_many_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "in-memory backend is offline".to_string(),
            });
        }
        Ok(())
    }

    fn check_key(&self, operation: &'static str, key: &str) -> Result<(), StoreError> {
        self.check_online()?;
        let failing = self.failing_keys.read().map_err(|_| StoreError::LockPoisoned)?;
        if failing.contains(key) {
            return Err(StoreError::Command {
                operation,
                reason: format!("injected failure for key {}", key),
                source: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KvBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_key("GET", key)?;
        let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.check_key("SET", key)?;
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        self.check_key("DEL", key)?;
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries.remove(key).is_some())
    }

    async fn scan_prefix(&self, prefix: &KeyPrefix) -> Result<Vec<String>, StoreError> {
        self.check_online()?;
        let entries = self.entries.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(entries
            .range(prefix.as_str().to_string()..)
            .take_while(|(key, _)| prefix.owns(key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<u64, StoreError> {
        self.check_online()?;
        self.delete_many_calls.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.write().map_err(|_| StoreError::LockPoisoned)?;
        let removed = keys
            .iter()
            .filter(|key| entries.remove(key.as_str()).is_some())
            .count();
        Ok(removed as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }

    async fn close(&self) {
        self.set_offline(true);
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let backend = InMemoryBackend::new();
        backend.set("lead_a", b"1".to_vec()).await.unwrap();

        assert_eq!(backend.get("lead_a").await.unwrap(), Some(b"1".to_vec()));
        assert!(backend.delete("lead_a").await.unwrap());
        assert!(!backend.delete("lead_a").await.unwrap());
        assert_eq!(backend.get("lead_a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scan_prefix_only_returns_namespace() {
        let backend = InMemoryBackend::new();
        for key in ["lead_b", "lead_a", "email_verification_a", "leaf", "lea"] {
            backend.insert_raw(key, b"x".to_vec()).unwrap();
        }

        let keys = backend.scan_prefix(&KeyPrefix::lead()).await.unwrap();
        assert_eq!(keys, vec!["lead_a".to_string(), "lead_b".to_string()]);

        let keys = backend
            .scan_prefix(&KeyPrefix::email_verification())
            .await
            .unwrap();
        assert_eq!(keys, vec!["email_verification_a".to_string()]);
    }

    #[tokio::test]
    async fn test_delete_many_counts_calls() {
        let backend = InMemoryBackend::new();
        backend.insert_raw("lead_a", b"x".to_vec()).unwrap();
        backend.insert_raw("lead_b", b"x".to_vec()).unwrap();

        let removed = backend
            .delete_many(&["lead_a".to_string(), "lead_missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(backend.delete_many_calls(), 1);
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let backend = InMemoryBackend::new();
        backend.insert_raw("lead_a", b"x".to_vec()).unwrap();
        backend.fail_key("lead_a");

        let err = backend.get("lead_a").await.unwrap_err();
        assert!(matches!(err, StoreError::Command { operation: "GET", .. }));

        backend.set_offline(true);
        let err = backend.ping().await.unwrap_err();
        assert!(err.is_connectivity());
        assert!(backend.scan_prefix(&KeyPrefix::lead()).await.is_err());

        backend.set_offline(false);
        assert!(backend.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_close_takes_backend_offline() {
        let backend = InMemoryBackend::new();
        backend.close().await;
        assert!(backend.ping().await.is_err());
    }
}
