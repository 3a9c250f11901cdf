//! LeadCache Storage - Store Adapter and Aggregation
//!
//! The [`CacheStore`] adapter maps identities onto namespaced keys of a
//! pluggable [`KvBackend`] and owns envelope timestamps. The [`Aggregator`]
//! scans the active namespace to produce stats snapshots and lead tallies.
//!
//! Two backends ship with the crate: [`RedisBackend`] for deployments and
//! [`InMemoryBackend`] for tests and local development.

pub mod aggregate;
pub mod backend;
pub mod memory;
pub mod redis_backend;
pub mod store;

pub use aggregate::{AggregationConfig, Aggregator};
pub use backend::KvBackend;
pub use memory::InMemoryBackend;
pub use redis_backend::{RedisBackend, RedisConfig};
pub use store::{CacheStore, BULK_DELETE_BATCH};
