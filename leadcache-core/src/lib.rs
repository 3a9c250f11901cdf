//! LeadCache Core - Envelope, Identity and Lead Types
//!
//! Data types shared by every other crate in the workspace: the persisted
//! envelope and its codec, identity normalization and key namespaces, the
//! lead schema used by aggregation, the derived stats/tally types, and the
//! error taxonomy.
//!
//! This crate performs no I/O.

pub mod clock;
pub mod envelope;
pub mod error;
pub mod identity;
pub mod lead;

pub use clock::{Clock, ManualClock, SystemClock};
pub use envelope::{CacheHit, CacheLookup, EncodeError, Envelope, Payload};
pub use error::{
    DecodeError, GenerationError, LeadCacheError, LeadCacheResult, StoreError, ValidationError,
};
pub use identity::{Identity, KeyPrefix, EMAIL_VERIFICATION_PREFIX, LEAD_PREFIX};
pub use lead::{
    ClassificationTally, ExportReport, ExportRow, LeadClass, LeadSchema, StatsSnapshot, VALID_STATUS,
};

/// Milliseconds since the Unix epoch.
pub type EpochMillis = i64;
