//! Identity normalization and key namespaces.
//!
//! An [`Identity`] can only be built through [`Identity::parse`], so every
//! store key derived from one is already trimmed and lowercased. A
//! [`KeyPrefix`] names the record family; the two built-in families never
//! collide because neither prefix is a prefix of the other.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Prefix of the lead namespace.
pub const LEAD_PREFIX: &str = "lead_";

/// Prefix of the legacy email-verification namespace.
pub const EMAIL_VERIFICATION_PREFIX: &str = "email_verification_";

/// Normalized lookup key for a cache entry (e.g. an email address).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Normalize a raw identity: trim surrounding whitespace and lowercase.
    ///
    /// Returns [`ValidationError::EmptyIdentity`] when nothing is left.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ValidationError::EmptyIdentity);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Identity::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Namespace string prepended to identities to form store keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPrefix(String);

impl KeyPrefix {
    /// The lead namespace (`lead_`).
    pub fn lead() -> Self {
        Self(LEAD_PREFIX.to_string())
    }

    /// The legacy email-verification namespace (`email_verification_`).
    pub fn email_verification() -> Self {
        Self(EMAIL_VERIFICATION_PREFIX.to_string())
    }

    /// A custom namespace. Must be non-empty and free of whitespace.
    pub fn custom(prefix: impl Into<String>) -> Result<Self, ValidationError> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "key_prefix".to_string(),
                reason: "prefix must not be empty".to_string(),
            });
        }
        if prefix.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidValue {
                field: "key_prefix".to_string(),
                reason: "prefix must not contain whitespace".to_string(),
            });
        }
        Ok(Self(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Store key for an identity in this namespace.
    pub fn key_for(&self, identity: &Identity) -> String {
        let mut key = String::with_capacity(self.0.len() + identity.0.len());
        key.push_str(&self.0);
        key.push_str(&identity.0);
        key
    }

    /// Whether a raw store key belongs to this namespace.
    pub fn owns(&self, key: &str) -> bool {
        key.starts_with(&self.0)
    }

    /// The identity part of a store key, if the key is in this namespace.
    pub fn strip<'a>(&self, key: &'a str) -> Option<&'a str> {
        key.strip_prefix(self.0.as_str())
    }

    /// Glob pattern matching every key of this namespace, with glob
    /// metacharacters in the prefix escaped.
    pub fn scan_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.0.len() + 2);
        for c in self.0.chars() {
            if matches!(c, '*' | '?' | '[' | ']' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('*');
        pattern
    }
}

impl Default for KeyPrefix {
    fn default() -> Self {
        Self::lead()
    }
}

impl fmt::Display for KeyPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for KeyPrefix {
    type Err = ValidationError;

    /// Accepts the family names `lead` and `email_verification`, or a
    /// literal custom prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "lead" | LEAD_PREFIX => Ok(Self::lead()),
            "email_verification" | EMAIL_VERIFICATION_PREFIX => Ok(Self::email_verification()),
            other => Self::custom(other),
        }
    }
}
