//! API Configuration Module
//!
//! Server, CORS and cache settings loaded from environment variables with
//! defaults suitable for development. Invalid numeric values fall back to
//! their defaults; an invalid bind address or port is a startup error.

use std::net::SocketAddr;
use std::time::Duration;

use leadcache_core::{KeyPrefix, LeadSchema};
use leadcache_storage::AggregationConfig;

use crate::error::{ApiError, ApiResult};

const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;
const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind.
    pub bind_host: String,

    /// Port to listen on, unparsed until [`ApiConfig::bind_addr`].
    pub port: String,

    // ========================================================================
    // CORS Configuration
    // ========================================================================
    /// Allowed CORS origins (comma-separated in env var).
    /// Empty or `*` means allow all origins.
    /// Example: "https://app.example.com,*.example.org"
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// How long in-flight requests may run after a shutdown signal.
    pub shutdown_grace: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT.to_string(),
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
            shutdown_grace: Duration::from_secs(DEFAULT_SHUTDOWN_GRACE_SECS),
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `LEADCACHE_API_BIND`: Interface to bind (default: 0.0.0.0)
    /// - `PORT` / `LEADCACHE_API_PORT`: Listen port (default: 3001)
    /// - `LEADCACHE_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `LEADCACHE_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `LEADCACHE_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    /// - `LEADCACHE_SHUTDOWN_GRACE_SECS`: Drain period on shutdown (default: 10)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_host = std::env::var("LEADCACHE_API_BIND")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.bind_host);

        let port = std::env::var("PORT")
            .ok()
            .or_else(|| std::env::var("LEADCACHE_API_PORT").ok())
            .map(|s| s.trim().to_string())
            .unwrap_or(defaults.port);

        let cors_origins = std::env::var("LEADCACHE_CORS_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .unwrap_or_default();

        let cors_allow_credentials = std::env::var("LEADCACHE_CORS_ALLOW_CREDENTIALS")
            .ok()
            .map(|s| s.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let cors_max_age_secs = env_parse("LEADCACHE_CORS_MAX_AGE_SECS")
            .unwrap_or(defaults.cors_max_age_secs);

        let shutdown_grace = env_parse("LEADCACHE_SHUTDOWN_GRACE_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.shutdown_grace);

        Self {
            bind_host,
            port,
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
            shutdown_grace,
        }
    }

    /// Resolve the socket address to listen on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        let port = self.port.parse::<u16>().map_err(|_| {
            ApiError::invalid_input(format!("Invalid port value: {}", self.port))
        })?;

        let addr = format!("{}:{}", self.bind_host, port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
        })
    }

    /// No origin list, or a literal `*` entry, allows every origin.
    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|o| o == "*")
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        if self.allows_any_origin() {
            return true;
        }

        self.cors_origins.iter().any(|allowed| {
            if allowed == origin {
                return true;
            }
            // Wildcard subdomains: *.example.com
            if let Some(pattern) = allowed.strip_prefix("*.") {
                if let Some(origin_domain) = origin.strip_prefix("https://") {
                    return origin_domain == pattern
                        || origin_domain
                            .strip_suffix(pattern)
                            .is_some_and(|head| head.ends_with('.'));
                }
            }
            false
        })
    }
}

// ============================================================================
// CACHE SETTINGS
// ============================================================================

/// Namespace and aggregation settings for the cache.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub key_prefix: KeyPrefix,
    pub aggregation: AggregationConfig,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            key_prefix: KeyPrefix::lead(),
            aggregation: AggregationConfig::default(),
        }
    }
}

impl CacheSettings {
    /// Create CacheSettings from environment variables.
    ///
    /// Environment variables:
    /// - `LEADCACHE_KEY_PREFIX`: `lead`, `email_verification` or a literal prefix (default: lead)
    /// - `LEADCACHE_STATS_SAMPLE_LIMIT`: Entries sampled for the freshness window (default: 100)
    /// - `LEADCACHE_CLASSIFY_CONCURRENCY`: Concurrent reads while classifying (default: 16)
    /// - `LEADCACHE_STATUS_FIELD` / `LEADCACHE_EXPORT_FIELD` / `LEADCACHE_LIST_FIELD`:
    ///   Payload field names read during classification
    ///
    /// An unusable custom prefix is an error.
    pub fn from_env() -> ApiResult<Self> {
        let defaults = Self::default();

        let key_prefix = match std::env::var("LEADCACHE_KEY_PREFIX") {
            Ok(raw) if !raw.trim().is_empty() => raw.parse::<KeyPrefix>()?,
            _ => defaults.key_prefix,
        };

        let sample_limit = env_positive("LEADCACHE_STATS_SAMPLE_LIMIT")
            .unwrap_or(defaults.aggregation.sample_limit);

        let read_concurrency = env_positive("LEADCACHE_CLASSIFY_CONCURRENCY")
            .unwrap_or(defaults.aggregation.read_concurrency);

        let default_schema = LeadSchema::default();
        let schema = LeadSchema {
            status_field: env_field("LEADCACHE_STATUS_FIELD")
                .unwrap_or(default_schema.status_field),
            export_field: env_field("LEADCACHE_EXPORT_FIELD")
                .unwrap_or(default_schema.export_field),
            list_field: env_field("LEADCACHE_LIST_FIELD").unwrap_or(default_schema.list_field),
        };

        Ok(Self {
            key_prefix,
            aggregation: AggregationConfig {
                sample_limit,
                read_concurrency,
                schema,
            },
        })
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_positive(key: &str) -> Option<usize> {
    env_parse::<usize>(key).filter(|n| *n > 0)
}

fn env_field(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert!(config.cors_origins.is_empty());
        assert!(!config.cors_allow_credentials);
        assert_eq!(config.cors_max_age_secs, 86400);
        assert_eq!(config.shutdown_grace, Duration::from_secs(10));
        assert_eq!(config.bind_addr().unwrap().port(), 3001);
    }

    #[test]
    fn test_bind_addr_rejects_bad_values() {
        let config = ApiConfig {
            port: "http".to_string(),
            ..ApiConfig::default()
        };
        let err = config.bind_addr().unwrap_err();
        assert!(err.message.contains("Invalid port"));

        let config = ApiConfig {
            bind_host: "not a host".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.bind_addr().is_err());
    }

    #[test]
    fn test_parse_origins() {
        let origins = parse_origins(" https://a.example.com, ,https://b.example.com ");
        assert_eq!(origins, vec!["https://a.example.com", "https://b.example.com"]);
    }

    #[test]
    fn test_literal_star_allows_any_origin() {
        let mut config = ApiConfig::default();
        config.cors_origins = parse_origins("*");
        assert!(config.allows_any_origin());
        assert!(config.is_origin_allowed("https://anything.com"));

        config.cors_origins = parse_origins("https://app.example.com");
        assert!(!config.allows_any_origin());
    }

    #[test]
    fn test_env_positive_rejects_zero() {
        std::env::set_var("LEADCACHE_TEST_POSITIVE_ZERO", "0");
        std::env::set_var("LEADCACHE_TEST_POSITIVE_SET", " 25 ");
        std::env::set_var("LEADCACHE_TEST_POSITIVE_JUNK", "-3");

        assert_eq!(env_positive("LEADCACHE_TEST_POSITIVE_ZERO"), None);
        assert_eq!(env_positive("LEADCACHE_TEST_POSITIVE_SET"), Some(25));
        assert_eq!(env_positive("LEADCACHE_TEST_POSITIVE_JUNK"), None);
    }

    #[test]
    fn test_origin_allowed_dev_mode() {
        let config = ApiConfig::default();
        assert!(config.is_origin_allowed("https://anything.com"));
        assert!(config.is_origin_allowed("http://localhost:3000"));
    }

    #[test]
    fn test_origin_allowed_production() {
        let mut config = ApiConfig::default();
        config.cors_origins = vec![
            "https://example.com".to_string(),
            "https://app.example.com".to_string(),
        ];

        assert!(config.is_origin_allowed("https://example.com"));
        assert!(config.is_origin_allowed("https://app.example.com"));
        assert!(!config.is_origin_allowed("https://evil.com"));
        assert!(!config.is_origin_allowed("https://notexample.com"));
    }

    #[test]
    fn test_wildcard_subdomain() {
        let mut config = ApiConfig::default();
        config.cors_origins = vec!["*.example.com".to_string()];

        assert!(config.is_origin_allowed("https://app.example.com"));
        assert!(config.is_origin_allowed("https://example.com"));
        assert!(!config.is_origin_allowed("https://notexample.com"));
        assert!(!config.is_origin_allowed("http://app.example.com"));
    }

    #[test]
    fn test_cache_settings_default() {
        let settings = CacheSettings::default();
        assert_eq!(settings.key_prefix, KeyPrefix::lead());
        assert_eq!(settings.aggregation.sample_limit, 100);
        assert_eq!(settings.aggregation.read_concurrency, 16);
        assert_eq!(settings.aggregation.schema.status_field, "emailStatus");
    }
}
