//! Generation provider configuration.

use std::fmt;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-5";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_TIMEOUT_SECS: u64 = 300;

/// Configuration for the OpenAI-backed generation provider.
#[derive(Clone)]
pub struct GenerationConfig {
    /// API key. `None` disables generation.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Bound on the whole outbound call, clamped to 1..=300 seconds.
    pub timeout: Duration,
    /// Attach the `web_search` tool to requests.
    pub web_search: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            web_search: true,
        }
    }
}

impl GenerationConfig {
    /// Load configuration from environment variables.
    ///
    /// `LEADCACHE_OPENAI_API_KEY` wins over `OPENAI_API_KEY`; blank keys count
    /// as unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = std::env::var("LEADCACHE_OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                std::env::var("OPENAI_API_KEY")
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
            .map(|key| key.trim().to_string());

        let base_url = std::env::var("LEADCACHE_OPENAI_BASE_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or(defaults.base_url);

        let model = std::env::var("LEADCACHE_OPENAI_MODEL")
            .ok()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or(defaults.model);

        let timeout = std::env::var("LEADCACHE_GENERATION_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Self::clamp_timeout)
            .unwrap_or(defaults.timeout);

        let web_search = std::env::var("LEADCACHE_GENERATION_WEB_SEARCH")
            .ok()
            .and_then(|s| parse_bool(&s))
            .unwrap_or(defaults.web_search);

        Self {
            api_key,
            base_url,
            model,
            timeout,
            web_search,
        }
    }

    /// Clamp a timeout in seconds into the supported range.
    pub fn clamp_timeout(secs: u64) -> Duration {
        Duration::from_secs(secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS))
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("web_search", &self.web_search)
            .finish()
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GenerationConfig::default();
        assert!(!config.is_configured());
        assert_eq!(config.model, "gpt-5");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.web_search);
    }

    #[test]
    fn test_clamp_timeout() {
        assert_eq!(GenerationConfig::clamp_timeout(0), Duration::from_secs(1));
        assert_eq!(GenerationConfig::clamp_timeout(90), Duration::from_secs(90));
        assert_eq!(GenerationConfig::clamp_timeout(10_000), Duration::from_secs(300));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = GenerationConfig {
            api_key: Some("sk-secret".to_string()),
            ..GenerationConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
