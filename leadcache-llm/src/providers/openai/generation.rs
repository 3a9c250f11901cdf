//! OpenAI draft generation provider

use async_trait::async_trait;
use leadcache_core::GenerationError;
use tracing::{debug, warn};

use super::client::OpenAIClient;
use super::types::{ResponsesRequest, ResponsesResponse, Tool};
use crate::config::GenerationConfig;
use crate::parse::parse_draft;
use crate::prompt::build_prompt;
use crate::{DraftRequest, GeneratedDraft, GenerationProvider};

/// Draft generation over the OpenAI Responses API.
pub struct OpenAIGenerationProvider {
    client: OpenAIClient,
    model: String,
    web_search: bool,
}

impl OpenAIGenerationProvider {
    pub fn new(client: OpenAIClient, model: impl Into<String>, web_search: bool) -> Self {
        Self {
            client,
            model: model.into(),
            web_search,
        }
    }

    /// Build a provider from configuration.
    ///
    /// Returns [`GenerationError::NotConfigured`] when no API key is set.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or(GenerationError::NotConfigured)?;
        let client = OpenAIClient::new(api_key, config.base_url.clone(), config.timeout)?;
        Ok(Self::new(client, config.model.clone(), config.web_search))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: &DraftRequest) -> ResponsesRequest {
        let tools = if self.web_search {
            vec![Tool::web_search()]
        } else {
            Vec::new()
        };
        ResponsesRequest {
            model: self.model.clone(),
            input: build_prompt(request),
            tools,
        }
    }
}

/// Turn a successful Responses API body into a draft.
///
/// A body that is not in the Responses shape, or carries no output text,
/// falls back to the raw body.
pub fn interpret_response(body: &str) -> GeneratedDraft {
    let response = match serde_json::from_str::<ResponsesResponse>(body) {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Generation response is not in the expected shape, using raw body");
            return GeneratedDraft::raw(body);
        }
    };

    let Some(text) = response.output_text() else {
        warn!("Generation response carried no output text, using raw body");
        return GeneratedDraft::raw(body);
    };

    let draft = parse_draft(text);
    if draft.fallback {
        warn!("Model output is not a subject/body object, using raw text");
    } else {
        debug!(subject = %draft.draft.subject, "Parsed generated draft");
    }
    draft
}

#[async_trait]
impl GenerationProvider for OpenAIGenerationProvider {
    async fn generate(&self, request: &DraftRequest) -> Result<GeneratedDraft, GenerationError> {
        let body = self
            .client
            .post_raw("responses", &self.build_request(request))
            .await?;
        Ok(interpret_response(&body))
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

impl std::fmt::Debug for OpenAIGenerationProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIGenerationProvider")
            .field("model", &self.model)
            .field("web_search", &self.web_search)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_requires_key() {
        let err = OpenAIGenerationProvider::from_config(&GenerationConfig::default()).unwrap_err();
        assert!(matches!(err, GenerationError::NotConfigured));
    }

    #[test]
    fn test_build_request_tools() {
        let config = GenerationConfig {
            api_key: Some("sk-test".to_string()),
            web_search: false,
            ..GenerationConfig::default()
        };
        let provider = OpenAIGenerationProvider::from_config(&config).unwrap();
        let request = DraftRequest::new("Acme", "Ada").unwrap();

        let built = provider.build_request(&request);
        assert_eq!(built.model, "gpt-5");
        assert!(built.tools.is_empty());
        assert!(built.input.contains("Ada"));
    }

    #[test]
    fn test_interpret_structured_output() {
        let body = r#"{"output":[{"type":"message","content":[
            {"type":"output_text","text":"```json\n{\"subject\":\"Hi Ada\",\"body\":\"<p>Hello</p>\"}\n```"}
        ]}]}"#;
        let draft = interpret_response(body);
        assert!(!draft.fallback);
        assert_eq!(draft.draft.subject, "Hi Ada");
        assert_eq!(draft.draft.body, "<p>Hello</p>");
    }

    #[test]
    fn test_interpret_unparseable_output_text() {
        let body = r#"{"output":[{"type":"message","content":[
            {"type":"output_text","text":"Subject: Hi"}
        ]}]}"#;
        let draft = interpret_response(body);
        assert!(draft.fallback);
        assert_eq!(draft.draft.subject, "Subject: Hi");
        assert_eq!(draft.draft.body, "Subject: Hi");
    }

    #[test]
    fn test_interpret_missing_output_uses_raw_body() {
        let body = r#"{"output":[]}"#;
        let draft = interpret_response(body);
        assert!(draft.fallback);
        assert_eq!(draft.draft.body, body);

        let draft = interpret_response("upstream said no");
        assert!(draft.fallback);
        assert_eq!(draft.draft.subject, "upstream said no");
    }
}
