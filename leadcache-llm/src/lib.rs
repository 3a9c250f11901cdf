//! LeadCache LLM - Email Draft Generation
//!
//! Provider-agnostic trait for turning a lead (company context plus a
//! person's name) into a cold-email draft, with an OpenAI Responses API
//! implementation. Provider output that is not the expected
//! `{subject, body}` object is never an error: it is returned verbatim as a
//! fallback draft.

pub mod config;
pub mod delivery;
pub mod parse;
pub mod prompt;
pub mod providers;

use std::fmt::Debug;

use async_trait::async_trait;
use leadcache_core::{GenerationError, ValidationError};
use serde::{Deserialize, Serialize};

pub use config::GenerationConfig;
pub use delivery::{deliver_unless_abandoned, delivery_channel, Delivery, DeliveryOutcome};
pub use parse::{parse_draft, strip_code_fences};
pub use prompt::build_prompt;
pub use providers::openai::{OpenAIClient, OpenAIGenerationProvider};

// ============================================================================
// REQUEST / RESULT TYPES
// ============================================================================

/// Inputs for one generated draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRequest {
    /// Free-form context about the target company.
    pub company_info: String,
    /// Name of the person the email is addressed to.
    pub person_name: String,
}

impl DraftRequest {
    /// Build a request, rejecting blank inputs. Inputs are trimmed.
    pub fn new(
        company_info: impl Into<String>,
        person_name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let request = Self {
            company_info: company_info.into().trim().to_string(),
            person_name: person_name.into().trim().to_string(),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.company_info.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "companyInfo".to_string(),
            });
        }
        if self.person_name.trim().is_empty() {
            return Err(ValidationError::RequiredFieldMissing {
                field: "personName".to_string(),
            });
        }
        Ok(())
    }
}

/// Subject line and body of an email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

/// A draft plus whether it came from the structured or the fallback path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDraft {
    pub draft: EmailDraft,
    /// `true` when the provider output could not be parsed and the raw text
    /// was used as both subject and body.
    pub fallback: bool,
}

impl GeneratedDraft {
    pub fn parsed(draft: EmailDraft) -> Self {
        Self {
            draft,
            fallback: false,
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            draft: EmailDraft {
                subject: text.clone(),
                body: text,
            },
            fallback: true,
        }
    }
}

// ============================================================================
// GENERATION PROVIDER TRAIT
// ============================================================================

/// Trait for draft generation providers.
/// Implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait GenerationProvider: Send + Sync + Debug {
    /// Generate one draft.
    ///
    /// # Returns
    /// * `Ok(GeneratedDraft)` - Parsed or fallback draft
    /// * `Err(GenerationError)` - Network failure, timeout or non-success status
    async fn generate(&self, request: &DraftRequest) -> Result<GeneratedDraft, GenerationError>;

    /// Short provider name for logs and metrics.
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_request_trims() {
        let request = DraftRequest::new("  Acme builds rockets ", " Ada ").unwrap();
        assert_eq!(request.company_info, "Acme builds rockets");
        assert_eq!(request.person_name, "Ada");
    }

    #[test]
    fn test_draft_request_rejects_blank() {
        assert_eq!(
            DraftRequest::new("   ", "Ada"),
            Err(ValidationError::RequiredFieldMissing {
                field: "companyInfo".to_string()
            })
        );
        assert_eq!(
            DraftRequest::new("Acme", ""),
            Err(ValidationError::RequiredFieldMissing {
                field: "personName".to_string()
            })
        );
    }

    #[test]
    fn test_raw_draft_duplicates_text() {
        let draft = GeneratedDraft::raw("plain text");
        assert!(draft.fallback);
        assert_eq!(draft.draft.subject, "plain text");
        assert_eq!(draft.draft.body, "plain text");
    }
}
