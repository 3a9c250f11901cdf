//! OpenAI API request and response types

use serde::{Deserialize, Serialize};

// ============================================================================
// RESPONSES API TYPES
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub r#type: String,
}

impl Tool {
    pub fn web_search() -> Self {
        Self {
            r#type: "web_search".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponsesResponse {
    pub output: Vec<OutputItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputItem {
    pub r#type: String,
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    pub r#type: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl ResponsesResponse {
    /// First non-empty `output_text` found in `message` items, in order.
    pub fn output_text(&self) -> Option<&str> {
        self.output
            .iter()
            .filter(|item| item.r#type == "message")
            .flat_map(|item| item.content.iter())
            .filter(|part| part.r#type == "output_text")
            .filter_map(|part| part.text.as_deref())
            .find(|text| !text.is_empty())
    }
}

// ============================================================================
// SHARED TYPES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl ErrorDetail {
    /// Message tagged with the error code, or the error type when no code
    /// was sent.
    pub fn describe(&self) -> String {
        match self.code.as_deref().or(self.r#type.as_deref()) {
            Some(tag) if !tag.is_empty() => format!("{} ({})", self.message, tag),
            _ => self.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail_describe() {
        let parse = |raw: &str| serde_json::from_str::<ApiError>(raw).unwrap().error.describe();

        assert_eq!(
            parse(r#"{"error":{"message":"Slow down","type":"requests","code":"rate_limit_exceeded"}}"#),
            "Slow down (rate_limit_exceeded)"
        );
        assert_eq!(
            parse(r#"{"error":{"message":"Bad key","type":"invalid_request_error"}}"#),
            "Bad key (invalid_request_error)"
        );
        assert_eq!(parse(r#"{"error":{"message":"Oops","code":null}}"#), "Oops");
    }

    #[test]
    fn test_request_shape() {
        let request = ResponsesRequest {
            model: "gpt-5".to_string(),
            input: "hi".to_string(),
            tools: vec![Tool::web_search()],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-5");
        assert_eq!(value["tools"][0]["type"], "web_search");

        let request = ResponsesRequest {
            tools: Vec::new(),
            ..request
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_output_text_skips_tool_calls() {
        let body = r#"{
            "output": [
                {"type": "web_search_call", "status": "completed"},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "{\"subject\":\"s\",\"body\":\"b\"}"}
                ]}
            ]
        }"#;
        let response: ResponsesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.output_text(), Some("{\"subject\":\"s\",\"body\":\"b\"}"));
    }

    #[test]
    fn test_output_text_missing() {
        let body = r#"{"output": [{"type": "message", "content": [{"type": "refusal"}]}]}"#;
        let response: ResponsesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.output_text(), None);
    }
}
