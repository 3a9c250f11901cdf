//! OpenAI HTTP client with a bounded request timeout

use std::time::Duration;

use leadcache_core::GenerationError;
use reqwest::Client;
use serde::Serialize;

use super::types::ApiError;

/// OpenAI API client.
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAIClient {
    /// Create a new OpenAI client.
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key
    /// * `base_url` - API root, e.g. `https://api.openai.com/v1`
    /// * `timeout` - Bound on each request, from connect to full body
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(GenerationError::request)?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` to `endpoint` and return the raw response text.
    ///
    /// Non-success statuses become [`GenerationError::Status`] carrying the
    /// provider's error message when it sent one, or the raw body otherwise.
    pub async fn post_raw<Req: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &Req,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if status.is_success() {
            return Ok(text);
        }

        let message = match serde_json::from_str::<ApiError>(&text) {
            Ok(api_error) => api_error.error.describe(),
            Err(_) => text,
        };
        Err(GenerationError::Status {
            status: status.as_u16(),
            body: message,
        })
    }

    fn map_transport_error(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            GenerationError::request(err)
        }
    }
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on a loopback port.
    async fn one_shot_server(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 16 * 1024];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_success_returns_raw_body() {
        let base = one_shot_server("200 OK", r#"{"output":[]}"#).await;
        let client = OpenAIClient::new("sk-test", base, Duration::from_secs(5)).unwrap();
        let body = client.post_raw("responses", &serde_json::json!({})).await.unwrap();
        assert_eq!(body, r#"{"output":[]}"#);
    }

    #[tokio::test]
    async fn test_error_status_extracts_message() {
        let base = one_shot_server(
            "429 Too Many Requests",
            r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#,
        )
        .await;
        let client = OpenAIClient::new("sk-test", base, Duration::from_secs(5)).unwrap();
        let err = client
            .post_raw("responses", &serde_json::json!({}))
            .await
            .unwrap_err();

        match err {
            GenerationError::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "Rate limit reached (requests)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client =
            OpenAIClient::new("sk-test", format!("http://{}", addr), Duration::from_secs(1)).unwrap();
        let err = client
            .post_raw("responses", &serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::Timeout { timeout_secs: 1 }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client =
            OpenAIClient::new("sk-secret", "https://api.openai.com/v1/", Duration::from_secs(5)).unwrap();
        let rendered = format!("{:?}", client);
        assert!(!rendered.contains("sk-secret"));
        assert_eq!(client.base_url(), "https://api.openai.com/v1");
    }
}
