//! Text generation against a local Ollama server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use agency_shared::{AgencyError, Result};

/// Produces a completion for a prompt.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate the full reply of `model` to `prompt`.
    async fn generate(&self, model: &str, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Client for Ollama's `/api/generate` endpoint (non-streaming).
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    endpoint: String,
}

impl OllamaClient {
    /// Create a client for the server at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgencyError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/generate", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl Generator for OllamaClient {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgencyError::Generation(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AgencyError::Generation(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(AgencyError::Generation(format!("HTTP {status}: {message}")));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| AgencyError::Generation(format!("unexpected response: {e}")))?;

        debug!(eval_count = ?parsed.eval_count, "generation finished");
        info!(response_len = parsed.response.len(), "model replied");
        Ok(parsed.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OllamaClient {
        OllamaClient::new(&format!("{}/", server.uri()), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn posts_non_streaming_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_json(serde_json::json!({
                "model": "deepseek-r1",
                "prompt": "hello",
                "stream": false,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "deepseek-r1",
                "response": "<think>hm</think>hi there",
                "done": true,
                "eval_count": 7,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let reply = client(&server).generate("deepseek-r1", "hello").await.unwrap();
        assert_eq!(reply, "<think>hm</think>hi there");
    }

    #[tokio::test]
    async fn server_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "model \"missing\" not found, try pulling it first",
            })))
            .mount(&server)
            .await;

        let err = client(&server).generate("missing", "hello").await.unwrap_err();
        assert!(matches!(err, AgencyError::Generation(_)));
        assert!(err.to_string().contains("404"));
        assert!(err.to_string().contains("try pulling it first"));
    }

    #[tokio::test]
    async fn malformed_reply_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client(&server).generate("m", "p").await.unwrap_err();
        assert!(err.to_string().contains("unexpected response"));
    }
}
