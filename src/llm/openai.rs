//! OpenAI-compatible chat completion provider
//!
//! Targets any endpoint speaking the `/v1/chat/completions` dialect, which
//! covers both hosted APIs and local inference servers. Classification calls
//! are deliberately not retried here: a failed call falls straight through to
//! the classifier's default-agent fallback to keep routing latency bounded.

use crate::llm::provider::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, Message, MessageRole, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Provider configuration
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    /// Base URL, e.g. `http://localhost:1234`
    pub base_url: String,
    /// Bearer token; None for local unauthenticated endpoints
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for OpenAiCompatConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234".to_string(),
            api_key: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// OpenAI-compatible provider implementation
pub struct OpenAiCompatProvider {
    config: OpenAiCompatConfig,
    client: Client,
}

impl OpenAiCompatProvider {
    /// Create a new provider
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, LlmError> {
        if config.base_url.is_empty() {
            return Err(LlmError::NotConfigured(
                "LLM base URL is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a provider that reuses an existing pooled client
    pub fn with_client(config: OpenAiCompatConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn convert_message(message: &Message) -> WireMessage {
        WireMessage {
            role: match message.role {
                MessageRole::System => "system".to_string(),
                MessageRole::User => "user".to_string(),
                MessageRole::Assistant => "assistant".to_string(),
            },
            content: Some(message.content.clone()),
        }
    }

    fn parse_completion_response(
        wire: WireCompletionResponse,
    ) -> Result<CompletionResponse, LlmError> {
        if wire.choices.is_empty() {
            return Err(LlmError::ApiError(
                "No choices returned from completion endpoint".to_string(),
            ));
        }

        let choice = &wire.choices[0];
        let usage = wire
            .usage
            .map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content.clone(),
            model: wire.model,
            usage,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {key}")),
            None => request,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let messages: Vec<WireMessage> =
            request.messages.iter().map(Self::convert_message).collect();

        debug!(
            model = %request.model,
            message_count = messages.len(),
            "Issuing chat completion request"
        );

        let wire_request = WireCompletionRequest {
            model: request.model,
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .authorize(
                self.client
                    .post(format!("{}/v1/chat/completions", self.config.base_url))
                    .header("Content-Type", "application/json"),
            )
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| {
                warn!("Completion endpoint network error: {}", e);
                LlmError::NetworkError(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError(format!(
                "Completion endpoint error: {status} - {error_text}"
            )));
        }

        let wire_response: WireCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Self::parse_completion_response(wire_response)
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let response = self
            .authorize(
                self.client
                    .get(format!("{}/v1/models", self.config.base_url)),
            )
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::ApiError(format!(
                "Completion endpoint health check failed: {}",
                response.status()
            )))
        }
    }
}

#[derive(Debug, Serialize)]
struct WireCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCompletionResponse {
    model: String,
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = OpenAiCompatConfig::default();
        assert_eq!(config.base_url, "http://localhost:1234");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_provider_rejects_empty_base_url() {
        let config = OpenAiCompatConfig {
            base_url: String::new(),
            ..Default::default()
        };
        let result = OpenAiCompatProvider::new(config);
        assert!(matches!(result, Err(LlmError::NotConfigured(_))));
    }

    #[test]
    fn test_provider_name() {
        let provider = OpenAiCompatProvider::new(OpenAiCompatConfig::default()).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_message_conversion() {
        let message = Message::user("Hello");
        let wire = OpenAiCompatProvider::convert_message(&message);
        assert_eq!(wire.role, "user");
        assert_eq!(wire.content, Some("Hello".to_string()));
    }

    #[test]
    fn test_request_serialization_skips_absent_fields() {
        let request = WireCompletionRequest {
            model: "test-model".to_string(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: Some("Hello".to_string()),
            }],
            temperature: Some(0.3),
            max_tokens: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"model\":\"test-model\""));
        assert!(json.contains("\"temperature\":0.3"));
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn test_parse_response_without_usage() {
        let wire = WireCompletionResponse {
            model: "test-model".to_string(),
            choices: vec![WireChoice {
                message: WireMessage {
                    role: "assistant".to_string(),
                    content: Some("{\"agent\":\"medgemma\"}".to_string()),
                },
            }],
            usage: None,
        };

        let response = OpenAiCompatProvider::parse_completion_response(wire).unwrap();
        assert_eq!(response.content, Some("{\"agent\":\"medgemma\"}".to_string()));
        assert_eq!(response.usage.total_tokens, 0);
    }

    #[test]
    fn test_parse_response_no_choices_is_error() {
        let wire = WireCompletionResponse {
            model: "test-model".to_string(),
            choices: vec![],
            usage: None,
        };

        let result = OpenAiCompatProvider::parse_completion_response(wire);
        assert!(matches!(result, Err(LlmError::ApiError(_))));
    }
}
