//! Mock implementations for testing
//!
//! Provides a deterministic LlmProvider and a canned registry so routing and
//! executor behavior can be tested without network dependencies.

use crate::config::AgentEntry;
use crate::llm::provider::{
    CompletionRequest, CompletionResponse, LlmError, LlmProvider, TokenUsage,
};
use crate::registry::AgentRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Mock LLM provider for testing
#[derive(Debug)]
pub struct MockLlmProvider {
    pub responses: Vec<String>,
    pub current_response: Arc<Mutex<usize>>,
    pub should_fail: bool,
}

impl MockLlmProvider {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses,
            current_response: Arc::new(Mutex::new(0)),
            should_fail: false,
        }
    }

    pub fn with_failure() -> Self {
        Self {
            responses: vec![],
            current_response: Arc::new(Mutex::new(0)),
            should_fail: true,
        }
    }

    pub fn single_response(response: impl Into<String>) -> Self {
        Self::new(vec![response.into()])
    }

    /// Provider returning a routing decision naming the given agent
    pub fn routes_to(agent: &str, reasoning: &str) -> Self {
        Self::single_response(
            serde_json::json!({"agent": agent, "reasoning": reasoning}).to_string(),
        )
    }
}

#[async_trait]
impl LlmProvider for MockLlmProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if self.should_fail {
            return Err(LlmError::RequestFailed("Mock LLM failure".to_string()));
        }

        let mut current = self.current_response.lock().await;
        let response_idx = *current % self.responses.len().max(1);
        *current += 1;

        let content = if self.responses.is_empty() {
            "Mock response".to_string()
        } else {
            self.responses[response_idx].clone()
        };

        Ok(CompletionResponse {
            content: Some(content),
            model: "mock-model".to_string(),
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        if self.should_fail {
            Err(LlmError::RequestFailed(
                "Mock health check failure".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

/// Registry with the standard two-specialist setup used across tests
pub fn sample_registry() -> AgentRegistry {
    sample_registry_at("http://localhost:9101", "http://localhost:9102")
}

/// Same registry pointed at arbitrary endpoints (wiremock servers)
pub fn sample_registry_at(medgemma_url: &str, clinical_url: &str) -> AgentRegistry {
    let entries = vec![
        AgentEntry {
            name: "medgemma".to_string(),
            base_url: medgemma_url.to_string(),
            skills: vec!["answer_medical_question".to_string()],
        },
        AgentEntry {
            name: "clinical".to_string(),
            base_url: clinical_url.to_string(),
            skills: vec!["clinical_research".to_string()],
        },
    ];

    AgentRegistry::from_entries(&entries, "medgemma").expect("sample registry should build")
}
