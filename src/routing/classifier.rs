//! LLM-backed routing classifier
//!
//! Builds a natural-language catalog of registered agents, issues one
//! chat-completion call asking for a structured decision, and parses the
//! response. This boundary never raises: an unknown agent name substitutes
//! the default agent keeping the model's reasoning, and a failed or
//! unparseable call substitutes the default agent with a synthesized
//! fallback reasoning. No retry is applied; a single failure triggers the
//! default immediately to keep routing latency bounded.

use crate::config::LlmSection;
use crate::llm::provider::{CompletionRequest, LlmProvider, Message};
use crate::registry::{AgentDescriptor, AgentRegistry};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One routing decision: the chosen agent plus the model's reasoning
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub selected_agent: AgentDescriptor,
    pub reasoning: String,
}

/// Classifier choosing a specialist agent for each query
pub struct RoutingClassifier {
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

/// Shape the model is asked to emit
#[derive(Debug, Deserialize)]
struct RouteChoice {
    agent: String,
    #[serde(default)]
    reasoning: String,
}

impl RoutingClassifier {
    /// Create a classifier
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.3,
            max_tokens: 500,
        }
    }

    /// Create a classifier from the `[llm]` config section
    pub fn from_config(provider: Arc<dyn LlmProvider>, llm: &LlmSection) -> Self {
        Self {
            provider,
            model: llm.model.clone(),
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
        }
    }

    /// Override the classification temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Format the agent catalog for the system prompt
    fn format_agent_catalog(registry: &AgentRegistry) -> String {
        registry
            .all()
            .map(|agent| format!("- {} (skills: {})", agent.name, agent.skills.join(", ")))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Build the routing system prompt
    fn build_system_prompt(registry: &AgentRegistry) -> String {
        format!(
            r#"You are a query router for a medical multi-agent system.
Available agents:
{}

Analyze the query and determine which agent is best suited to handle it.
Respond with JSON: {{"agent": "agent_name", "reasoning": "why this agent"}}"#,
            Self::format_agent_catalog(registry)
        )
    }

    /// Parse the model response, tolerating markdown code fences
    fn parse_route_choice(content: &str) -> Option<RouteChoice> {
        let trimmed = content.trim();
        let stripped = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .map(|rest| rest.trim_end_matches("```"))
            .unwrap_or(trimmed);

        serde_json::from_str(stripped.trim()).ok()
    }

    fn fallback_decision(registry: &AgentRegistry, cause: &str) -> RoutingDecision {
        let default = registry.default_agent().clone();
        warn!(agent = %default.name, cause = %cause, "Routing fallback");

        RoutingDecision {
            selected_agent: default,
            reasoning: format!("Fallback to default agent: {cause}"),
        }
    }

    /// Choose the specialist agent for a query.
    ///
    /// Always returns a decision naming a registered agent.
    pub async fn classify(&self, query: &str, registry: &AgentRegistry) -> RoutingDecision {
        debug!("Building agent catalog for routing decision");

        let request = CompletionRequest {
            messages: vec![
                Message::system(Self::build_system_prompt(registry)),
                Message::user(query),
            ],
            model: self.model.clone(),
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        };

        let content = match self.provider.complete(request).await {
            Ok(response) => match response.content {
                Some(content) => content,
                None => {
                    return Self::fallback_decision(
                        registry,
                        "routing model returned no content",
                    )
                }
            },
            Err(e) => {
                return Self::fallback_decision(
                    registry,
                    &format!("routing model unavailable ({e})"),
                )
            }
        };

        debug!(response = %content, "Raw routing response");

        let choice = match Self::parse_route_choice(&content) {
            Some(choice) => choice,
            None => {
                return Self::fallback_decision(
                    registry,
                    "could not parse routing decision",
                )
            }
        };

        match registry.resolve(&choice.agent) {
            Ok(agent) => {
                info!(
                    agent = %agent.name,
                    reasoning = %choice.reasoning,
                    "Routing decision"
                );
                RoutingDecision {
                    selected_agent: agent.clone(),
                    reasoning: choice.reasoning,
                }
            }
            Err(_) => {
                // Unknown agent name: keep the model's reasoning for
                // observability but route to the default
                warn!(
                    requested = %choice.agent,
                    "Routing model named an unknown agent, using default"
                );
                RoutingDecision {
                    selected_agent: registry.default_agent().clone(),
                    reasoning: choice.reasoning,
                }
            }
        }
    }
}
