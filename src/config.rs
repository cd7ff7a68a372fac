//! Configuration system for the hub
//!
//! Loads a TOML file describing the hub itself, the routing LLM endpoint,
//! routing policy, and the static registry of specialist agents. Secrets are
//! referenced indirectly through environment variable names and resolved at
//! runtime, never stored in the file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Main hub configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HubConfig {
    pub hub: HubSection,
    pub llm: LlmSection,
    pub routing: RoutingSection,
    #[serde(default)]
    pub agents: Vec<AgentEntry>,
}

/// Hub section - identity and caller-facing settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HubSection {
    /// Hub identifier (must match [a-zA-Z0-9._-]+)
    pub id: String,
    /// Port for the HTTP caller layer
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
    /// Upper bound on one route() call, end to end
    #[serde(default = "default_chat_timeout_secs")]
    pub chat_timeout_secs: u64,
}

fn default_bind_port() -> u16 {
    8000
}

fn default_chat_timeout_secs() -> u64 {
    90
}

/// LLM section - the chat-completion endpoint used for routing decisions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSection {
    /// Base URL of an OpenAI-compatible endpoint
    pub base_url: String,
    /// Model identifier for classification calls
    pub model: String,
    /// Environment variable containing the API key (absent for local endpoints)
    pub api_key_env: Option<String>,
    /// Temperature for routing decisions
    #[serde(default = "default_routing_temperature")]
    pub temperature: f32,
    /// Max tokens for the classification response
    #[serde(default = "default_routing_max_tokens")]
    pub max_tokens: u32,
}

fn default_routing_temperature() -> f32 {
    0.3
}

fn default_routing_max_tokens() -> u32 {
    500
}

/// Routing section - dispatch policy and remote call bounds
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutingSection {
    /// Agent used whenever classification cannot produce a usable choice
    pub default_agent: String,
    /// Default orchestrator mode when a request carries none
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Whole-exchange timeout for one streamed remote invocation
    #[serde(default = "default_invoke_timeout_secs")]
    pub invoke_timeout_secs: u64,
}

fn default_mode() -> String {
    "simple".to_string()
}

fn default_invoke_timeout_secs() -> u64 {
    180
}

/// One registry entry: a specialist agent and its declared skills
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentEntry {
    /// Logical agent name used by the classifier
    pub name: String,
    /// Endpoint serving discovery and streamed invocation
    pub base_url: String,
    /// Declared skills, presented to the classifier verbatim
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid hub ID format: {0}")]
    InvalidHubId(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HubConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: HubConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural consistency of the loaded configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_hub_id(&self.hub.id)?;

        if self.agents.is_empty() {
            return Err(ConfigError::InvalidConfig(
                "At least one [[agents]] entry is required".to_string(),
            ));
        }

        for agent in &self.agents {
            let parsed = url::Url::parse(&agent.base_url).map_err(|e| {
                ConfigError::InvalidConfig(format!(
                    "Agent '{}' has invalid base_url '{}': {e}",
                    agent.name, agent.base_url
                ))
            })?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err(ConfigError::InvalidConfig(format!(
                    "Agent '{}' base_url must be http or https",
                    agent.name
                )));
            }
        }

        if !self
            .agents
            .iter()
            .any(|a| a.name == self.routing.default_agent)
        {
            return Err(ConfigError::InvalidConfig(format!(
                "default_agent '{}' is not a registered agent",
                self.routing.default_agent
            )));
        }

        Ok(())
    }

    /// Resolve the LLM API key from the configured environment variable.
    /// Absent configuration means a local, unauthenticated endpoint.
    pub fn get_llm_api_key(&self) -> Result<Option<String>, ConfigError> {
        match &self.llm.api_key_env {
            Some(env_name) => std::env::var(env_name)
                .map(Some)
                .map_err(|_| ConfigError::EnvVarNotFound(env_name.clone())),
            None => Ok(None),
        }
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[hub]
id = "test-hub"

[llm]
base_url = "http://localhost:1234"
model = "meta-llama-3.1-8b-instruct"

[routing]
default_agent = "medgemma"

[[agents]]
name = "medgemma"
base_url = "http://localhost:9101"
skills = ["answer_medical_question"]

[[agents]]
name = "clinical"
base_url = "http://localhost:9102"
skills = ["clinical_research"]
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Validate hub ID format
fn validate_hub_id(hub_id: &str) -> Result<(), ConfigError> {
    let valid_chars = hub_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if hub_id.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidHubId(format!(
            "Hub ID '{hub_id}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parses() {
        let toml_content = r#"
[hub]
id = "medhub"
bind_port = 8000
chat_timeout_secs = 90

[llm]
base_url = "http://localhost:1234"
model = "meta-llama-3.1-8b-instruct"
api_key_env = "LLM_API_KEY"
temperature = 0.3
max_tokens = 500

[routing]
default_agent = "medgemma"
mode = "simple"
invoke_timeout_secs = 180

[[agents]]
name = "medgemma"
base_url = "http://localhost:9101"
skills = ["answer_medical_question"]

[[agents]]
name = "clinical"
base_url = "http://localhost:9102"
skills = ["clinical_research"]
"#;

        let config: HubConfig = toml::from_str(toml_content).unwrap();
        config.validate().unwrap();
        assert_eq!(config.hub.id, "medhub");
        assert_eq!(config.agents.len(), 2);
        assert_eq!(config.routing.default_agent, "medgemma");
        assert_eq!(config.llm.temperature, 0.3);
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = HubConfig::test_config();
        config.validate().unwrap();

        assert_eq!(config.hub.bind_port, 8000);
        assert_eq!(config.hub.chat_timeout_secs, 90);
        assert_eq!(config.llm.temperature, 0.3);
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.routing.mode, "simple");
        assert_eq!(config.routing.invoke_timeout_secs, 180);
        assert!(config.llm.api_key_env.is_none());
    }

    #[test]
    fn test_invalid_hub_id() {
        let result = validate_hub_id("invalid@hub");
        assert!(result.is_err());

        let result = validate_hub_id("valid-hub_123.test");
        assert!(result.is_ok());
    }

    #[test]
    fn test_default_agent_must_be_registered() {
        let mut config = HubConfig::test_config();
        config.routing.default_agent = "nonexistent".to_string();

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_agent_list_rejected() {
        let mut config = HubConfig::test_config();
        config.agents.clear();

        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_agent_url_rejected() {
        let mut config = HubConfig::test_config();
        config.agents[0].base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.agents[0].base_url = "ftp://localhost:9101".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_resolution() {
        let mut config = HubConfig::test_config();
        assert_eq!(config.get_llm_api_key().unwrap(), None);

        config.llm.api_key_env = Some("MEDHUB_TEST_MISSING_KEY".to_string());
        assert!(matches!(
            config.get_llm_api_key(),
            Err(ConfigError::EnvVarNotFound(_))
        ));
    }
}
