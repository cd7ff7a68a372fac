//! Static agent registry
//!
//! Maps logical agent names to remote endpoints and declared skills. Loaded
//! once from configuration, read-only afterwards, and passed explicitly to
//! the classifier and remote client rather than living in process globals.

use crate::config::AgentEntry;
use crate::error::{HubError, HubResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A registered specialist agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentDescriptor {
    /// Logical name used by the classifier and callers
    pub name: String,
    /// Endpoint serving discovery and streamed invocation
    pub base_url: String,
    /// Declared skills, presented to the classifier verbatim
    pub skills: Vec<String>,
}

impl AgentDescriptor {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        skills: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            skills,
        }
    }
}

/// Read-only registry of specialist agents, safe for concurrent reads
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    // BTreeMap keeps catalog iteration order stable for prompts and logs
    agents: BTreeMap<String, AgentDescriptor>,
    default_agent: String,
}

impl AgentRegistry {
    /// Build a registry from configuration entries.
    /// The default agent name must resolve to one of the entries.
    pub fn from_entries(entries: &[AgentEntry], default_agent: &str) -> HubResult<Self> {
        let mut agents = BTreeMap::new();
        for entry in entries {
            agents.insert(
                entry.name.clone(),
                AgentDescriptor::new(&entry.name, &entry.base_url, entry.skills.clone()),
            );
        }

        if !agents.contains_key(default_agent) {
            return Err(HubError::UnknownAgent {
                name: default_agent.to_string(),
            });
        }

        Ok(Self {
            agents,
            default_agent: default_agent.to_string(),
        })
    }

    /// Resolve an agent by name
    pub fn resolve(&self, name: &str) -> HubResult<&AgentDescriptor> {
        self.agents.get(name).ok_or_else(|| HubError::UnknownAgent {
            name: name.to_string(),
        })
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// The agent used whenever classification cannot produce a usable choice
    pub fn default_agent(&self) -> &AgentDescriptor {
        // Presence is guaranteed by from_entries
        &self.agents[&self.default_agent]
    }

    /// All registered agents, in stable name order
    pub fn all(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.values()
    }

    /// Number of registered agents
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entries() -> Vec<AgentEntry> {
        vec![
            AgentEntry {
                name: "medgemma".to_string(),
                base_url: "http://localhost:9101".to_string(),
                skills: vec!["answer_medical_question".to_string()],
            },
            AgentEntry {
                name: "clinical".to_string(),
                base_url: "http://localhost:9102".to_string(),
                skills: vec!["clinical_research".to_string()],
            },
        ]
    }

    #[test]
    fn test_resolve_known_agent() {
        let registry = AgentRegistry::from_entries(&sample_entries(), "medgemma").unwrap();

        let agent = registry.resolve("clinical").unwrap();
        assert_eq!(agent.base_url, "http://localhost:9102");
        assert_eq!(agent.skills, vec!["clinical_research".to_string()]);
    }

    #[test]
    fn test_resolve_unknown_agent_fails() {
        let registry = AgentRegistry::from_entries(&sample_entries(), "medgemma").unwrap();

        let result = registry.resolve("radiology");
        assert!(matches!(result, Err(HubError::UnknownAgent { .. })));
    }

    #[test]
    fn test_default_agent_must_be_registered() {
        let result = AgentRegistry::from_entries(&sample_entries(), "radiology");
        assert!(matches!(result, Err(HubError::UnknownAgent { .. })));
    }

    #[test]
    fn test_default_agent_lookup() {
        let registry = AgentRegistry::from_entries(&sample_entries(), "medgemma").unwrap();
        assert_eq!(registry.default_agent().name, "medgemma");
    }

    #[test]
    fn test_iteration_order_is_stable() {
        let registry = AgentRegistry::from_entries(&sample_entries(), "medgemma").unwrap();
        let names: Vec<&str> = registry.all().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["clinical", "medgemma"]);
    }
}
