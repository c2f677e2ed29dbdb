//! Agent Registry
//!
//! Named agent instances, built once at startup and shared read-only behind
//! `Arc`. Lookup by name, iteration in registration order.

use super::Agent;
use crate::types::{AgentDescriptor, AppError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of the agents the orchestrator can delegate to
#[derive(Clone, Default)]
pub struct AgentRegistry {
    /// Agents in registration order
    agents: Vec<Arc<dyn Agent>>,
    /// Name -> position in `agents`
    index: HashMap<String, usize>,
}

impl AgentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fluent builder
    pub fn builder() -> AgentRegistryBuilder {
        AgentRegistryBuilder::new()
    }

    /// Look up an agent by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.index.get(name).map(|&i| Arc::clone(&self.agents[i]))
    }

    /// Check if an agent exists
    pub fn has_agent(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All agents, in registration order
    pub fn all(&self) -> &[Arc<dyn Agent>] {
        &self.agents
    }

    /// Agent names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    /// Descriptors of every agent, in registration order
    pub fn descriptors(&self) -> Vec<AgentDescriptor> {
        self.agents.iter().map(|a| a.capabilities()).collect()
    }

    /// First registered agent, used when planning falls back
    pub fn first(&self) -> Option<Arc<dyn Agent>> {
        self.agents.first().cloned()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Builder for creating AgentRegistry with fluent API
#[derive(Default)]
pub struct AgentRegistryBuilder {
    agents: Vec<Arc<dyn Agent>>,
}

impl AgentRegistryBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent; it is registered under its descriptor name
    pub fn with_agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agents.push(agent);
        self
    }

    /// Build the AgentRegistry
    ///
    /// Fails if two agents share a name or a name is empty.
    pub fn build(self) -> Result<AgentRegistry> {
        let mut index = HashMap::with_capacity(self.agents.len());

        for (position, agent) in self.agents.iter().enumerate() {
            let name = agent.name();
            if name.trim().is_empty() {
                return Err(AppError::Configuration(
                    "Agent name must not be empty".to_string(),
                ));
            }
            if index.insert(name.clone(), position).is_some() {
                return Err(AppError::Configuration(format!(
                    "Agent '{}' is registered more than once",
                    name
                )));
            }
        }

        tracing::debug!(agents = ?index.keys().collect::<Vec<_>>(), "Agent registry built");

        Ok(AgentRegistry {
            agents: self.agents,
            index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::MockAgent;
    use std::collections::BTreeMap;

    fn descriptor(name: &str) -> AgentDescriptor {
        AgentDescriptor {
            name: name.to_string(),
            description: format!("{} agent", name),
            supported_tasks: vec!["test".to_string()],
            input_format: BTreeMap::new(),
            output_format: BTreeMap::new(),
            available_agents: vec![],
        }
    }

    fn mock_agent(name: &str) -> Arc<dyn Agent> {
        let mut agent = MockAgent::new();
        let d = descriptor(name);
        let n = name.to_string();
        agent.expect_capabilities().returning(move || d.clone());
        agent.expect_name().returning(move || n.clone());
        Arc::new(agent)
    }

    #[test]
    fn test_registry_preserves_registration_order() {
        let registry = AgentRegistry::builder()
            .with_agent(mock_agent("text2sql"))
            .with_agent(mock_agent("charts"))
            .with_agent(mock_agent("alpha"))
            .build()
            .unwrap();

        assert_eq!(registry.names(), vec!["text2sql", "charts", "alpha"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.first().unwrap().name(), "text2sql");
        assert_eq!(registry.descriptors()[1].name, "charts");
    }

    #[test]
    fn test_registry_lookup() {
        let registry = AgentRegistry::builder()
            .with_agent(mock_agent("text2sql"))
            .build()
            .unwrap();

        assert!(registry.has_agent("text2sql"));
        assert!(registry.get("text2sql").is_some());
        assert!(registry.get("foo").is_none());
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let result = AgentRegistry::builder()
            .with_agent(mock_agent("text2sql"))
            .with_agent(mock_agent("text2sql"))
            .build();

        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_empty_registry() {
        let registry = AgentRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.first().is_none());
        assert!(registry.names().is_empty());
    }
}
