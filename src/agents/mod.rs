//! Agents and their orchestration.
//!
//! Every agent implements [`Agent`]. Concrete agents are collected into an
//! [`AgentRegistry`] at startup; the [`Orchestrator`] plans over the registry,
//! runs subtasks against its agents and synthesizes one answer.

pub mod orchestrator;
pub mod registry;
pub mod text2sql;

use crate::types::{AgentDescriptor, AgentRequest, AgentResponse, Result};
use async_trait::async_trait;

// Re-export commonly used types
pub use orchestrator::Orchestrator;
pub use registry::{AgentRegistry, AgentRegistryBuilder};
pub use text2sql::Text2SqlAgent;

/// Base trait for all agents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Agent: Send + Sync {
    /// Handle one request.
    ///
    /// Expected failures (bad SQL, model errors) are reported as an
    /// [`AgentResponse`] with `success = false`; `Err` is reserved for
    /// failures of the agent itself.
    async fn process(&self, request: &AgentRequest) -> Result<AgentResponse>;

    /// Describe what this agent does
    fn capabilities(&self) -> AgentDescriptor;

    /// Registry key, taken from the descriptor
    fn name(&self) -> String {
        self.capabilities().name
    }
}
