//! # text2sql-server
//!
//! A natural-language-to-SQL chatbot backend. Questions go to an orchestrator
//! that plans subtasks with a language model, delegates them to specialized
//! agents (the text-to-SQL agent generates and runs SQL against the configured
//! database) and synthesizes a single answer.
//!
//! ## Overview
//!
//! The crate can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `text2sql-server` binary
//! 2. **As a library** - Import components into your own Rust project
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use text2sql::{AppState, ConfigLoader, agents::Agent, types::AgentRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new().with_file("text2sql.toml").load()?;
//!     let state = AppState::from_config(config).await?;
//!
//!     let response = state
//!         .orchestrator
//!         .process(&AgentRequest::new("How many users are there?"))
//!         .await?;
//!     println!("{:?}", response.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference |
//! | `openai` | OpenAI API support |
//! | `postgres` | PostgreSQL database via sqlx |
//! | `swagger-ui` | Interactive API documentation |
//!
//! Gemini and SQLite/Turso (libsql) are always available.
//!
//! ## Modules
//!
//! - [`agents`] - Agent trait, registry, text-to-SQL agent and orchestrator
//! - [`api`] - REST API handlers and routes
//! - [`db`] - Database backends and schema formatting
//! - [`llm`] - LLM client implementations
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration and logging

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Agents, their registry and the orchestrator.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// Relational database access.
pub mod db;
/// LLM provider clients and abstractions.
pub mod llm;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration and logging utilities.
pub mod utils;

// Re-export commonly used types
pub use agents::{Agent, AgentRegistry, AgentRegistryBuilder, Orchestrator, Text2SqlAgent};
pub use db::DatabaseService;
pub use llm::{LLMClient, LLMClientFactory, Provider};
pub use types::{AppError, Result};
pub use utils::config::{AppConfig, ConfigLoader};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Immutable configuration loaded at startup
    pub config: Arc<AppConfig>,
    /// Entry point for every question
    pub orchestrator: Arc<Orchestrator>,
    /// Agents the orchestrator delegates to
    pub registry: Arc<AgentRegistry>,
    /// Database shared by the text-to-SQL agent and the schema endpoint
    pub database: Arc<DatabaseService>,
}

impl AppState {
    /// Wire the standard agent set around an existing LLM client and database.
    pub fn new(
        config: AppConfig,
        llm: Arc<dyn LLMClient>,
        database: Arc<DatabaseService>,
    ) -> Result<Self> {
        let registry = Arc::new(
            AgentRegistry::builder()
                .with_agent(Arc::new(Text2SqlAgent::new(
                    Arc::clone(&llm),
                    Arc::clone(&database),
                )))
                .build()?,
        );

        Ok(Self::with_registry(config, llm, database, registry))
    }

    /// Use a caller-supplied agent registry.
    pub fn with_registry(
        config: AppConfig,
        llm: Arc<dyn LLMClient>,
        database: Arc<DatabaseService>,
        registry: Arc<AgentRegistry>,
    ) -> Self {
        let orchestrator = Arc::new(Orchestrator::new(
            llm,
            Arc::clone(&registry),
            config.orchestrator.clone(),
        ));

        Self {
            config: Arc::new(config),
            orchestrator,
            registry,
            database,
        }
    }

    /// Connect the database, build the LLM client and wire the agents.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let database = Arc::new(DatabaseService::connect(&config.database).await?);

        let provider = Provider::from_config(&config.llm)?;
        tracing::info!(provider = provider.name(), model = provider.model(), "LLM provider selected");
        let llm = LLMClientFactory::new(provider).create_default().await?;

        Self::new(config, llm, database)
    }
}
