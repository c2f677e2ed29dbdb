//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for interacting with the language
//! model behind the orchestrator and the text-to-SQL agent. Provider-specific
//! implementations sit behind the [`LLMClient`] trait so agents never depend on
//! a concrete backend.
//!
//! # Supported Providers
//!
//! - Gemini (always built) - Google Generative Language REST API
//! - `ollama` - Local Ollama server
//! - `openai` - OpenAI API and compatible endpoints
//!
//! # Example
//!
//! ```ignore
//! use text2sql::llm::{GenerationOptions, LLMClientFactory, Provider};
//!
//! let factory = LLMClientFactory::new(Provider::from_config(&config.llm)?);
//! let client = factory.create_default().await?;
//!
//! let sql = client
//!     .generate_with_options(
//!         "How many users are there?",
//!         &GenerationOptions::new().with_system("Reply with SQL only").with_temperature(0.3),
//!     )
//!     .await?;
//! ```

/// Core LLM client trait, generation options and provider selection.
pub mod client;
/// Google Gemini REST client.
pub mod gemini;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{GenerationOptions, LLMClient, LLMClientFactory, ModelParams, Provider};
