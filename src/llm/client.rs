//! LLM Client abstractions and provider management
//!
//! This module provides a unified interface for interacting with the supported LLM providers:
//! - **Gemini**: Google Generative Language REST API (always available)
//! - **Ollama**: Local LLM inference (feature `ollama`)
//! - **OpenAI**: OpenAI and compatible endpoints (feature `openai`)

use crate::types::{AppError, Result};
use crate::utils::config::{LlmConfig, LlmProviderKind};
use async_trait::async_trait;
use std::sync::Arc;

/// Per-call generation settings.
///
/// Every field is optional; unset fields fall back to the provider's
/// configured [`ModelParams`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    /// System instruction sent ahead of the prompt
    pub system: Option<String>,
    /// Sampling temperature override
    pub temperature: Option<f32>,
    /// Upper bound on generated tokens
    pub max_output_tokens: Option<u32>,
}

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing application code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_options(prompt, &GenerationOptions::default())
            .await
    }

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.generate_with_options(prompt, &GenerationOptions::new().with_system(system))
            .await
    }

    /// Generate with explicit system message, temperature and token limit
    async fn generate_with_options(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Default sampling parameters applied when a call does not override them.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
    pub timeout_secs: u64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_output_tokens: None,
            timeout_secs: 60,
        }
    }
}

impl ModelParams {
    /// Merge per-call options over these defaults.
    pub fn resolve(&self, options: &GenerationOptions) -> (f32, Option<u32>) {
        (
            options.temperature.unwrap_or(self.temperature),
            options.max_output_tokens.or(self.max_output_tokens),
        )
    }
}

/// Provider enum for runtime selection
///
/// | Provider | Feature | Notes |
/// |----------|---------|-------|
/// | Gemini | always | Default, matches the hosted deployment |
/// | Ollama | `ollama` | Recommended for local development |
/// | OpenAI | `openai` | Any OpenAI-compatible endpoint |
#[derive(Debug, Clone)]
pub enum Provider {
    /// Google Gemini via the Generative Language REST API
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Gemini {
    ///     api_key: "AIza...".to_string(),
    ///     api_base: "https://generativelanguage.googleapis.com/v1beta".to_string(),
    ///     model: "gemini-2.5-flash".to_string(),
    ///     params: ModelParams::default(),
    /// };
    /// ```
    Gemini {
        api_key: String,
        api_base: String,
        model: String,
        params: ModelParams,
    },

    /// Ollama local LLM provider
    Ollama {
        base_url: String,
        model: String,
        params: ModelParams,
    },

    /// OpenAI API provider (including Azure OpenAI and compatible APIs)
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        params: ModelParams,
    },
}

impl Provider {
    /// Build a provider from the `[llm]` configuration section.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let params = ModelParams {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            timeout_secs: config.timeout_secs,
        };

        let api_key = || {
            config.api_key.clone().ok_or_else(|| {
                AppError::Configuration(format!(
                    "llm.api_key is required for the {} provider",
                    config.provider
                ))
            })
        };

        Ok(match config.provider {
            LlmProviderKind::Gemini => Provider::Gemini {
                api_key: api_key()?,
                api_base: config
                    .api_base
                    .clone()
                    .unwrap_or_else(|| super::gemini::DEFAULT_API_BASE.to_string()),
                model: config.model.clone(),
                params,
            },
            LlmProviderKind::Ollama => Provider::Ollama {
                base_url: config
                    .api_base
                    .clone()
                    .unwrap_or_else(|| "http://localhost:11434".to_string()),
                model: config.model.clone(),
                params,
            },
            LlmProviderKind::OpenAI => Provider::OpenAI {
                api_key: api_key()?,
                api_base: config
                    .api_base
                    .clone()
                    .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
                model: config.model.clone(),
                params,
            },
        })
    }

    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider was not compiled in or the HTTP
    /// client cannot be constructed.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            Provider::Gemini {
                api_key,
                api_base,
                model,
                params,
            } => Ok(Box::new(super::gemini::GeminiClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                params.clone(),
            )?)),

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url,
                model,
                params,
            } => Ok(Box::new(super::ollama::OllamaClient::new(
                base_url.clone(),
                model.clone(),
                params.clone(),
            ))),

            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
                params,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                params.clone(),
            ))),

            #[allow(unreachable_patterns)]
            other => Err(AppError::Configuration(format!(
                "{} provider is not available: rebuild with `--features {}`",
                other.name(),
                other.name().to_lowercase()
            ))),
        }
    }

    /// Check if this provider was compiled into the binary
    pub fn is_available(&self) -> bool {
        match self {
            Provider::Gemini { .. } => true,
            Provider::Ollama { .. } => cfg!(feature = "ollama"),
            Provider::OpenAI { .. } => cfg!(feature = "openai"),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Gemini { .. } => "Gemini",
            Provider::Ollama { .. } => "Ollama",
            Provider::OpenAI { .. } => "OpenAI",
        }
    }

    /// Model identifier configured for this provider
    pub fn model(&self) -> &str {
        match self {
            Provider::Gemini { model, .. }
            | Provider::Ollama { model, .. }
            | Provider::OpenAI { model, .. } => model,
        }
    }
}

/// Configuration-based client factory
///
/// Builds the shared LLM client once at startup; agents receive it through
/// their constructors.
pub struct LLMClientFactory {
    default_provider: Provider,
}

impl LLMClientFactory {
    /// Create a new factory with the specified default provider
    pub fn new(default_provider: Provider) -> Self {
        Self { default_provider }
    }

    /// Create a client using the default provider
    pub async fn create_default(&self) -> Result<Arc<dyn LLMClient>> {
        let client = self.default_provider.create_client().await?;
        Ok(Arc::from(client))
    }

    /// Get a reference to the default provider
    pub fn default_provider(&self) -> &Provider {
        &self.default_provider
    }
}
