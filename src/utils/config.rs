//! Layered application configuration.
//!
//! [`AppConfig`] is assembled once at startup by [`ConfigLoader`] and passed
//! by value (or behind `Arc`) into the components that need it. Sources, from
//! lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. TOML file (`text2sql.toml` by default, optional)
//! 3. `TEXT2SQL__SECTION__KEY` environment variables
//! 4. Well-known variables (`GOOGLE_API_KEY`, `DATABASE_URL`, `LOG_LEVEL`, ...)
//!
//! A `.env` file in the working directory is loaded before the environment is read.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub database: DatabaseConfig,
    pub orchestrator: OrchestratorConfig,
    pub logging: LoggingConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    #[default]
    Gemini,
    Ollama,
    #[serde(rename = "openai")]
    OpenAI,
}

impl fmt::Display for LlmProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LlmProviderKind::Gemini => "gemini",
            LlmProviderKind::Ollama => "ollama",
            LlmProviderKind::OpenAI => "openai",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProviderKind,

    /// Model name/identifier to use with the provider
    pub model: String,

    /// API key for hosted providers (Gemini, OpenAI)
    pub api_key: Option<String>,

    /// Override for the provider's base URL
    pub api_base: Option<String>,

    /// Default sampling temperature, used by the planning stage
    pub temperature: f32,

    pub max_output_tokens: Option<u32>,

    /// Per-request HTTP timeout
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Gemini,
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            api_base: None,
            temperature: 0.1,
            max_output_tokens: None,
            timeout_secs: 60,
        }
    }
}

// ============= Database Configuration =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL (`sqlite://`, `libsql://`, `postgres://`) or a file path
    pub url: String,

    /// Auth token for remote libsql (Turso) databases
    pub auth_token: Option<String>,

    /// Refuse statements that do not return rows
    pub read_only: bool,

    /// Pool size for server databases
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/text2sql.db".to_string(),
            auth_token: None,
            read_only: false,
            max_connections: 10,
        }
    }
}

// ============= Orchestrator Configuration =============

/// How the execution stage reacts when an agent fails a subtask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record a failed result for the subtask and keep its siblings
    #[default]
    Isolate,
    /// Discard every result of the stage
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub max_concurrent_subtasks: usize,
    pub failure_policy: FailurePolicy,
    pub synthesis_temperature: f32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_subtasks: 4,
            failure_policy: FailurePolicy::Isolate,
            synthesis_temperature: 0.3,
        }
    }
}

// ============= Logging Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    /// Also write logs to this file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write configuration file: {0}")]
    Write(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppConfig {
    /// Overlay the well-known environment variables understood by earlier
    /// deployments. `lookup` is injected so the overlay can be tested without
    /// touching the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GOOGLE_API_KEY") {
            if self.llm.provider == LlmProviderKind::Gemini {
                self.llm.api_key = Some(key);
            }
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            if self.llm.provider == LlmProviderKind::OpenAI {
                self.llm.api_key = Some(key);
            }
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            if self.llm.provider == LlmProviderKind::Gemini {
                self.llm.model = model;
            }
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if let Some(file) = lookup("LOG_FILE") {
            self.logging.file = Some(PathBuf::from(file));
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Validation(format!("PORT is not a valid port: {}", port)))?;
        }
        Ok(())
    }

    /// Validate value ranges that serde cannot express
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("llm.temperature", self.llm.temperature),
            (
                "orchestrator.synthesis_temperature",
                self.orchestrator.synthesis_temperature,
            ),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "{} must be between 0.0 and 2.0, got {}",
                    name, value
                )));
            }
        }

        if self.orchestrator.max_concurrent_subtasks == 0 {
            return Err(ConfigError::Validation(
                "orchestrator.max_concurrent_subtasks must be at least 1".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "llm.timeout_secs must be at least 1".to_string(),
            ));
        }

        if self.database.url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "database.url must not be empty".to_string(),
            ));
        }

        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "llm.model must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Render as TOML, suitable for `init`
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Assembles an [`AppConfig`] from defaults, file and environment.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    require_file: bool,
    env_prefix: String,
    load_dotenv: bool,
    legacy_env: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            path: None,
            require_file: false,
            env_prefix: "TEXT2SQL".to_string(),
            load_dotenv: true,
            legacy_env: true,
        }
    }

    /// Read this TOML file if it exists
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Fail when the file set by [`with_file`](Self::with_file) is missing
    pub fn require_file(mut self, required: bool) -> Self {
        self.require_file = required;
        self
    }

    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Skip `.env` loading and the well-known variable overlay
    pub fn isolated(mut self) -> Self {
        self.load_dotenv = false;
        self.legacy_env = false;
        self
    }

    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        if self.load_dotenv {
            dotenvy::dotenv().ok();
        }

        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = &self.path {
            if self.require_file && !path.exists() {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
            builder = builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: AppConfig = builder.build()?.try_deserialize()?;

        if self.legacy_env {
            config.apply_env_overrides(|key| std::env::var(key).ok())?;
        }

        config.validate()?;

        tracing::debug!(
            file = ?self.path,
            provider = %config.llm.provider,
            model = %config.llm.model,
            "Configuration loaded"
        );

        Ok(config)
    }
}
