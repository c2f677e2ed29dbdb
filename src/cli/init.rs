//! Project initialization command
//!
//! Writes a `text2sql.toml` with the chosen provider, address and database,
//! plus a `.env.example` listing the secrets the provider needs.

use super::output::Output;
use super::DEFAULT_CONFIG_FILE;
use crate::utils::config::{AppConfig, LlmProviderKind};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for the init command
pub struct InitConfig {
    /// Directory to initialize
    pub path: PathBuf,
    /// Overwrite existing files
    pub force: bool,
    /// LLM provider to configure
    pub provider: LlmProviderKind,
    /// Host address for the server
    pub host: String,
    /// Port for the server
    pub port: u16,
    /// Database connection URL
    pub database_url: String,
}

/// Result of the init operation
#[derive(Debug, PartialEq)]
pub enum InitResult {
    /// Files were written
    Success,
    /// A config file exists and `--force` was not given
    AlreadyExists,
    /// Writing failed
    Error(String),
}

/// Run the init command
pub fn run(config: InitConfig, output: &Output) -> InitResult {
    let base_path = &config.path;
    let config_path = base_path.join(DEFAULT_CONFIG_FILE);

    if config_path.exists() && !config.force {
        output.warning(&format!("{} already exists", config_path.display()));
        output.hint("Use --force to overwrite existing files");
        return InitResult::AlreadyExists;
    }

    output.banner();
    output.header("Initializing text2sql-server");

    if let Err(e) = fs::create_dir_all(base_path) {
        output.error(&format!("Failed to create directory: {}", e));
        return InitResult::Error(e.to_string());
    }

    let toml_content = match generate_config(&config) {
        Ok(content) => content,
        Err(e) => {
            output.error(&format!("Failed to render configuration: {}", e));
            return InitResult::Error(e);
        }
    };
    if let Err(e) = fs::write(&config_path, toml_content) {
        output.error(&format!("Failed to create {}: {}", DEFAULT_CONFIG_FILE, e));
        return InitResult::Error(e.to_string());
    }
    output.wrote(DEFAULT_CONFIG_FILE, "configuration");

    let env_example_path = base_path.join(".env.example");
    match write_unless_exists(&env_example_path, &generate_env_example(config.provider), config.force) {
        Ok(true) => output.wrote(".env.example", "environment template"),
        Ok(false) => output.kept(".env.example", "already exists"),
        Err(e) => {
            output.error(&format!("Failed to create .env.example: {}", e));
            return InitResult::Error(e.to_string());
        }
    }

    output.success("Configuration written");

    output.header("Next Steps");
    match config.provider {
        LlmProviderKind::Gemini => {
            output.info("Set your Gemini key:");
            output.command("export GOOGLE_API_KEY=...");
        }
        LlmProviderKind::OpenAI => {
            output.info("Set your OpenAI key:");
            output.command("export OPENAI_API_KEY=...");
        }
        LlmProviderKind::Ollama => {
            output.info("Start Ollama (if not running):");
            output.command("ollama serve");
        }
    }
    output.info("Create the sample tables and start the server:");
    output.command("text2sql-server seed");
    output.command("text2sql-server");

    output.hint(&format!(
        "Server will be available at http://{}:{}",
        config.host, config.port
    ));

    InitResult::Success
}

fn write_unless_exists(path: &Path, content: &str, force: bool) -> std::io::Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    fs::write(path, content)?;
    Ok(true)
}

fn generate_config(init: &InitConfig) -> Result<String, String> {
    let mut config = AppConfig::default();
    config.server.host = init.host.clone();
    config.server.port = init.port;
    config.database.url = init.database_url.clone();
    config.llm.provider = init.provider;
    config.llm.model = default_model(init.provider).to_string();

    let body = config.to_toml_string().map_err(|e| e.to_string())?;
    Ok(format!(
        "# text2sql-server configuration\n\
         # Secrets are read from the environment (see .env.example).\n\
         # Any key can be overridden with TEXT2SQL__SECTION__KEY.\n\n{}",
        body
    ))
}

fn default_model(provider: LlmProviderKind) -> &'static str {
    match provider {
        LlmProviderKind::Gemini => "gemini-2.5-flash",
        LlmProviderKind::Ollama => "llama3.2",
        LlmProviderKind::OpenAI => "gpt-4o-mini",
    }
}

fn generate_env_example(provider: LlmProviderKind) -> String {
    let key_line = match provider {
        LlmProviderKind::Gemini => "GOOGLE_API_KEY=\n",
        LlmProviderKind::OpenAI => "OPENAI_API_KEY=\n",
        LlmProviderKind::Ollama => "# Ollama needs no API key\n",
    };
    format!(
        "# LLM credentials\n{}\n\
         # Optional overrides\n\
         # DATABASE_URL=sqlite://./data/text2sql.db\n\
         # LOG_LEVEL=debug\n\
         # PORT=8000\n",
        key_line
    )
}
