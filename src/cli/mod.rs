//! CLI module for text2sql-server
//!
//! Provides command-line interface parsing for the text2sql-server binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod init;
pub mod output;

use crate::utils::config::LlmProviderKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "text2sql.toml";

/// text2sql-server - ask your database questions in plain language
#[derive(Parser, Debug)]
#[command(
    name = "text2sql-server",
    version,
    about = "Natural-language-to-SQL chatbot server",
    long_about = "An LLM orchestrator that plans, delegates questions to a text-to-SQL agent\n\
                  and synthesizes answers from the query results.\n\n\
                  Run without arguments to start the server, or use 'init' to write a configuration file.",
    after_help = "EXAMPLES:\n    \
                  text2sql-server init                       # Write text2sql.toml\n    \
                  text2sql-server seed                       # Create sample users/orders tables\n    \
                  text2sql-server ask \"How many users?\"      # One-off question\n    \
                  text2sql-server                            # Start the server\n    \
                  text2sql-server --config prod.toml serve   # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file [default: text2sql.toml, optional]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve {
        /// Override `server.host`
        #[arg(long)]
        host: Option<String>,

        /// Override `server.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Write a configuration file with default settings
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// LLM provider to configure (gemini, ollama or openai)
        #[arg(long, default_value = "gemini", value_parser = parse_provider)]
        provider: LlmProviderKind,

        /// Host address for the server
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port for the server
        #[arg(long, default_value = "8000")]
        port: u16,

        /// Database connection URL
        #[arg(long, default_value = "sqlite://./data/text2sql.db")]
        database_url: String,
    },

    /// Answer one question and exit
    Ask {
        /// The question, in natural language
        question: String,

        /// Also print the plan and per-subtask results
        #[arg(long)]
        show_plan: bool,
    },

    /// Print the database schema
    Schema {
        /// Output format: text, json or markdown
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Create and populate the sample users/orders tables
    Seed,
}

fn parse_provider(value: &str) -> Result<LlmProviderKind, String> {
    match value.to_lowercase().as_str() {
        "gemini" => Ok(LlmProviderKind::Gemini),
        "ollama" => Ok(LlmProviderKind::Ollama),
        "openai" => Ok(LlmProviderKind::OpenAI),
        other => Err(format!(
            "unknown provider '{}' (expected gemini, ollama or openai)",
            other
        )),
    }
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Config file to read, and whether it must exist
    pub fn config_source(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_command_means_serve() {
        let cli = Cli::try_parse_from(["text2sql-server"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(
            cli.config_source(),
            (PathBuf::from(DEFAULT_CONFIG_FILE), false)
        );
    }

    #[test]
    fn test_explicit_config_is_required() {
        let cli = Cli::try_parse_from(["text2sql-server", "--config", "prod.toml", "seed"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Seed)));
        assert_eq!(cli.config_source(), (PathBuf::from("prod.toml"), true));
    }

    #[test]
    fn test_ask_command() {
        let cli =
            Cli::try_parse_from(["text2sql-server", "ask", "How many users?", "--show-plan"]).unwrap();
        match cli.command {
            Some(Commands::Ask {
                question,
                show_plan,
            }) => {
                assert_eq!(question, "How many users?");
                assert!(show_plan);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_init_provider_parsing() {
        let cli = Cli::try_parse_from(["text2sql-server", "init", "--provider", "Ollama"]).unwrap();
        match cli.command {
            Some(Commands::Init { provider, port, .. }) => {
                assert_eq!(provider, LlmProviderKind::Ollama);
                assert_eq!(port, 8000);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["text2sql-server", "init", "--provider", "claude"]).is_err());
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from(["text2sql-server", "serve", "--port", "9000"]).unwrap();
        match cli.command {
            Some(Commands::Serve { host, port }) => {
                assert!(host.is_none());
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
