//! Relational database access for the text-to-SQL agent.
//!
//! This module provides:
//! - **[`SqlBackend`]**: the seam between the service and a concrete engine
//! - **SQLite / Turso** via libsql (always built)
//! - **PostgreSQL** via sqlx (feature `postgres`)
//! - **[`DatabaseService`]**: query execution, read-only guard and schema
//!   rendering shared by the agent, the API and the CLI
//!
//! # Example
//!
//! ```rust,ignore
//! use text2sql::db::{DatabaseService, SchemaFormat};
//!
//! let db = DatabaseService::connect(&config.database).await?;
//! println!("{}", db.get_schema(SchemaFormat::Markdown).await?);
//! let rows = db.execute_query("SELECT COUNT(*) AS n FROM users").await?;
//! ```

pub mod schema_formatter;
pub mod seed;
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use schema_formatter::SchemaFormat;
pub use seed::seed_sample_data;
pub use sqlite::SqliteBackend;

use crate::types::{AppError, Result};
use crate::utils::config::DatabaseConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One result row, keyed by column name.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Outcome of a single statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryOutput {
    /// Row-returning statement
    Rows(Vec<Row>),
    /// Statement that modified data or schema
    Affected(u64),
}

impl QueryOutput {
    /// Text form fed back to the language model.
    pub fn render(&self) -> String {
        match self {
            QueryOutput::Rows(rows) => {
                serde_json::to_string(rows).unwrap_or_else(|_| format!("{:?}", rows))
            }
            QueryOutput::Affected(n) => {
                format!("Query executed successfully. Rows affected: {}", n)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    pub references_table: String,
    pub references_column: String,
}

/// Columns and outgoing foreign keys of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnSchema>,
    pub foreign_keys: Vec<ForeignKey>,
}

/// A concrete database engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SqlBackend: Send + Sync {
    /// Short engine name shown in schema headers (`sqlite`, `postgresql`)
    fn database_type(&self) -> &'static str;

    /// Run one statement.
    async fn execute(&self, sql: &str) -> Result<QueryOutput>;

    /// Run one row-returning statement with writes disabled by the engine.
    async fn execute_read_only(&self, sql: &str) -> Result<QueryOutput>;

    /// Introspect user tables, in a stable order.
    async fn tables(&self) -> Result<Vec<TableSchema>>;
}

/// Whether `sql` is expected to produce a result set.
pub fn returns_rows(sql: &str) -> bool {
    let keyword = sql
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("");
    keyword.eq_ignore_ascii_case("SELECT") || keyword.eq_ignore_ascii_case("WITH")
}

/// Whether `sql` holds at most one statement.
///
/// Semicolons inside quotes, quoted identifiers and comments are ignored.
/// A trailing semicolon is allowed.
pub fn is_single_statement(sql: &str) -> bool {
    let mut chars = sql.chars().peekable();
    let mut ended = false;

    while let Some(c) = chars.next() {
        if ended && !c.is_whitespace() {
            return false;
        }
        match c {
            '\'' | '"' => {
                for next in chars.by_ref() {
                    if next == c {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = ' ';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            ';' => ended = true,
            _ => {}
        }
    }

    true
}

/// Which backend a connection URL selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseProvider {
    /// Ephemeral in-memory SQLite
    Memory,
    /// Local SQLite file
    SQLite {
        /// Path to the database file
        path: String,
    },
    /// Remote libsql (Turso)
    Turso {
        /// The database URL (e.g., `libsql://your-db.turso.io`)
        url: String,
        /// Authentication token
        auth_token: String,
    },
    /// PostgreSQL server
    Postgres {
        /// Full `postgres://` connection string
        url: String,
    },
}

impl DatabaseProvider {
    /// Classify a connection URL.
    pub fn from_url(url: &str, auth_token: Option<&str>) -> Result<Self> {
        let url = url.trim();

        if url.is_empty() {
            return Err(AppError::Configuration(
                "database.url must not be empty".to_string(),
            ));
        }

        if matches!(url, ":memory:" | "sqlite::memory:" | "sqlite://:memory:") {
            return Ok(DatabaseProvider::Memory);
        }

        if let Some(path) = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
        {
            return Ok(DatabaseProvider::SQLite {
                path: path.to_string(),
            });
        }

        if url.starts_with("libsql://") || url.starts_with("https://") {
            let auth_token = auth_token.map(str::to_string).ok_or_else(|| {
                AppError::Configuration(format!(
                    "database.auth_token is required for remote database {}",
                    url
                ))
            })?;
            return Ok(DatabaseProvider::Turso {
                url: url.to_string(),
                auth_token,
            });
        }

        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(DatabaseProvider::Postgres {
                url: url.to_string(),
            });
        }

        if let Some(path) = url.strip_prefix("file:") {
            return Ok(DatabaseProvider::SQLite {
                path: path.to_string(),
            });
        }

        if !url.contains("://") {
            return Ok(DatabaseProvider::SQLite {
                path: url.to_string(),
            });
        }

        Err(AppError::Configuration(format!(
            "Unsupported database URL: {}",
            url
        )))
    }

    /// Open a backend for this provider
    pub async fn create_backend(&self, config: &DatabaseConfig) -> Result<Arc<dyn SqlBackend>> {
        match self {
            DatabaseProvider::Memory => Ok(Arc::new(SqliteBackend::new_memory().await?)),
            DatabaseProvider::SQLite { path } => {
                Ok(Arc::new(SqliteBackend::new_local(path).await?))
            }
            DatabaseProvider::Turso { url, auth_token } => Ok(Arc::new(
                SqliteBackend::new_remote(url.clone(), auth_token.clone()).await?,
            )),
            #[cfg(feature = "postgres")]
            DatabaseProvider::Postgres { url } => Ok(Arc::new(
                postgres::PostgresBackend::connect(url, config.max_connections).await?,
            )),
            #[cfg(not(feature = "postgres"))]
            DatabaseProvider::Postgres { .. } => {
                let _ = config;
                Err(AppError::Configuration(
                    "PostgreSQL support is not available: rebuild with `--features postgres`"
                        .to_string(),
                ))
            }
        }
    }
}

/// Query execution and schema access over a [`SqlBackend`].
#[derive(Clone)]
pub struct DatabaseService {
    backend: Arc<dyn SqlBackend>,
    read_only: bool,
}

impl DatabaseService {
    pub fn new(backend: Arc<dyn SqlBackend>) -> Self {
        Self {
            backend,
            read_only: false,
        }
    }

    /// Refuse writes: statements run with the engine in read-only mode
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Open the database described by `[database]`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let provider = DatabaseProvider::from_url(&config.url, config.auth_token.as_deref())?;
        let backend = provider.create_backend(config).await?;

        tracing::info!(
            database_type = backend.database_type(),
            read_only = config.read_only,
            "Database connected"
        );

        Ok(Self::new(backend).with_read_only(config.read_only))
    }

    pub fn database_type(&self) -> &'static str {
        self.backend.database_type()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Execute one SQL statement.
    pub async fn execute_query(&self, sql: &str) -> Result<QueryOutput> {
        let sql = sql.trim();
        if sql.is_empty() {
            return Err(AppError::InvalidInput("Empty SQL statement".to_string()));
        }

        if !self.read_only {
            tracing::debug!(sql, "Executing query");
            return self.backend.execute(sql).await;
        }

        if !returns_rows(sql) {
            return Err(AppError::InvalidInput(
                "Database is read-only: only SELECT queries are allowed".to_string(),
            ));
        }
        if !is_single_statement(sql) {
            return Err(AppError::InvalidInput(
                "Database is read-only: only a single statement is allowed".to_string(),
            ));
        }

        tracing::debug!(sql, "Executing read-only query");
        self.backend.execute_read_only(sql).await
    }

    /// Raw table metadata.
    pub async fn tables(&self) -> Result<Vec<TableSchema>> {
        self.backend.tables().await
    }

    /// Schema rendered for prompts or display.
    pub async fn get_schema(&self, format: SchemaFormat) -> Result<String> {
        let tables = self.backend.tables().await?;
        schema_formatter::render(format, self.database_type(), &tables)
    }
}
