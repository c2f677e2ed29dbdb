use super::{
    ColumnSchema, ForeignKey, QueryOutput, Row, SqlBackend, TableSchema, returns_rows,
};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use libsql::{Builder, Connection, Database, Value};
use std::path::Path;
use tokio::sync::Mutex;

/// SQLite (local file or in-memory) and remote Turso databases through libsql.
///
/// A single connection is kept for the lifetime of the backend so that
/// in-memory databases survive between statements. Read-only statements run
/// with `PRAGMA query_only` switched on for that connection.
pub struct SqliteBackend {
    _db: Database,
    conn: Connection,
    /// Current `query_only` setting, `None` while a switch is in flight.
    query_only: Mutex<Option<bool>>,
}

impl SqliteBackend {
    /// Ephemeral database, lost on drop
    pub async fn new_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open in-memory database: {}", e)))?;
        Self::from_database(db)
    }

    /// Local SQLite file, created if missing
    pub async fn new_local(path: &str) -> Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let db = Builder::new_local(path)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open database {}: {}", path, e)))?;
        Self::from_database(db)
    }

    /// Remote Turso database
    pub async fn new_remote(url: String, auth_token: String) -> Result<Self> {
        let db = Builder::new_remote(url, auth_token)
            .build()
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Turso: {}", e)))?;
        Self::from_database(db)
    }

    fn from_database(db: Database) -> Result<Self> {
        let conn = db
            .connect()
            .map_err(|e| AppError::Database(format!("Failed to get connection: {}", e)))?;
        Ok(Self {
            _db: db,
            conn,
            query_only: Mutex::new(Some(false)),
        })
    }

    /// Run `sql` with the connection's `query_only` flag set to `enabled`.
    async fn run_with_query_only(&self, sql: &str, enabled: bool) -> Result<QueryOutput> {
        let mut current = self.query_only.lock().await;

        if *current != Some(enabled) {
            *current = None;
            let pragma = if enabled {
                "PRAGMA query_only = ON"
            } else {
                "PRAGMA query_only = OFF"
            };
            self.conn
                .execute(pragma, ())
                .await
                .map_err(|e| AppError::Database(format!("Failed to set query_only: {}", e)))?;
            *current = Some(enabled);
        }

        if enabled || returns_rows(sql) {
            return Ok(QueryOutput::Rows(self.query_rows(sql).await?));
        }

        let affected = self
            .conn
            .execute(sql, ())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(QueryOutput::Affected(affected))
    }

    async fn query_rows(&self, sql: &str) -> Result<Vec<Row>> {
        let mut rows = self
            .conn
            .query(sql, ())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let names: Vec<String> = (0..rows.column_count())
            .map(|i| rows.column_name(i).unwrap_or_default().to_string())
            .collect();

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let mut record = Row::new();
            for (i, name) in names.iter().enumerate() {
                let value = row
                    .get_value(i as i32)
                    .map_err(|e| AppError::Database(e.to_string()))?;
                record.insert(name.clone(), to_json(value));
            }
            out.push(record);
        }

        Ok(out)
    }

    async fn table_names(&self) -> Result<Vec<String>> {
        let rows = self
            .query_rows(
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
                 ORDER BY name",
            )
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.get("name").and_then(|v| v.as_str()).map(str::to_string))
            .collect())
    }
}

fn to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(i),
        Value::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s),
        Value::Blob(bytes) => serde_json::Value::String(format!("<{} bytes>", bytes.len())),
    }
}

fn text(row: &Row, key: &str) -> String {
    match row.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[async_trait]
impl SqlBackend for SqliteBackend {
    fn database_type(&self) -> &'static str {
        "sqlite"
    }

    async fn execute(&self, sql: &str) -> Result<QueryOutput> {
        self.run_with_query_only(sql, false).await
    }

    async fn execute_read_only(&self, sql: &str) -> Result<QueryOutput> {
        self.run_with_query_only(sql, true).await
    }

    async fn tables(&self) -> Result<Vec<TableSchema>> {
        let mut tables = Vec::new();

        for name in self.table_names().await? {
            let quoted = quote_ident(&name);

            let columns = self
                .query_rows(&format!("PRAGMA table_info({})", quoted))
                .await?
                .iter()
                .map(|row| ColumnSchema {
                    name: text(row, "name"),
                    data_type: text(row, "type"),
                    nullable: row.get("notnull").and_then(|v| v.as_i64()) == Some(0)
                        && row.get("pk").and_then(|v| v.as_i64()) == Some(0),
                    default: match row.get("dflt_value") {
                        Some(serde_json::Value::Null) | None => None,
                        Some(_) => Some(text(row, "dflt_value")),
                    },
                })
                .collect();

            let foreign_keys = self
                .query_rows(&format!("PRAGMA foreign_key_list({})", quoted))
                .await?
                .iter()
                .map(|row| ForeignKey {
                    column: text(row, "from"),
                    references_table: text(row, "table"),
                    references_column: text(row, "to"),
                })
                .collect();

            tables.push(TableSchema {
                name,
                columns,
                foreign_keys,
            });
        }

        Ok(tables)
    }
}
