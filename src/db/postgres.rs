use super::{
    ColumnSchema, ForeignKey, QueryOutput, Row, SqlBackend, TableSchema, returns_rows,
};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row as _, TypeInfo};

/// PostgreSQL through an sqlx connection pool.
pub struct PostgresBackend {
    pool: PgPool,
}

const COLUMNS_SQL: &str = "
    SELECT c.table_name::text,
           c.column_name::text,
           c.data_type::text,
           c.is_nullable::text,
           c.column_default::text
    FROM information_schema.columns c
    JOIN information_schema.tables t
      ON t.table_schema = c.table_schema AND t.table_name = c.table_name
    WHERE c.table_schema = 'public' AND t.table_type = 'BASE TABLE'
    ORDER BY c.table_name, c.ordinal_position";

const FOREIGN_KEYS_SQL: &str = "
    SELECT tc.table_name::text,
           kcu.column_name::text,
           ccu.table_name::text,
           ccu.column_name::text
    FROM information_schema.table_constraints tc
    JOIN information_schema.key_column_usage kcu
      ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema
    JOIN information_schema.constraint_column_usage ccu
      ON ccu.constraint_name = tc.constraint_name AND ccu.table_schema = tc.table_schema
    WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_schema = 'public'
    ORDER BY tc.table_name, kcu.column_name";

impl PostgresBackend {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self { pool })
    }
}

/// Rows fetched over the simple protocol arrive in text format; decode each
/// cell as text and then narrow by the reported column type.
fn row_to_json(row: &PgRow) -> Result<Row> {
    let mut record = Row::new();

    for (i, column) in row.columns().iter().enumerate() {
        let raw: Option<String> = row
            .try_get_unchecked(i)
            .map_err(|e| AppError::Database(e.to_string()))?;

        let value = match raw {
            None => serde_json::Value::Null,
            Some(text) => typed_value(column.type_info().name(), text),
        };
        record.insert(column.name().to_string(), value);
    }

    Ok(record)
}

fn typed_value(type_name: &str, text: String) -> serde_json::Value {
    match type_name {
        "INT2" | "INT4" | "INT8" => text
            .parse::<i64>()
            .map(serde_json::Value::from)
            .unwrap_or(serde_json::Value::String(text)),
        "FLOAT4" | "FLOAT8" | "NUMERIC" => text
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::String(text)),
        "BOOL" => serde_json::Value::Bool(text == "t"),
        "JSON" | "JSONB" => {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        }
        _ => serde_json::Value::String(text),
    }
}

#[async_trait]
impl SqlBackend for PostgresBackend {
    fn database_type(&self) -> &'static str {
        "postgresql"
    }

    async fn execute(&self, sql: &str) -> Result<QueryOutput> {
        if returns_rows(sql) {
            let rows = sqlx::raw_sql(sql)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            let rows = rows.iter().map(row_to_json).collect::<Result<Vec<_>>>()?;
            return Ok(QueryOutput::Rows(rows));
        }

        let result = sqlx::raw_sql(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(QueryOutput::Affected(result.rows_affected()))
    }

    async fn execute_read_only(&self, sql: &str) -> Result<QueryOutput> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        sqlx::raw_sql("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let rows = sqlx::raw_sql(sql)
            .fetch_all(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let rows = rows.iter().map(row_to_json).collect::<Result<Vec<_>>>()?;

        tx.rollback()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(QueryOutput::Rows(rows))
    }

    async fn tables(&self) -> Result<Vec<TableSchema>> {
        let columns: Vec<(String, String, String, String, Option<String>)> =
            sqlx::query_as(COLUMNS_SQL)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::Database(format!("Error getting schema: {}", e)))?;

        let foreign_keys: Vec<(String, String, String, String)> =
            sqlx::query_as(FOREIGN_KEYS_SQL)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::Database(format!("Error getting schema: {}", e)))?;

        let mut tables: Vec<TableSchema> = Vec::new();
        for (table, column, data_type, is_nullable, default) in columns {
            if tables.last().map(|t| t.name != table).unwrap_or(true) {
                tables.push(TableSchema {
                    name: table,
                    columns: Vec::new(),
                    foreign_keys: Vec::new(),
                });
            }
            if let Some(current) = tables.last_mut() {
                current.columns.push(ColumnSchema {
                    name: column,
                    data_type,
                    nullable: is_nullable == "YES",
                    default,
                });
            }
        }

        for (table, column, references_table, references_column) in foreign_keys {
            if let Some(entry) = tables.iter_mut().find(|t| t.name == table) {
                entry.foreign_keys.push(ForeignKey {
                    column,
                    references_table,
                    references_column,
                });
            }
        }

        Ok(tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_value() {
        assert_eq!(typed_value("INT4", "42".to_string()), serde_json::json!(42));
        assert_eq!(typed_value("NUMERIC", "999.99".to_string()), serde_json::json!(999.99));
        assert_eq!(typed_value("BOOL", "t".to_string()), serde_json::json!(true));
        assert_eq!(
            typed_value("TIMESTAMP", "2023-01-15 10:00:00".to_string()),
            serde_json::json!("2023-01-15 10:00:00")
        );
    }
}
