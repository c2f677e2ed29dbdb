//! LLM-friendly renderings of database schema metadata.

use super::TableSchema;
use crate::types::{AppError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Output format for [`render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchemaFormat {
    /// Aligned plain text, used in prompts
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
    /// Markdown tables
    Markdown,
}

impl SchemaFormat {
    /// Names accepted by [`FromStr`]
    pub const SUPPORTED: [&'static str; 3] = ["text", "json", "markdown"];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaFormat::Text => "text",
            SchemaFormat::Json => "json",
            SchemaFormat::Markdown => "markdown",
        }
    }
}

impl fmt::Display for SchemaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(SchemaFormat::Text),
            "json" => Ok(SchemaFormat::Json),
            "markdown" | "md" => Ok(SchemaFormat::Markdown),
            other => Err(AppError::InvalidInput(format!(
                "Unsupported format type: {} (expected one of: {})",
                other,
                Self::SUPPORTED.join(", ")
            ))),
        }
    }
}

/// Render `tables` in the requested format.
pub fn render(format: SchemaFormat, database_type: &str, tables: &[TableSchema]) -> Result<String> {
    match format {
        SchemaFormat::Text => Ok(render_text(database_type, tables)),
        SchemaFormat::Json => render_json(database_type, tables),
        SchemaFormat::Markdown => Ok(render_markdown(database_type, tables)),
    }
}

fn render_text(database_type: &str, tables: &[TableSchema]) -> String {
    let mut out = format!("Database Schema ({}):\n\n", database_type.to_uppercase());

    for table in tables {
        out.push_str(&format!("Table: {}\n", table.name));
        out.push_str(&"-".repeat(table.name.chars().count() + 7));
        out.push('\n');

        for column in &table.columns {
            let nullable = if column.nullable { "NULL" } else { "NOT NULL" };
            let default = match column.default.as_deref() {
                Some(value) if !value.is_empty() => format!(" DEFAULT {}", value),
                _ => String::new(),
            };
            out.push_str(&format!(
                "  {:<20} {:<15} {}{}\n",
                column.name, column.data_type, nullable, default
            ));
        }

        if !table.foreign_keys.is_empty() {
            out.push_str("\n  Foreign Keys:\n");
            for fk in &table.foreign_keys {
                out.push_str(&format!(
                    "    {} -> {}.{}\n",
                    fk.column, fk.references_table, fk.references_column
                ));
            }
        }

        out.push('\n');
    }

    out
}

#[derive(Serialize)]
struct JsonSchema<'a> {
    database_type: &'a str,
    tables: BTreeMap<&'a str, JsonTable<'a>>,
}

#[derive(Serialize)]
struct JsonTable<'a> {
    columns: &'a [super::ColumnSchema],
    foreign_keys: &'a [super::ForeignKey],
}

fn render_json(database_type: &str, tables: &[TableSchema]) -> Result<String> {
    let document = JsonSchema {
        database_type,
        tables: tables
            .iter()
            .map(|t| {
                (
                    t.name.as_str(),
                    JsonTable {
                        columns: &t.columns,
                        foreign_keys: &t.foreign_keys,
                    },
                )
            })
            .collect(),
    };

    serde_json::to_string_pretty(&document)
        .map_err(|e| AppError::Internal(format!("Failed to serialize schema: {}", e)))
}

fn render_markdown(database_type: &str, tables: &[TableSchema]) -> String {
    let mut out = format!("# Database Schema ({})\n\n", database_type.to_uppercase());

    for table in tables {
        out.push_str(&format!("## Table: `{}`\n\n", table.name));
        out.push_str("| Column | Type | Nullable | Default |\n");
        out.push_str("|--------|------|----------|--------|\n");

        for column in &table.columns {
            out.push_str(&format!(
                "| `{}` | `{}` | {} | {} |\n",
                column.name,
                column.data_type,
                if column.nullable { "YES" } else { "NO" },
                column.default.as_deref().unwrap_or("")
            ));
        }

        if !table.foreign_keys.is_empty() {
            out.push_str("\n**Foreign Keys:**\n\n");
            for fk in &table.foreign_keys {
                out.push_str(&format!(
                    "- `{}` → `{}.{}`\n",
                    fk.column, fk.references_table, fk.references_column
                ));
            }
        }

        out.push_str("\n---\n\n");
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{ColumnSchema, ForeignKey};

    fn sample() -> Vec<TableSchema> {
        vec![
            TableSchema {
                name: "users".to_string(),
                columns: vec![
                    ColumnSchema {
                        name: "id".to_string(),
                        data_type: "INTEGER".to_string(),
                        nullable: false,
                        default: None,
                    },
                    ColumnSchema {
                        name: "name".to_string(),
                        data_type: "TEXT".to_string(),
                        nullable: true,
                        default: Some("'anon'".to_string()),
                    },
                ],
                foreign_keys: vec![],
            },
            TableSchema {
                name: "orders".to_string(),
                columns: vec![ColumnSchema {
                    name: "user_id".to_string(),
                    data_type: "INTEGER".to_string(),
                    nullable: true,
                    default: None,
                }],
                foreign_keys: vec![ForeignKey {
                    column: "user_id".to_string(),
                    references_table: "users".to_string(),
                    references_column: "id".to_string(),
                }],
            },
        ]
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("TEXT".parse::<SchemaFormat>().unwrap(), SchemaFormat::Text);
        assert_eq!("markdown".parse::<SchemaFormat>().unwrap(), SchemaFormat::Markdown);
        assert!(matches!(
            "yaml".parse::<SchemaFormat>(),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_text_layout() {
        let text = render(SchemaFormat::Text, "sqlite", &sample()).unwrap();

        assert!(text.starts_with("Database Schema (SQLITE):\n\nTable: users\n------------\n"));
        assert!(text.contains(&format!("  {:<20} {:<15} NOT NULL\n", "id", "INTEGER")));
        assert!(text.contains("NULL DEFAULT 'anon'\n"));
        assert!(text.contains("\n  Foreign Keys:\n    user_id -> users.id\n"));
    }

    #[test]
    fn test_json_groups_foreign_keys_per_table() {
        let json = render(SchemaFormat::Json, "sqlite", &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["database_type"], "sqlite");
        assert_eq!(value["tables"]["users"]["columns"][1]["default"], "'anon'");
        assert_eq!(value["tables"]["users"]["columns"][0]["nullable"], false);
        assert_eq!(
            value["tables"]["orders"]["foreign_keys"][0]["references_table"],
            "users"
        );
    }

    #[test]
    fn test_markdown_layout() {
        let md = render(SchemaFormat::Markdown, "postgresql", &sample()).unwrap();

        assert!(md.starts_with("# Database Schema (POSTGRESQL)\n\n## Table: `users`\n\n"));
        assert!(md.contains("| `id` | `INTEGER` | NO |  |\n"));
        assert!(md.contains("- `user_id` → `users.id`\n"));
        assert!(md.ends_with("\n---\n\n"));
    }
}
