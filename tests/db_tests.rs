//! Database service tests over libsql (in-memory and file-backed).

use std::sync::Arc;
use tempfile::TempDir;
use text2sql::{
    db::{DatabaseProvider, DatabaseService, QueryOutput, SchemaFormat, SqliteBackend, seed_sample_data},
    types::AppError,
    utils::config::DatabaseConfig,
};

async fn memory_service() -> DatabaseService {
    DatabaseService::new(Arc::new(SqliteBackend::new_memory().await.unwrap()))
}

fn rows(output: QueryOutput) -> Vec<text2sql::db::Row> {
    match output {
        QueryOutput::Rows(rows) => rows,
        other => panic!("expected rows, got {:?}", other),
    }
}

#[tokio::test]
async fn test_seed_creates_sample_tables() {
    let db = memory_service().await;
    assert_eq!(seed_sample_data(&db).await.unwrap(), 7);

    let tables = db.tables().await.unwrap();
    let names: Vec<_> = tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["orders", "users"]);

    let orders = &tables[0];
    assert_eq!(orders.foreign_keys.len(), 1);
    assert_eq!(orders.foreign_keys[0].column, "user_id");
    assert_eq!(orders.foreign_keys[0].references_table, "users");
    assert_eq!(orders.foreign_keys[0].references_column, "id");

    let users = &tables[1];
    let id = users.columns.iter().find(|c| c.name == "id").unwrap();
    assert!(!id.nullable);
    let email = users.columns.iter().find(|c| c.name == "email").unwrap();
    assert!(email.nullable);
    assert_eq!(email.data_type, "VARCHAR(100)");
}

#[tokio::test]
async fn test_select_returns_typed_rows() {
    let db = memory_service().await;
    seed_sample_data(&db).await.unwrap();

    let result = rows(
        db.execute_query(
            "SELECT u.name, SUM(o.amount) AS total \
             FROM users u JOIN orders o ON o.user_id = u.id \
             GROUP BY u.name ORDER BY total DESC",
        )
        .await
        .unwrap(),
    );

    assert_eq!(result.len(), 3);
    assert_eq!(result[0]["name"], "John Doe");
    let total = result[0]["total"].as_f64().unwrap();
    assert!((total - 1029.98).abs() < 0.001);
}

#[tokio::test]
async fn test_cte_counts_as_row_query() {
    let db = memory_service().await;
    seed_sample_data(&db).await.unwrap();

    let result = rows(
        db.execute_query("WITH young AS (SELECT * FROM users WHERE age < 31) SELECT COUNT(*) AS n FROM young")
            .await
            .unwrap(),
    );
    assert_eq!(result[0]["n"], 2);
}

#[tokio::test]
async fn test_write_reports_affected_rows() {
    let db = memory_service().await;
    seed_sample_data(&db).await.unwrap();

    let output = db
        .execute_query("UPDATE orders SET amount = amount * 2 WHERE user_id = 1")
        .await
        .unwrap();
    assert_eq!(output, QueryOutput::Affected(2));
    assert_eq!(output.render(), "Query executed successfully. Rows affected: 2");
}

#[tokio::test]
async fn test_errors_and_guards() {
    let db = memory_service().await;

    assert!(matches!(
        db.execute_query("   ").await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(matches!(
        db.execute_query("SELECT * FROM nowhere").await,
        Err(AppError::Database(_))
    ));

    let read_only = db.with_read_only(true);
    assert!(read_only.is_read_only());
    assert!(matches!(
        read_only.execute_query("CREATE TABLE t (id INTEGER)").await,
        Err(AppError::InvalidInput(_))
    ));
    assert!(read_only.execute_query("SELECT 1").await.is_ok());
}

#[tokio::test]
async fn test_read_only_rejects_cte_prefixed_writes() {
    let db = memory_service().await;
    seed_sample_data(&db).await.unwrap();
    let db = db.with_read_only(true);

    let err = db
        .execute_query("WITH t AS (SELECT 1) DELETE FROM users")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Database(_)));

    let err = db
        .execute_query("WITH t AS (SELECT 1) INSERT INTO users (name, email, age) VALUES ('x', 'x@example.com', 1)")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Database(_)));

    let err = db
        .execute_query("SELECT 1; DROP TABLE orders")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    let count = rows(db.execute_query("SELECT COUNT(*) AS n FROM users").await.unwrap());
    assert_eq!(count[0]["n"], 3);
    let count = rows(db.execute_query("SELECT COUNT(*) AS n FROM orders").await.unwrap());
    assert!(count[0]["n"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_schema_formats() {
    let db = memory_service().await;
    seed_sample_data(&db).await.unwrap();

    let text = db.get_schema(SchemaFormat::Text).await.unwrap();
    assert!(text.starts_with("Database Schema (SQLITE):\n\nTable: orders\n"));

    let markdown = db.get_schema(SchemaFormat::Markdown).await.unwrap();
    assert!(markdown.contains("| `email` | `VARCHAR(100)` | YES |  |"));
    assert!(markdown.contains("**Foreign Keys:**"));

    let json: serde_json::Value =
        serde_json::from_str(&db.get_schema(SchemaFormat::Json).await.unwrap()).unwrap();
    assert_eq!(json["tables"]["users"]["columns"][0]["name"], "id");
    assert_eq!(json["tables"]["users"]["columns"][0]["type"], "INTEGER");
}

#[tokio::test]
async fn test_empty_database_schema() {
    let db = memory_service().await;
    let text = db.get_schema(SchemaFormat::Text).await.unwrap();
    assert_eq!(text.trim_end(), "Database Schema (SQLITE):");
}

#[tokio::test]
async fn test_connect_local_file_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("app.db");
    let config = DatabaseConfig {
        url: format!("sqlite://{}", path.display()),
        ..DatabaseConfig::default()
    };

    {
        let db = DatabaseService::connect(&config).await.unwrap();
        assert_eq!(db.database_type(), "sqlite");
        seed_sample_data(&db).await.unwrap();
    }
    assert!(path.exists());

    let reopened = DatabaseService::connect(&config).await.unwrap();
    assert_eq!(seed_sample_data(&reopened).await.unwrap(), 0);
    let count = rows(reopened.execute_query("SELECT COUNT(*) AS n FROM orders").await.unwrap());
    assert_eq!(count[0]["n"], 4);
}

#[test]
fn test_provider_from_url() {
    assert!(matches!(
        DatabaseProvider::from_url(":memory:", None).unwrap(),
        DatabaseProvider::Memory
    ));
    assert!(matches!(
        DatabaseProvider::from_url("libsql://db.turso.io", Some("token")).unwrap(),
        DatabaseProvider::Turso { .. }
    ));
    assert!(DatabaseProvider::from_url("libsql://db.turso.io", None).is_err());
    assert!(DatabaseProvider::from_url("mysql://localhost/db", None).is_err());
}
