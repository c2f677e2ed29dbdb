//! Sample `users` / `orders` tables for demos and local development.

use super::DatabaseService;
use crate::types::Result;

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY,
        name VARCHAR(100),
        email VARCHAR(100),
        age INTEGER
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY,
        user_id INTEGER REFERENCES users(id),
        product_name VARCHAR(100),
        amount DECIMAL(10,2),
        order_date TIMESTAMP
    )",
    "INSERT INTO users (id, name, email, age) VALUES
        (1, 'John Doe', 'john@example.com', 30),
        (2, 'Jane Smith', 'jane@example.com', 25),
        (3, 'Bob Johnson', 'bob@example.com', 35)
    ON CONFLICT (id) DO NOTHING",
    "INSERT INTO orders (id, user_id, product_name, amount, order_date) VALUES
        (1, 1, 'Laptop', 999.99, '2023-01-15 10:00:00'),
        (2, 1, 'Mouse', 29.99, '2023-01-15 10:00:00'),
        (3, 2, 'Monitor', 299.99, '2023-02-01 14:30:00'),
        (4, 3, 'Keyboard', 79.99, '2023-02-15 09:15:00')
    ON CONFLICT (id) DO NOTHING",
];

/// Create and populate the sample tables. Safe to run repeatedly.
///
/// Returns the number of rows inserted by this call.
pub async fn seed_sample_data(db: &DatabaseService) -> Result<u64> {
    let mut inserted = 0;

    for statement in STATEMENTS {
        if let super::QueryOutput::Affected(n) = db.execute_query(statement).await? {
            if statement.trim_start().starts_with("INSERT") {
                inserted += n;
            }
        }
    }

    tracing::info!(inserted, "Sample data seeded");
    Ok(inserted)
}
