//! Shared fixtures for the integration tests.
//!
//! Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

pub mod mocks;

use std::sync::Arc;
use text2sql::{
    db::{DatabaseService, SqliteBackend, seed_sample_data},
    AppConfig, AppState, LLMClient,
};

/// Fresh in-memory database with the sample users/orders rows.
pub async fn seeded_database() -> Arc<DatabaseService> {
    let backend = SqliteBackend::new_memory()
        .await
        .expect("in-memory database");
    let database = DatabaseService::new(Arc::new(backend));
    seed_sample_data(&database).await.expect("seed sample data");
    Arc::new(database)
}

/// Application state with the standard agent set over a seeded database.
pub async fn test_state(llm: Arc<dyn LLMClient>) -> AppState {
    AppState::new(AppConfig::default(), llm, seeded_database().await).expect("app state")
}
