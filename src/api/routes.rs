use crate::AppState;
use crate::api::handlers::{agents, process, schema};
use axum::{
    Router,
    routing::{get, post},
};

/// Routes mounted under `/api`
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/process", post(process::process_request))
        .route("/agents", get(agents::list_agents))
        .route("/health", get(agents::health_check))
        .route("/stats", get(agents::get_stats))
        .route("/schema", get(schema::get_schema))
}
