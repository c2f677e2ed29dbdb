//! HTTP API Handlers and Routes
//!
//! This module provides the REST API layer, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//! - [`api::docs`](crate::api::docs) - OpenAPI document
//!
//! # API Endpoints
//!
//! - `POST /api/process` - Answer a question through the orchestrator
//! - `GET /api/agents` - List registered agents
//! - `GET /api/health` - Health check endpoint
//! - `GET /api/stats` - Orchestration statistics
//! - `GET /api/schema?format=text|json|markdown` - Formatted database schema
//!
//! # OpenAPI Documentation
//!
//! The document is served at `/api-docs/openapi.json`. When the `swagger-ui`
//! feature is enabled, interactive API documentation is available at
//! `/swagger-ui/`.

/// OpenAPI document.
pub mod docs;
/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::AppState;
use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Complete application router with middleware and state attached
pub fn app(state: AppState) -> Router {
    let router = Router::new().nest("/api", routes::create_router());

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
        )
    };

    #[cfg(not(feature = "swagger-ui"))]
    let router = router.route("/api-docs/openapi.json", axum::routing::get(docs::openapi_json));

    router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
