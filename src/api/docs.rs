use crate::api::handlers::{agents, process, schema};
use crate::types::{
    AgentInfo, AgentListResponse, ErrorResponse, HealthResponse, QuestionRequest,
    QuestionResponse, SchemaResponse, StatsResponse,
};
use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Text2SQL Chatbot API",
        description = "Ask questions about a relational database in natural language"
    ),
    paths(
        process::process_request,
        agents::list_agents,
        agents::health_check,
        agents::get_stats,
        schema::get_schema,
    ),
    components(schemas(
        QuestionRequest,
        QuestionResponse,
        AgentInfo,
        AgentListResponse,
        HealthResponse,
        StatsResponse,
        SchemaResponse,
        ErrorResponse,
    )),
    tags(
        (name = "chat", description = "Question answering"),
        (name = "agents", description = "Registered agents"),
        (name = "health", description = "Health and statistics"),
        (name = "schema", description = "Database schema"),
    )
)]
pub struct ApiDoc;

/// Serve the OpenAPI document
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
