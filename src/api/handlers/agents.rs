use crate::{
    AppState,
    agents::Agent,
    types::{AgentInfo, AgentListResponse, HealthResponse, StatsResponse},
};
use axum::{Json, extract::State};

/// List the agents questions can be delegated to
#[utoipa::path(
    get,
    path = "/api/agents",
    responses(
        (status = 200, description = "Registered agents", body = AgentListResponse)
    ),
    tag = "agents"
)]
pub async fn list_agents(State(state): State<AppState>) -> Json<AgentListResponse> {
    let agents = state
        .registry
        .descriptors()
        .iter()
        .map(AgentInfo::from)
        .collect();

    Json(AgentListResponse { agents })
}

/// Liveness check listing every agent, orchestrator included
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut agents = state.registry.names();
    let orchestrator = state.orchestrator.name();
    if !agents.contains(&orchestrator) {
        agents.push(orchestrator);
    }

    Json(HealthResponse {
        status: "healthy".to_string(),
        agents,
    })
}

/// Orchestration statistics
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Request counters and agents", body = StatsResponse)
    ),
    tag = "health"
)]
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.orchestrator.stats())
}
