use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

// ============= API Request/Response Types =============

/// A natural-language question submitted to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionRequest {
    /// Natural language question to be answered
    #[schema(example = "Show me all users who made purchases in the last month")]
    pub question: String,
}

/// The synthesized answer to a question.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionResponse {
    /// Answer to the question
    #[schema(example = "The following users made purchases in the last month: John Doe, Jane Smith")]
    pub answer: String,
}

/// Public view of a registered agent.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    pub supported_tasks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentListResponse {
    pub agents: Vec<AgentInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub agents: Vec<String>,
}

/// Orchestration statistics for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsResponse {
    pub total_agents: usize,
    pub available_agents: Vec<String>,
    pub orchestration_method: String,
    pub requests_total: u64,
    pub requests_completed: u64,
    pub requests_failed: u64,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SchemaResponse {
    pub format: String,
    pub schema: String,
}

// ============= Agent Types =============

/// Input handed to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRequest {
    pub question: String,
}

impl AgentRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
        }
    }
}

/// Success payload shared by every agent.
///
/// `summary` is the user-facing text; anything agent-specific (the SQL that
/// was run, row counts, ...) goes into `metadata`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentOutput {
    pub summary: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl AgentOutput {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Lifecycle of a single request inside an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Processing,
    Completed,
    Error,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AgentStatus::Processing => "processing",
            AgentStatus::Completed => "completed",
            AgentStatus::Error => "error",
        })
    }
}

/// Outcome of [`Agent::process`](crate::agents::Agent::process).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<AgentOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Final status of this request
    pub status: AgentStatus,
}

impl AgentResponse {
    pub fn success(data: AgentOutput) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            status: AgentStatus::Completed,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            status: AgentStatus::Error,
        }
    }

    /// The `summary` of a successful response
    pub fn summary(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.summary.as_str())
    }
}

/// Static self-description of an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub description: String,
    pub supported_tasks: Vec<String>,
    pub input_format: BTreeMap<String, String>,
    pub output_format: BTreeMap<String, String>,
    /// Agents this one can delegate to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_agents: Vec<String>,
}

impl From<&AgentDescriptor> for AgentInfo {
    fn from(descriptor: &AgentDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            supported_tasks: descriptor.supported_tasks.clone(),
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Database(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::LLM(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Configuration(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        // Response bodies carry a single line; the full error stays in the logs.
        let message = message.lines().next().unwrap_or_default().to_string();

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (AppError::InvalidInput("x".into()), 400),
            (AppError::NotFound("x".into()), 404),
            (AppError::LLM("x".into()), 500),
            (AppError::Database("x".into()), 500),
            (AppError::Configuration("x".into()), 500),
            (AppError::Internal("x".into()), 500),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status().as_u16(), expected);
        }
    }

    #[test]
    fn test_agent_response_constructors() {
        let ok = AgentResponse::success(AgentOutput::new("3 users").with_metadata("sql_query", "SELECT 1"));
        assert!(ok.success);
        assert_eq!(ok.status, AgentStatus::Completed);
        assert_eq!(ok.summary(), Some("3 users"));

        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["data"]["metadata"]["sql_query"], "SELECT 1");
        assert!(json.get("error").is_none());

        let failed = AgentResponse::failure("boom");
        assert!(!failed.success);
        assert_eq!(failed.status, AgentStatus::Error);
        assert!(failed.summary().is_none());
    }

    #[test]
    fn test_error_display_prefix() {
        let err = AppError::Database("connection refused".to_string());
        assert_eq!(err.to_string(), "Database error: connection refused");
    }
}
