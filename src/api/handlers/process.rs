use crate::{
    AppState,
    agents::Agent,
    types::{AgentRequest, AppError, QuestionRequest, QuestionResponse, Result},
};
use axum::{Json, extract::State};

/// Answer a natural-language question
#[utoipa::path(
    post,
    path = "/api/process",
    request_body = QuestionRequest,
    responses(
        (status = 200, description = "Synthesized answer", body = QuestionResponse),
        (status = 400, description = "Blank question or orchestration failure", body = crate::types::ErrorResponse),
        (status = 500, description = "Unexpected error", body = crate::types::ErrorResponse)
    ),
    tag = "chat"
)]
pub async fn process_request(
    State(state): State<AppState>,
    Json(payload): Json<QuestionRequest>,
) -> Result<Json<QuestionResponse>> {
    let question = payload.question.trim();
    if question.is_empty() {
        return Err(AppError::InvalidInput(
            "question must not be empty".to_string(),
        ));
    }

    tracing::info!(question, "Received request");

    let response = state
        .orchestrator
        .process(&AgentRequest::new(question))
        .await?;

    match response.data {
        Some(output) if response.success => Ok(Json(QuestionResponse {
            answer: output.summary,
        })),
        _ => {
            let error = response
                .error
                .unwrap_or_else(|| "Orchestration failed".to_string());
            tracing::error!(error = %error, "Orchestrator returned error");
            Err(AppError::InvalidInput(error))
        }
    }
}
