use crate::{
    AppState,
    db::SchemaFormat,
    types::{Result, SchemaResponse},
};
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SchemaQuery {
    /// `text` (default), `json` or `markdown`
    pub format: Option<String>,
}

/// Render the database schema
#[utoipa::path(
    get,
    path = "/api/schema",
    params(SchemaQuery),
    responses(
        (status = 200, description = "Formatted schema", body = SchemaResponse),
        (status = 400, description = "Unsupported format", body = crate::types::ErrorResponse),
        (status = 500, description = "Database error", body = crate::types::ErrorResponse)
    ),
    tag = "schema"
)]
pub async fn get_schema(
    State(state): State<AppState>,
    Query(query): Query<SchemaQuery>,
) -> Result<Json<SchemaResponse>> {
    let format = match query.format.as_deref() {
        Some(name) => name.parse::<SchemaFormat>()?,
        None => SchemaFormat::default(),
    };

    let schema = state.database.get_schema(format).await?;

    Ok(Json(SchemaResponse {
        format: format.to_string(),
        schema,
    }))
}
