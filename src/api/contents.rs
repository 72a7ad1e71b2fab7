use super::{ApiError, ApiResult, AppState};
use crate::database::models::ContentRecord;
use crate::engagement::RegisterContentInput;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
    api_port: u16,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        api_port: state.config.api_port,
    })
}

/// Collaborator hook for the external publishing flow.
pub(crate) async fn register_content(
    State(state): State<AppState>,
    Json(payload): Json<RegisterContentInput>,
) -> ApiResult<ContentRecord> {
    let record = state.engagement.register_content(payload)?;
    Ok(Json(record))
}

/// Collaborator hook for content deletion: cascades edges and comments.
pub(crate) async fn purge_content(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.engagement.purge_content(&content_id)?;
    Ok(StatusCode::NO_CONTENT)
}
