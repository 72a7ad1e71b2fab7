use super::{resolve_actor, ApiError, AppState};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct ShadowBanRequest {
    banned: bool,
}

pub(crate) async fn set_shadow_ban(
    State(state): State<AppState>,
    Path(target_user_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ShadowBanRequest>,
) -> Result<StatusCode, ApiError> {
    let actor = resolve_actor(&state, &headers)?;
    state
        .moderation
        .set_shadow_ban(actor.as_ref(), &target_user_id, payload.banned)?;
    Ok(StatusCode::NO_CONTENT)
}
