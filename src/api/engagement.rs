use super::{resolve_actor, ApiResult, AppState};
use crate::engagement::{Aggregate, LikeOutcome};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

pub(crate) async fn get_aggregate(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<Aggregate> {
    let viewer = resolve_actor(&state, &headers)?;
    let aggregate = state.engagement.get_aggregate(viewer.as_ref(), &content_id)?;
    Ok(Json(aggregate))
}

pub(crate) async fn toggle_like(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<LikeOutcome> {
    let actor = resolve_actor(&state, &headers)?;
    let outcome = state.engagement.toggle_like(actor.as_ref(), &content_id)?;
    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub(crate) struct ViewsResponse {
    views_count: i64,
}

pub(crate) async fn record_view(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> ApiResult<ViewsResponse> {
    let views_count = state.engagement.record_view(&content_id)?;
    Ok(Json(ViewsResponse { views_count }))
}
