use super::{resolve_actor, ApiError, ApiResult, AppState};
use crate::comments::{CommentThread, CommentView, SubmitCommentInput};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct CommentListResponse {
    comments: Vec<CommentThread>,
}

pub(crate) async fn list_comments(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> ApiResult<CommentListResponse> {
    let comments = state.comments.list_comments(&content_id)?;
    Ok(Json(CommentListResponse { comments }))
}

pub(crate) async fn submit_comment(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<SubmitCommentInput>,
) -> ApiResult<CommentView> {
    let actor = resolve_actor(&state, &headers)?;
    let comment = state
        .comments
        .submit_comment(actor.as_ref(), &content_id, payload)?;
    Ok(Json(comment))
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteCommentResponse {
    removed: i64,
}

pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<DeleteCommentResponse> {
    let actor = resolve_actor(&state, &headers)?;
    let removed = state.comments.delete_comment(actor.as_ref(), &comment_id)?;
    Ok(Json(DeleteCommentResponse { removed }))
}

pub(crate) async fn hide_comment(
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let actor = resolve_actor(&state, &headers)?;
    state.comments.hide_comment(actor.as_ref(), &comment_id)?;
    Ok(StatusCode::NO_CONTENT)
}
