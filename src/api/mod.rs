mod comments;
mod contents;
mod engagement;
mod moderation;
mod subscribe;

use crate::comments::CommentService;
use crate::config::PulseboardConfig;
use crate::database::Database;
use crate::engagement::EngagementService;
use crate::error::EngineError;
use crate::fanout::ChangeBus;
use crate::identity::{Actor, SharedIdentityProvider};
use crate::moderation::ModerationService;
use anyhow::{Context, Result};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: PulseboardConfig,
    pub database: Database,
    pub identity: SharedIdentityProvider,
    pub bus: ChangeBus,
    pub engagement: EngagementService,
    pub comments: CommentService,
    pub moderation: ModerationService,
}

impl AppState {
    pub fn new(
        config: PulseboardConfig,
        database: Database,
        identity: SharedIdentityProvider,
    ) -> Self {
        let bus = ChangeBus::new();
        let engagement = EngagementService::new(database.clone(), bus.clone());
        let comments = CommentService::new(database.clone(), identity.clone(), bus.clone());
        let moderation = ModerationService::new(database.clone(), identity.clone(), bus.clone());
        Self {
            config,
            database,
            identity,
            bus,
            engagement,
            comments,
            moderation,
        }
    }
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError(err)
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError(EngineError::from_anyhow(err))
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            EngineError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "please log in".to_string())
            }
            EngineError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            EngineError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            EngineError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg),
            EngineError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            EngineError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            EngineError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

/// Resolves the caller from the `x-user-id` header through the identity
/// provider. Fresh lookup on every request, never cached, so a shadow ban
/// or role change takes effect immediately.
pub(crate) fn resolve_actor(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Option<Actor>, ApiError> {
    let Some(raw) = headers.get("x-user-id") else {
        return Ok(None);
    };
    let Ok(user_id) = raw.to_str() else {
        return Ok(None);
    };
    let actor = state
        .identity
        .actor(user_id)
        .map_err(|err| EngineError::Unavailable(format!("identity provider: {err}")))?;
    Ok(actor)
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(contents::health))
        .route("/contents", post(contents::register_content))
        .route("/contents/:id", delete(contents::purge_content))
        .route("/contents/:id/aggregate", get(engagement::get_aggregate))
        .route("/contents/:id/like", post(engagement::toggle_like))
        .route("/contents/:id/views", post(engagement::record_view))
        .route(
            "/contents/:id/comments",
            get(comments::list_comments).post(comments::submit_comment),
        )
        .route("/contents/:id/subscribe", get(subscribe::subscribe))
        .route("/comments/:id", delete(comments::delete_comment))
        .route("/comments/:id/hide", post(comments::hide_comment))
        .route("/users/:id/shadow-ban", post(moderation::set_shadow_ban))
        .layer(cors)
        .with_state(state)
}

/// Tries to bind to the given port, or finds the next available port.
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        let port = start_port + offset;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "could not find available port in range {}-{}",
        start_port,
        start_port + MAX_PORT_ATTEMPTS - 1
    )
}

pub async fn serve_http(state: AppState) -> Result<()> {
    let api_port = state.config.api_port;
    let (listener, port) = find_available_port(api_port).await?;
    if port != api_port {
        tracing::warn!(requested = api_port, bound = port, "requested port was busy");
    }
    tracing::info!(port, "engagement API listening");

    axum::serve(listener, router(state))
        .await
        .context("http server terminated")?;
    Ok(())
}
