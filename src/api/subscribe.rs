use super::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use std::convert::Infallible;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};

/// Per-content-id notification stream. Events carry only the change kind;
/// clients re-pull the authoritative aggregate on every event, so a
/// duplicate or dropped notification costs one redundant fetch at worst.
/// A lagged receiver is told to `refresh` rather than being replayed.
pub(crate) async fn subscribe(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    // Reject subscriptions to unknown content before opening a channel.
    state.engagement.get_aggregate(None, &content_id)?;

    let receiver = state.bus.subscribe(&content_id);
    tracing::debug!(content_id, "viewer subscribed");

    let stream = BroadcastStream::new(receiver).map(|item| {
        let data = match item {
            Ok(kind) => kind.as_str(),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "subscriber lagged, requesting full refresh");
                "refresh"
            }
        };
        Ok(Event::default().event("change").data(data))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
