//! Live feed of book events as server-sent events

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    Stream, StreamExt,
};

use super::AuthenticatedUser;

/// Stream book events as they are dispatched
#[utoipa::path(
    get,
    path = "/api/books/events",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Server-sent event stream of book events", content_type = "text/event-stream"),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn stream_events(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(user = %claims.sub, "Subscribed to book events");

    let stream = BroadcastStream::new(state.services.events.subscribe()).filter_map(|message| match message {
        Ok(event) => match Event::default().event(event.kind()).json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                tracing::warn!(book_id = %event.book_id(), "Failed to encode book event: {}", e);
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "Event subscriber lagged behind, events skipped");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
