/// Live event stream endpoint (SSE)
///
/// Subscribes the caller to the broadcast hub and relays every mutation
/// event as a Server-Sent Event until the client disconnects. There is
/// no backlog: events published before the subscription are gone, and a
/// session that falls more than a buffer's worth behind misses events.
///
/// # Endpoint
///
/// `GET /v1/events/stream`
///
/// # SSE Event Format
///
/// ```text
/// event: task_updated
/// data: {"type":"task_updated","data":{"id":"...","title":"..."}}
/// ```
///
/// # Example
///
/// ```bash
/// curl -N -H "Authorization: Bearer <token>" \
///   "http://localhost:8080/v1/events/stream"
/// ```

use crate::app::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures::stream::Stream;
use taskdeck_shared::auth::middleware::AuthContext;
use taskdeck_shared::events::SessionHub;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt as _;
use uuid::Uuid;

/// Unregisters the session when the response stream is dropped
struct SessionGuard {
    hub: SessionHub,
    session_id: Uuid,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.session_id);
        tracing::info!(session_id = %self.session_id, "Live event session closed");
    }
}

/// Streams live mutation events to the authenticated session
///
/// The session is registered with the hub for the lifetime of the
/// response stream and unregistered when the client disconnects.
pub async fn stream_events(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (session_id, rx) = state.hub.subscribe();

    tracing::info!(
        user_id = %auth.user_id,
        session_id = %session_id,
        sessions = state.hub.session_count(),
        "Live event session opened"
    );

    let guard = SessionGuard {
        hub: state.hub.clone(),
        session_id,
    };

    let stream = ReceiverStream::new(rx).map(move |event| {
        let _keep_registered = &guard;

        let sse_event = Event::default()
            .event(event.kind.as_str())
            .json_data(&event)
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to serialize broadcast event");
                Event::default().event(event.kind.as_str())
            });

        Ok(sse_event)
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(25)))
}
