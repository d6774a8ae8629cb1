/// Live broadcast hub
///
/// Fans mutation events out to every connected session. The hub is a
/// process-local registry keyed by session id; each session owns a
/// bounded channel drained by its SSE stream. Publishing is synchronous
/// and non-blocking: a session whose buffer is full simply misses the
/// event, and a session whose receiver is gone is pruned. Nothing here
/// can fail a request, and there is no replay for late subscribers.
///
/// Handlers publish only after their database transaction has
/// committed, so a broadcast never describes a change that was rolled
/// back.
///
/// # Example
///
/// ```
/// use taskdeck_shared::events::{BroadcastEvent, EventKind, SessionHub};
/// use serde_json::json;
///
/// let hub = SessionHub::new(64);
/// let (session_id, mut rx) = hub.subscribe();
///
/// hub.publish(BroadcastEvent::new(
///     EventKind::TaskCreated,
///     json!({"id": "..."}),
/// ));
///
/// assert!(rx.try_recv().is_ok());
/// hub.unsubscribe(session_id);
/// ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Kinds of broadcast events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TaskCreated,
    TaskUpdated,
    TaskDeleted,
    ProjectCreated,
    ProjectUpdated,
    ProjectDeleted,
    CommentCreated,
    CommentDeleted,
}

impl EventKind {
    /// Event kind as its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TaskCreated => "task_created",
            EventKind::TaskUpdated => "task_updated",
            EventKind::TaskDeleted => "task_deleted",
            EventKind::ProjectCreated => "project_created",
            EventKind::ProjectUpdated => "project_updated",
            EventKind::ProjectDeleted => "project_deleted",
            EventKind::CommentCreated => "comment_created",
            EventKind::CommentDeleted => "comment_deleted",
        }
    }
}

/// One broadcast event, serialized as `{"type": ..., "data": ...}`
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastEvent {
    /// Event kind
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Event payload
    pub data: serde_json::Value,
}

impl BroadcastEvent {
    /// Creates a new event
    pub fn new(kind: EventKind, data: serde_json::Value) -> Self {
        Self { kind, data }
    }
}

struct HubInner {
    sessions: RwLock<HashMap<Uuid, mpsc::Sender<BroadcastEvent>>>,

    /// Per-session buffer size; a session this far behind starts
    /// missing events
    buffer: usize,
}

/// Registry of connected sessions with non-blocking fan-out
///
/// Cheap to clone; all clones share the same registry.
#[derive(Clone)]
pub struct SessionHub {
    inner: Arc<HubInner>,
}

impl SessionHub {
    /// Creates a hub with the given per-session buffer size
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                sessions: RwLock::new(HashMap::new()),
                buffer,
            }),
        }
    }

    /// Registers a new session, returning its id and event receiver
    pub fn subscribe(&self) -> (Uuid, mpsc::Receiver<BroadcastEvent>) {
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        let session_id = Uuid::new_v4();

        self.inner
            .sessions
            .write()
            .expect("sessions lock poisoned")
            .insert(session_id, tx);

        debug!(session_id = %session_id, "Session subscribed");
        (session_id, rx)
    }

    /// Removes a session from the registry
    ///
    /// Idempotent; sessions whose receiver was dropped are also pruned
    /// lazily by `publish`.
    pub fn unsubscribe(&self, session_id: Uuid) {
        let removed = self
            .inner
            .sessions
            .write()
            .expect("sessions lock poisoned")
            .remove(&session_id)
            .is_some();

        if removed {
            debug!(session_id = %session_id, "Session unsubscribed");
        }
    }

    /// Publishes an event to every session, never blocking
    ///
    /// Sessions with a full buffer miss this event; sessions whose
    /// receiver is gone are removed. Returns how many sessions the event
    /// was delivered to.
    pub fn publish(&self, event: BroadcastEvent) -> usize {
        let mut delivered = 0;
        let mut dead: Vec<Uuid> = Vec::new();

        {
            let sessions = self.inner.sessions.read().expect("sessions lock poisoned");

            for (session_id, tx) in sessions.iter() {
                match tx.try_send(event.clone()) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!(
                            session_id = %session_id,
                            kind = event.kind.as_str(),
                            "Session buffer full, dropping event"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        dead.push(*session_id);
                    }
                }
            }
        }

        if !dead.is_empty() {
            let mut sessions = self.inner.sessions.write().expect("sessions lock poisoned");
            for session_id in dead {
                sessions.remove(&session_id);
                debug!(session_id = %session_id, "Pruned disconnected session");
            }
        }

        delivered
    }

    /// Number of currently registered sessions
    pub fn session_count(&self) -> usize {
        self.inner
            .sessions
            .read()
            .expect("sessions lock poisoned")
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_reaches_all_sessions() {
        let hub = SessionHub::new(8);
        let (_, mut rx1) = hub.subscribe();
        let (_, mut rx2) = hub.subscribe();

        let delivered = hub.publish(BroadcastEvent::new(
            EventKind::TaskCreated,
            json!({"id": 1}),
        ));

        assert_eq!(delivered, 2);
        assert_eq!(rx1.recv().await.unwrap().kind, EventKind::TaskCreated);
        assert_eq!(rx2.recv().await.unwrap().kind, EventKind::TaskCreated);
    }

    #[tokio::test]
    async fn test_full_buffer_drops_without_blocking() {
        let hub = SessionHub::new(1);
        let (_, mut rx) = hub.subscribe();

        let first = hub.publish(BroadcastEvent::new(EventKind::TaskCreated, json!({})));
        let second = hub.publish(BroadcastEvent::new(EventKind::TaskUpdated, json!({})));

        assert_eq!(first, 1);
        assert_eq!(second, 0);

        // Only the first event made it into the buffer
        assert_eq!(rx.recv().await.unwrap().kind, EventKind::TaskCreated);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_receiver_is_pruned() {
        let hub = SessionHub::new(8);
        let (_, rx) = hub.subscribe();
        drop(rx);

        assert_eq!(hub.session_count(), 1);
        let delivered = hub.publish(BroadcastEvent::new(EventKind::TaskDeleted, json!({})));

        assert_eq!(delivered, 0);
        assert_eq!(hub.session_count(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let hub = SessionHub::new(8);
        let (session_id, _rx) = hub.subscribe();

        hub.unsubscribe(session_id);
        hub.unsubscribe(session_id);

        assert_eq!(hub.session_count(), 0);
    }

    #[test]
    fn test_event_wire_shape() {
        let event = BroadcastEvent::new(EventKind::ProjectDeleted, json!({"id": 7}));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "project_deleted");
        assert_eq!(json["data"]["id"], 7);
    }

    #[test]
    fn test_kind_strings_match_serde() {
        for kind in [
            EventKind::TaskCreated,
            EventKind::TaskUpdated,
            EventKind::TaskDeleted,
            EventKind::ProjectCreated,
            EventKind::ProjectUpdated,
            EventKind::ProjectDeleted,
            EventKind::CommentCreated,
            EventKind::CommentDeleted,
        ] {
            let serialized = serde_json::to_value(kind).unwrap();
            assert_eq!(serialized, kind.as_str());
        }
    }
}
