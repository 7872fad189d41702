//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`PlatformEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.

use chrono::{DateTime, Utc};
use montage_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::topics::EVENT_TOAST;

// ---------------------------------------------------------------------------
// PlatformEvent
// ---------------------------------------------------------------------------

/// Kind of row change carried by a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Visual style of a toast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastVariant {
    #[default]
    Default,
    Destructive,
}

/// A transient notification shown to everyone watching a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub variant: ToastVariant,
}

impl Toast {
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Destructive,
        }
    }
}

/// An event scoped to one project.
///
/// Change events are built with [`PlatformEvent::change`] and carry the
/// affected row as payload; toasts are built with [`PlatformEvent::toast`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// `"<table>.<change>"` for row changes, `"toast"` for notifications.
    pub event_type: String,

    /// Project the event belongs to.
    pub project_id: DbId,

    /// Table of the changed row. `None` for toasts.
    pub table: Option<String>,

    /// Kind of row change. `None` for toasts.
    pub change: Option<ChangeKind>,

    /// Optional id of the user that triggered the event.
    pub actor_user_id: Option<DbId>,

    /// The changed record, or the serialized [`Toast`].
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl PlatformEvent {
    /// A row change on `table` within `project_id`.
    pub fn change(table: impl Into<String>, change: ChangeKind, project_id: DbId) -> Self {
        let table = table.into();
        Self {
            event_type: format!("{table}.{}", change.as_str()),
            project_id,
            table: Some(table),
            change: Some(change),
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// A toast for everyone watching `project_id`.
    pub fn toast(project_id: DbId, toast: &Toast) -> Self {
        Self {
            event_type: EVENT_TOAST.to_string(),
            project_id,
            table: None,
            change: None,
            actor_user_id: None,
            payload: serde_json::to_value(toast).unwrap_or_default(),
            timestamp: Utc::now(),
        }
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Serialize `record` as the payload. Unserializable records leave the
    /// payload empty.
    pub fn with_record<T: Serialize>(self, record: &T) -> Self {
        match serde_json::to_value(record) {
            Ok(value) => self.with_payload(value),
            Err(e) => {
                tracing::warn!(error = %e, event_type = %self.event_type, "Failed to serialize event record");
                self
            }
        }
    }

    /// Decode the toast carried by this event, if it is one.
    pub fn as_toast(&self) -> Option<Toast> {
        if self.event_type != EVENT_TOAST {
            return None;
        }
        serde_json::from_value(self.payload.clone()).ok()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`PlatformEvent`].
///
/// # Usage
///
/// ```rust
/// use montage_events::bus::{EventBus, PlatformEvent, Toast};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlatformEvent::toast(1, &Toast::info("Hello", "world")));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlatformEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: PlatformEvent) {
        // Ignore the SendError; it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Shorthand for publishing a toast.
    pub fn publish_toast(&self, project_id: DbId, toast: &Toast) {
        self.publish(PlatformEvent::toast(project_id, toast));
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
