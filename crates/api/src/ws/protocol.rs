//! JSON messages exchanged over `/api/v1/ws`.

use montage_core::types::DbId;
use montage_events::{ChangeKind, PlatformEvent, ToastVariant};
use serde::{Deserialize, Serialize};

/// Messages a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ClientMessage {
    Subscribe { table: String, project_id: DbId },
    Unsubscribe { table: String, project_id: DbId },
}

/// Messages the server pushes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// A row in a subscribed table changed. Clients refetch on receipt.
    Change {
        table: String,
        event: ChangeKind,
        project_id: DbId,
        record: serde_json::Value,
    },
    Toast {
        project_id: DbId,
        title: String,
        description: String,
        variant: ToastVariant,
    },
    Subscribed {
        table: String,
        project_id: DbId,
    },
    Unsubscribed {
        table: String,
        project_id: DbId,
    },
    Error {
        message: String,
    },
}

impl ServerMessage {
    /// Translate a bus event into its wire form.
    ///
    /// Returns `None` for events that are neither row changes nor toasts.
    pub fn from_event(event: &PlatformEvent) -> Option<Self> {
        if let (Some(table), Some(change)) = (&event.table, event.change) {
            return Some(Self::Change {
                table: table.clone(),
                event: change,
                project_id: event.project_id,
                record: event.payload.clone(),
            });
        }
        event.as_toast().map(|toast| Self::Toast {
            project_id: event.project_id,
            title: toast.title,
            description: toast.description,
            variant: toast.variant,
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
