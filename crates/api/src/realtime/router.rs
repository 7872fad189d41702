//! Event-to-subscriber routing.
//!
//! [`RealtimeRouter`] subscribes to the event bus and forwards each event
//! to the WebSocket connections watching the affected project: row changes
//! go to subscribers of that `(table, project_id)`, toasts go to anyone
//! watching the project.

use std::sync::Arc;

use axum::extract::ws::Message;
use montage_events::PlatformEvent;
use tokio::sync::broadcast;

use crate::ws::protocol::ServerMessage;
use crate::ws::{Subscription, WsManager};

/// Routes platform events to realtime subscribers.
pub struct RealtimeRouter {
    ws_manager: Arc<WsManager>,
}

impl RealtimeRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the main routing loop.
    ///
    /// The loop exits when the channel is closed (i.e. the
    /// [`EventBus`](montage_events::EventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    self.route_event(&event).await;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Realtime router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, realtime router shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one event. Returns the number of connections reached.
    pub async fn route_event(&self, event: &PlatformEvent) -> usize {
        let Some(message) = ServerMessage::from_event(event) else {
            tracing::debug!(event_type = %event.event_type, "Event has no realtime form");
            return 0;
        };
        let frame = Message::Text(message.to_json().into());

        let delivered = match &event.table {
            Some(table) => {
                let subscription = Subscription::new(table.clone(), event.project_id);
                self.ws_manager.send_to_subscribers(&subscription, frame).await
            }
            None => self.ws_manager.send_to_project(event.project_id, frame).await,
        };

        tracing::trace!(
            event_type = %event.event_type,
            project_id = event.project_id,
            delivered,
            "Realtime event routed",
        );
        delivered
    }
}
