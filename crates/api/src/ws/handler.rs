use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use montage_core::types::DbId;
use montage_events::topics::is_realtime_table;
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::state::AppState;
use crate::ws::manager::{Subscription, WsManager};
use crate::ws::protocol::{ClientMessage, ServerMessage};

/// Optional query parameters on the upgrade request.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    /// Access token; anonymous viewers may omit it.
    pub token: Option<String>,
}

/// HTTP handler that upgrades the connection to WebSocket.
///
/// After the upgrade the connection is registered with `WsManager` and
/// managed by a sender task plus the receive loop.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let user_id = params
        .token
        .as_deref()
        .and_then(|token| validate_token(token, &state.config.jwt).ok())
        .map(|claims| claims.sub);
    ws.on_upgrade(move |socket| handle_socket(socket, state.ws_manager, user_id))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Applies subscribe / unsubscribe actions from the client.
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, ws_manager: Arc<WsManager>, user_id: Option<DbId>) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id = ?user_id, "WebSocket connected");

    let mut rx = ws_manager.add(conn_id.clone(), user_id).await;

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Text(text)) => {
                let reply = handle_client_message(&ws_manager, &conn_id, text.as_str()).await;
                ws_manager
                    .send_to(&conn_id, Message::Text(reply.to_json().into()))
                    .await;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

/// Apply one client action and build the acknowledgement.
pub async fn handle_client_message(
    ws_manager: &WsManager,
    conn_id: &str,
    text: &str,
) -> ServerMessage {
    let message = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => message,
        Err(e) => {
            return ServerMessage::Error {
                message: format!("Invalid message: {e}"),
            }
        }
    };

    match message {
        ClientMessage::Subscribe { table, project_id } => {
            if !is_realtime_table(&table) {
                return ServerMessage::Error {
                    message: format!("Unknown table '{table}'"),
                };
            }
            ws_manager
                .subscribe(conn_id, Subscription::new(table.clone(), project_id))
                .await;
            tracing::debug!(conn_id, %table, project_id, "Subscribed");
            ServerMessage::Subscribed { table, project_id }
        }
        ClientMessage::Unsubscribe { table, project_id } => {
            ws_manager
                .unsubscribe(conn_id, &Subscription::new(table.clone(), project_id))
                .await;
            tracing::debug!(conn_id, %table, project_id, "Unsubscribed");
            ServerMessage::Unsubscribed { table, project_id }
        }
    }
}
