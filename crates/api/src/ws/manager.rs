use std::collections::{HashMap, HashSet};

use axum::body::Bytes;
use axum::extract::ws::Message;
use montage_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a WebSocket connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

/// One realtime topic: a table's changes within one project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub table: String,
    pub project_id: DbId,
}

impl Subscription {
    pub fn new(table: impl Into<String>, project_id: DbId) -> Self {
        Self {
            table: table.into(),
            project_id,
        }
    }
}

/// Metadata for a single WebSocket connection.
pub struct WsConnection {
    /// Authenticated user ID, when the client passed a token on upgrade.
    pub user_id: Option<DbId>,
    /// Channel sender for outbound messages to this connection.
    pub sender: WsSender,
    /// When this connection was established.
    pub connected_at: Timestamp,
    /// Topics this connection listens to.
    pub subscriptions: HashSet<Subscription>,
}

impl WsConnection {
    fn watches_project(&self, project_id: DbId) -> bool {
        self.subscriptions.iter().any(|s| s.project_id == project_id)
    }
}

/// Manages all active WebSocket connections and their subscriptions.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    /// Create a new, empty connection manager.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection.
    ///
    /// Returns the receiver half of the message channel so the caller can
    /// forward messages to the WebSocket sink.
    pub async fn add(
        &self,
        conn_id: String,
        user_id: Option<DbId>,
    ) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            sender: tx,
            connected_at: chrono::Utc::now(),
            subscriptions: HashSet::new(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection by its ID, dropping its subscriptions.
    pub async fn remove(&self, conn_id: &str) {
        self.connections.write().await.remove(conn_id);
    }

    /// Add a topic to a connection. Returns `false` for unknown connections.
    pub async fn subscribe(&self, conn_id: &str, subscription: Subscription) -> bool {
        match self.connections.write().await.get_mut(conn_id) {
            Some(conn) => {
                conn.subscriptions.insert(subscription);
                true
            }
            None => false,
        }
    }

    /// Drop a topic from a connection. Returns whether it was subscribed.
    pub async fn unsubscribe(&self, conn_id: &str, subscription: &Subscription) -> bool {
        self.connections
            .write()
            .await
            .get_mut(conn_id)
            .is_some_and(|conn| conn.subscriptions.remove(subscription))
    }

    /// Send a message to one connection.
    pub async fn send_to(&self, conn_id: &str, message: Message) -> bool {
        match self.connections.read().await.get(conn_id) {
            Some(conn) => conn.sender.send(message).is_ok(),
            None => false,
        }
    }

    /// Send a message to every connection subscribed to `subscription`.
    ///
    /// Returns the number of connections the message was sent to.
    pub async fn send_to_subscribers(&self, subscription: &Subscription, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn.subscriptions.contains(subscription) {
                let _ = conn.sender.send(message.clone());
                count += 1;
            }
        }
        count
    }

    /// Send a message to every connection watching any table of `project_id`.
    pub async fn send_to_project(&self, project_id: DbId, message: Message) -> usize {
        let conns = self.connections.read().await;
        let mut count = 0;
        for conn in conns.values() {
            if conn.watches_project(project_id) {
                let _ = conn.sender.send(message.clone());
                count += 1;
            }
        }
        count
    }

    /// Broadcast a message to all connected clients.
    ///
    /// Connections whose send channels are closed are silently skipped
    /// (they will be cleaned up on their next receive loop iteration).
    pub async fn broadcast(&self, message: Message) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(message.clone());
        }
    }

    /// Return the current number of active connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of topics a connection listens to.
    pub async fn subscription_count(&self, conn_id: &str) -> usize {
        self.connections
            .read()
            .await
            .get(conn_id)
            .map_or(0, |conn| conn.subscriptions.len())
    }

    /// Send a Close frame to every connection, then clear the map.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all WebSocket connections");
    }

    /// Send a Ping frame to every connected client.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for WsManager {
    fn default() -> Self {
        Self::new()
    }
}
