//! WebSocket infrastructure for realtime project updates.
//!
//! Provides connection and subscription management, heartbeat monitoring,
//! and the HTTP upgrade handler used by Axum routes.

mod handler;
mod heartbeat;
pub mod manager;
pub mod protocol;

pub use handler::{handle_client_message, ws_handler};
pub use heartbeat::start_heartbeat;
pub use manager::{Subscription, WsManager};
