use std::sync::Arc;

use montage_pi::PiPlatform;
use montage_voting::{PgVotingStore, VotingCoordinator};

use crate::config::ServerConfig;
use crate::ws::WsManager;

/// The coordinator as wired in production.
pub type Coordinator = VotingCoordinator<PgVotingStore>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: montage_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Event bus carrying row changes and toasts to realtime subscribers.
    pub event_bus: Arc<montage_events::EventBus>,
    /// Pi identity and payment client.
    pub pi: Arc<dyn PiPlatform>,
    /// Voting batch coordinator, shared with the background ticks.
    pub coordinator: Arc<Coordinator>,
}
