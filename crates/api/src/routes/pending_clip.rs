use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{pending_clip, vote};
use crate::state::AppState;

/// Routes mounted at `/pending-clips`.
///
/// ```text
/// POST   /{id}/approve    -> pending_clip::approve
/// POST   /{id}/reject     -> pending_clip::reject
/// POST   /{id}/vote       -> vote::toggle
/// GET    /{id}/votes      -> vote::status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/approve", post(pending_clip::approve))
        .route("/{id}/reject", post(pending_clip::reject))
        .route("/{id}/vote", post(vote::toggle))
        .route("/{id}/votes", get(vote::status))
}
