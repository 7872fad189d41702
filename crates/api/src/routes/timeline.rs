use axum::routing::{delete, put};
use axum::Router;

use crate::handlers::timeline;
use crate::state::AppState;

/// Routes mounted at `/timeline-clips`.
///
/// ```text
/// DELETE /{id}            -> delete
/// PUT    /{id}/trim       -> trim
/// PUT    /{id}/effects    -> set_effects
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", delete(timeline::delete))
        .route("/{id}/trim", put(timeline::trim))
        .route("/{id}/effects", put(timeline::set_effects))
}
