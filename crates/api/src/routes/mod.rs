pub mod auth;
pub mod health;
pub mod pending_clip;
pub mod project;
pub mod timeline;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /ws                                          WebSocket (realtime subscriptions)
///
/// /auth/pi                                     Pi sign-in (public)
/// /auth/me                                     current user
///
/// /projects                                    list, create
/// /projects/{project_id}                       get, update
/// /projects/{project_id}/pending-clips         list (?status), submit
/// /projects/{project_id}/batches               open voting batches
/// /projects/{project_id}/timeline              list, add
/// /projects/{project_id}/timeline/reorder      reorder (PUT)
/// /projects/{project_id}/messages              list, post
/// /projects/{project_id}/changelog             list
///
/// /pending-clips/{id}/approve                  manual approval (POST)
/// /pending-clips/{id}/reject                   manual rejection (POST)
/// /pending-clips/{id}/vote                     toggle vote (POST)
/// /pending-clips/{id}/votes                    vote status (GET)
///
/// /timeline-clips/{id}                         remove (DELETE)
/// /timeline-clips/{id}/trim                    trim (PUT)
/// /timeline-clips/{id}/effects                 set effects (PUT)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/ws", get(ws::ws_handler))
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .nest("/pending-clips", pending_clip::router())
        .nest("/timeline-clips", timeline::router())
}
