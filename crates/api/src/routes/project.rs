//! Route definitions for the `/projects` resource and its project-scoped
//! sub-resources.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{changelog, message, pending_clip, project, timeline};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                                  -> list
/// POST   /                                  -> create
/// GET    /{project_id}                      -> get_by_id
/// PUT    /{project_id}                      -> update
///
/// GET    /{project_id}/pending-clips        -> pending_clip::list_by_project
/// POST   /{project_id}/pending-clips        -> pending_clip::submit
/// GET    /{project_id}/batches              -> pending_clip::list_batches
///
/// GET    /{project_id}/timeline             -> timeline::list_by_project
/// POST   /{project_id}/timeline             -> timeline::add
/// PUT    /{project_id}/timeline/reorder     -> timeline::reorder
///
/// GET    /{project_id}/messages             -> message::list_by_project
/// POST   /{project_id}/messages             -> message::post
/// GET    /{project_id}/changelog            -> changelog::list_by_project
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/{project_id}", get(project::get_by_id).put(project::update))
        .route(
            "/{project_id}/pending-clips",
            get(pending_clip::list_by_project).post(pending_clip::submit),
        )
        .route("/{project_id}/batches", get(pending_clip::list_batches))
        .route(
            "/{project_id}/timeline",
            get(timeline::list_by_project).post(timeline::add),
        )
        .route("/{project_id}/timeline/reorder", put(timeline::reorder))
        .route(
            "/{project_id}/messages",
            get(message::list_by_project).post(message::post),
        )
        .route("/{project_id}/changelog", get(changelog::list_by_project))
}
