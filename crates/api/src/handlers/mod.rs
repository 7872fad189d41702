//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to the repositories in `montage_db` (or to the voting
//! coordinator for curation), map errors via [`AppError`], and publish a
//! change event for every row they write.
//!
//! [`AppError`]: crate::error::AppError

pub mod auth;
pub mod changelog;
pub mod message;
pub mod pending_clip;
pub mod project;
pub mod timeline;
pub mod vote;

use montage_core::error::CoreError;
use montage_core::types::DbId;
use montage_db::models::changelog::{ChangelogEntry, CreateChangelogEntry};
use montage_db::models::project::Project;
use montage_db::repositories::{ChangelogRepo, ProjectRepo};
use montage_db::DbPool;
use montage_events::topics::TABLE_PROJECT_CHANGELOG;
use montage_events::{ChangeKind, PlatformEvent};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Load a project or fail with 404.
pub(crate) async fn ensure_project_exists(pool: &DbPool, id: DbId) -> AppResult<Project> {
    ProjectRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
}

/// Publish a row change attributed to `auth`.
pub(crate) fn publish_change<T: Serialize>(
    state: &AppState,
    auth: &AuthUser,
    table: &str,
    change: ChangeKind,
    project_id: DbId,
    record: &T,
) {
    state.event_bus.publish(
        PlatformEvent::change(table, change, project_id)
            .with_actor(auth.user_id)
            .with_record(record),
    );
}

/// Append a changelog entry for a user action and announce it.
pub(crate) async fn record_change(
    state: &AppState,
    auth: &AuthUser,
    project_id: DbId,
    action: &str,
    description: String,
) -> AppResult<ChangelogEntry> {
    let entry = ChangelogRepo::create(
        &state.pool,
        &CreateChangelogEntry {
            project_id,
            user_id: Some(auth.user_id),
            user_name: auth.name.clone(),
            action: action.to_string(),
            description,
        },
    )
    .await?;
    publish_change(state, auth, TABLE_PROJECT_CHANGELOG, ChangeKind::Insert, project_id, &entry);
    Ok(entry)
}
