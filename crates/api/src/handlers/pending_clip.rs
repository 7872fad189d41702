//! Handlers for community-submitted clips and their curation.
//!
//! Approval and rejection go through the voting coordinator so a manual
//! decision leaves the same trail (status, timeline clip, changelog,
//! realtime events) as a batch win.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use montage_core::clip_status::{
    validate_status, validate_transition, STATUS_APPROVED, STATUS_REJECTED,
};
use montage_core::error::CoreError;
use montage_core::timeline::validate_duration;
use montage_core::types::{DbId, Timestamp};
use montage_core::voting::batch_created_at;
use montage_db::models::changelog::ChangelogEntry;
use montage_db::models::pending_clip::{CreatePendingClip, PendingClip};
use montage_db::repositories::PendingClipRepo;
use montage_db::DbPool;
use montage_events::topics::TABLE_PENDING_CLIPS;
use montage_events::ChangeKind;
use montage_voting::{Actor, Promotion};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

use super::{ensure_project_exists, publish_change};

/// Query parameters for `GET /projects/{project_id}/pending-clips`.
#[derive(Debug, Deserialize)]
pub struct ListPendingParams {
    pub status: Option<String>,
}

/// One open voting batch of a project.
#[derive(Debug, Serialize)]
pub struct BatchView {
    pub voting_batch: String,
    pub clip_count: i64,
    pub voting_ends_at: Option<Timestamp>,
    /// Parsed from the token; `None` for tokens in an unknown format.
    pub created_at: Option<Timestamp>,
}

/// Result of a manual rejection.
#[derive(Debug, Serialize)]
pub struct Rejection {
    pub clip: PendingClip,
    pub changelog: ChangelogEntry,
}

/// Load a pending clip or fail with 404.
pub(crate) async fn ensure_clip_exists(pool: &DbPool, id: DbId) -> AppResult<PendingClip> {
    PendingClipRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "PendingClip",
            id,
        }))
}

/// POST /api/v1/projects/{project_id}/pending-clips
///
/// Submit a clip for community curation. It joins the next voting batch
/// on the coordinator's following tick.
pub async fn submit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreatePendingClip>,
) -> AppResult<(StatusCode, Json<DataResponse<PendingClip>>)> {
    if input.name.trim().is_empty() || input.src.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Clip name and src are required".into(),
        )));
    }
    validate_duration(input.duration)?;
    ensure_project_exists(&state.pool, project_id).await?;

    let clip = PendingClipRepo::create(
        &state.pool,
        project_id,
        Some(auth.user_id),
        &auth.name,
        &input,
    )
    .await?;
    publish_change(&state, &auth, TABLE_PENDING_CLIPS, ChangeKind::Insert, project_id, &clip);

    tracing::info!(user_id = auth.user_id, project_id, clip_id = clip.id, "Clip submitted");

    Ok((StatusCode::CREATED, Json(DataResponse { data: clip })))
}

/// GET /api/v1/projects/{project_id}/pending-clips
///
/// Newest first, optionally filtered by `?status=`.
pub async fn list_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(params): Query<ListPendingParams>,
) -> AppResult<Json<DataResponse<Vec<PendingClip>>>> {
    if let Some(status) = &params.status {
        validate_status(status)?;
    }
    let clips =
        PendingClipRepo::list_by_project(&state.pool, project_id, params.status.as_deref()).await?;
    Ok(Json(DataResponse { data: clips }))
}

/// GET /api/v1/projects/{project_id}/batches
pub async fn list_batches(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<BatchView>>>> {
    let batches = PendingClipRepo::list_batches(&state.pool, Some(project_id)).await?;
    let views = batches
        .into_iter()
        .map(|b| BatchView {
            created_at: batch_created_at(&b.voting_batch),
            voting_batch: b.voting_batch,
            clip_count: b.clip_count,
            voting_ends_at: b.voting_ends_at,
        })
        .collect();
    Ok(Json(DataResponse { data: views }))
}

/// POST /api/v1/pending-clips/{id}/approve
pub async fn approve(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Promotion>>> {
    let clip = ensure_clip_exists(&state.pool, id).await?;
    validate_transition(&clip.status, STATUS_APPROVED)?;

    let promotion = state
        .coordinator
        .approve_clip(id, &Actor::user(auth.user_id, auth.name.clone()))
        .await?;
    Ok(Json(DataResponse { data: promotion }))
}

/// POST /api/v1/pending-clips/{id}/reject
pub async fn reject(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Rejection>>> {
    let clip = ensure_clip_exists(&state.pool, id).await?;
    validate_transition(&clip.status, STATUS_REJECTED)?;

    let (clip, changelog) = state
        .coordinator
        .reject_clip(id, &Actor::user(auth.user_id, auth.name.clone()))
        .await?;
    Ok(Json(DataResponse {
        data: Rejection { clip, changelog },
    }))
}
