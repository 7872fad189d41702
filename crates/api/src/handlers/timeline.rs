//! Handlers for the project timeline (`video_clips`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use montage_core::changelog::{
    added_description, removed_description, ACTION_ADDED_CLIP, ACTION_REMOVED_CLIP,
};
use montage_core::effects::{css_filter, validate_effects, VideoEffect};
use montage_core::error::CoreError;
use montage_core::timeline::{validate_duration, validate_reorder, validate_trim};
use montage_core::types::DbId;
use montage_db::models::video_clip::{ClipPlacement, CreateVideoClip, VideoClip};
use montage_db::repositories::VideoClipRepo;
use montage_db::DbPool;
use montage_events::topics::TABLE_VIDEO_CLIPS;
use montage_events::ChangeKind;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

use super::{ensure_project_exists, publish_change, record_change};

/// A timeline clip plus the CSS filter the canvas applies to it.
#[derive(Debug, Serialize)]
pub struct TimelineClip {
    #[serde(flatten)]
    pub clip: VideoClip,
    pub css_filter: String,
}

impl From<VideoClip> for TimelineClip {
    fn from(clip: VideoClip) -> Self {
        let css_filter = css_filter(&clip.effect_stack());
        Self { clip, css_filter }
    }
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub clips: Vec<ClipPlacement>,
}

/// Trim window in seconds of source media.
#[derive(Debug, Deserialize)]
pub struct TrimRequest {
    pub start_time: f64,
    pub end_time: f64,
}

#[derive(Debug, Deserialize)]
pub struct SetEffectsRequest {
    pub effects: Vec<VideoEffect>,
}

async fn ensure_timeline_clip_exists(pool: &DbPool, id: DbId) -> AppResult<VideoClip> {
    VideoClipRepo::find_by_id(pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "VideoClip",
            id,
        }))
}

/// GET /api/v1/projects/{project_id}/timeline
pub async fn list_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<TimelineClip>>>> {
    let clips = VideoClipRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse {
        data: clips.into_iter().map(TimelineClip::from).collect(),
    }))
}

/// POST /api/v1/projects/{project_id}/timeline
///
/// Add uploaded media directly to the end of the timeline.
pub async fn add(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateVideoClip>,
) -> AppResult<(StatusCode, Json<DataResponse<TimelineClip>>)> {
    validate_duration(input.duration)?;
    validate_effects(&input.effects)?;
    ensure_project_exists(&state.pool, project_id).await?;

    let clip = VideoClipRepo::append(&state.pool, project_id, &input).await?;
    publish_change(&state, &auth, TABLE_VIDEO_CLIPS, ChangeKind::Insert, project_id, &clip);
    record_change(&state, &auth, project_id, ACTION_ADDED_CLIP, added_description(&clip.name)).await?;

    tracing::info!(user_id = auth.user_id, project_id, clip_id = clip.id, position = clip.position, "Timeline clip added");

    Ok((StatusCode::CREATED, Json(DataResponse { data: clip.into() })))
}

/// PUT /api/v1/projects/{project_id}/timeline/reorder
///
/// Applies each placement in request order, one row at a time.
pub async fn reorder(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<ReorderRequest>,
) -> AppResult<Json<DataResponse<Vec<TimelineClip>>>> {
    let entries: Vec<(DbId, i32)> = input.clips.iter().map(|p| (p.id, p.position)).collect();
    validate_reorder(&entries)?;
    for placement in &input.clips {
        if let Some(duration) = placement.duration {
            validate_duration(duration)?;
        }
        if placement.start_time.is_some_and(|s| !s.is_finite() || s < 0.0) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "start_time of clip {} must be >= 0",
                placement.id
            ))));
        }
    }

    for placement in &input.clips {
        if !VideoClipRepo::apply_placement(&state.pool, project_id, placement).await? {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "VideoClip",
                id: placement.id,
            }));
        }
    }

    let clips = VideoClipRepo::list_by_project(&state.pool, project_id).await?;
    for clip in clips.iter().filter(|c| entries.iter().any(|&(id, _)| id == c.id)) {
        publish_change(&state, &auth, TABLE_VIDEO_CLIPS, ChangeKind::Update, project_id, clip);
    }

    tracing::info!(user_id = auth.user_id, project_id, clips = entries.len(), "Timeline reordered");

    Ok(Json(DataResponse {
        data: clips.into_iter().map(TimelineClip::from).collect(),
    }))
}

/// PUT /api/v1/timeline-clips/{id}/trim
pub async fn trim(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<TrimRequest>,
) -> AppResult<Json<DataResponse<TimelineClip>>> {
    let current = ensure_timeline_clip_exists(&state.pool, id).await?;
    let duration = validate_trim(input.start_time, input.end_time, current.start_time, current.duration)?;

    let clip = VideoClipRepo::trim(&state.pool, id, input.start_time, duration)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "VideoClip",
            id,
        }))?;
    publish_change(&state, &auth, TABLE_VIDEO_CLIPS, ChangeKind::Update, clip.project_id, &clip);

    Ok(Json(DataResponse { data: clip.into() }))
}

/// PUT /api/v1/timeline-clips/{id}/effects
///
/// Replaces the whole effect stack.
pub async fn set_effects(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SetEffectsRequest>,
) -> AppResult<Json<DataResponse<TimelineClip>>> {
    validate_effects(&input.effects)?;
    let effects = serde_json::to_value(&input.effects)
        .map_err(|e| AppError::InternalError(format!("Failed to encode effects: {e}")))?;

    let clip = VideoClipRepo::set_effects(&state.pool, id, &effects)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "VideoClip",
            id,
        }))?;
    publish_change(&state, &auth, TABLE_VIDEO_CLIPS, ChangeKind::Update, clip.project_id, &clip);

    Ok(Json(DataResponse { data: clip.into() }))
}

/// DELETE /api/v1/timeline-clips/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let clip = VideoClipRepo::delete(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "VideoClip",
            id,
        }))?;
    publish_change(&state, &auth, TABLE_VIDEO_CLIPS, ChangeKind::Delete, clip.project_id, &clip);
    record_change(&state, &auth, clip.project_id, ACTION_REMOVED_CLIP, removed_description(&clip.name)).await?;

    tracing::info!(user_id = auth.user_id, project_id = clip.project_id, clip_id = id, "Timeline clip removed");

    Ok(StatusCode::NO_CONTENT)
}
