//! Handlers for the `/projects` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use montage_core::effects::validate_effects;
use montage_core::error::CoreError;
use montage_core::timeline::validate_duration;
use montage_core::types::DbId;
use montage_db::models::project::{CreateProject, Project, UpdateProject};
use montage_db::models::video_clip::{CreateVideoClip, VideoClip};
use montage_db::repositories::{ProjectRepo, VideoClipRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /projects`.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(flatten)]
    pub project: CreateProject,
    /// Clips to place on the new timeline, in order.
    #[serde(default)]
    pub clips: Vec<CreateVideoClip>,
}

#[derive(Debug, Serialize)]
pub struct ProjectWithClips {
    #[serde(flatten)]
    pub project: Project,
    pub clips: Vec<VideoClip>,
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Project name must not be empty".into(),
        )));
    }
    Ok(())
}

/// POST /api/v1/projects
///
/// Creates the project, then saves any initial clips in the given order.
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectWithClips>>)> {
    validate_name(&input.project.name)?;
    for clip in &input.clips {
        validate_duration(clip.duration)?;
        validate_effects(&clip.effects)?;
    }

    let project = ProjectRepo::create(&state.pool, Some(auth.user_id), &input.project).await?;

    let mut clips = Vec::with_capacity(input.clips.len());
    for clip in &input.clips {
        clips.push(VideoClipRepo::append(&state.pool, project.id, clip).await?);
    }

    tracing::info!(
        user_id = auth.user_id,
        project_id = project.id,
        clips = clips.len(),
        "Project created"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ProjectWithClips { project, clips },
        }),
    ))
}

/// GET /api/v1/projects
pub async fn list(State(state): State<AppState>) -> AppResult<Json<DataResponse<Vec<Project>>>> {
    let projects = ProjectRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Project>>> {
    let project = super::ensure_project_exists(&state.pool, id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// PUT /api/v1/projects/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProject>,
) -> AppResult<Json<DataResponse<Project>>> {
    if let Some(name) = &input.name {
        validate_name(name)?;
    }
    let project = ProjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;
    tracing::info!(user_id = auth.user_id, project_id = id, "Project updated");
    Ok(Json(DataResponse { data: project }))
}
