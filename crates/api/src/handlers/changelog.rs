//! Handlers for the append-only project changelog.

use axum::extract::{Path, Query, State};
use axum::Json;
use montage_core::types::DbId;
use montage_db::models::changelog::ChangelogEntry;
use montage_db::repositories::ChangelogRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/v1/projects/{project_id}/changelog
///
/// Most recent first.
pub async fn list_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<ChangelogEntry>>>> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);
    let entries = ChangelogRepo::list_by_project(&state.pool, project_id, limit, offset).await?;
    Ok(Json(DataResponse { data: entries }))
}
