//! Handlers for project chat.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use montage_core::error::CoreError;
use montage_core::types::DbId;
use montage_db::models::chat_message::{ChatMessage, CreateChatMessage};
use montage_db::repositories::ChatMessageRepo;
use montage_events::topics::TABLE_PROJECT_MESSAGES;
use montage_events::ChangeKind;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

use super::{ensure_project_exists, publish_change};

const DEFAULT_MESSAGE_LIMIT: i64 = 100;
const MAX_MESSAGE_LIMIT: i64 = 500;
const MAX_MESSAGE_LENGTH: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct ListMessagesParams {
    pub limit: Option<i64>,
}

/// GET /api/v1/projects/{project_id}/messages
///
/// The most recent messages, oldest first.
pub async fn list_by_project(
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(params): Query<ListMessagesParams>,
) -> AppResult<Json<DataResponse<Vec<ChatMessage>>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_MESSAGE_LIMIT)
        .clamp(1, MAX_MESSAGE_LIMIT);
    let messages = ChatMessageRepo::list_by_project(&state.pool, project_id, limit).await?;
    Ok(Json(DataResponse { data: messages }))
}

/// POST /api/v1/projects/{project_id}/messages
pub async fn post(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateChatMessage>,
) -> AppResult<(StatusCode, Json<DataResponse<ChatMessage>>)> {
    let content = input.content.trim();
    if content.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Message must not be empty".into(),
        )));
    }
    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Message exceeds {MAX_MESSAGE_LENGTH} characters"
        ))));
    }
    ensure_project_exists(&state.pool, project_id).await?;

    let message = ChatMessageRepo::create(
        &state.pool,
        project_id,
        Some(auth.user_id),
        &auth.name,
        input.user_avatar.as_deref(),
        content,
    )
    .await?;
    publish_change(&state, &auth, TABLE_PROJECT_MESSAGES, ChangeKind::Insert, project_id, &message);

    Ok((StatusCode::CREATED, Json(DataResponse { data: message })))
}
