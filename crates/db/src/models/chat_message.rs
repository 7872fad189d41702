//! Project chat message model and DTOs.

use montage_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `project_messages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatMessage {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: Option<DbId>,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub content: String,
    pub created_at: Timestamp,
}

/// DTO for posting a chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateChatMessage {
    pub content: String,
    pub user_avatar: Option<String>,
}
