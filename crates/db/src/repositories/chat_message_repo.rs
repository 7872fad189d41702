//! Repository for the `project_messages` table.

use montage_core::types::DbId;
use sqlx::PgPool;

use crate::models::chat_message::ChatMessage;

const COLUMNS: &str = "id, project_id, user_id, user_name, user_avatar, content, created_at";

/// Provides persistence for project chat.
pub struct ChatMessageRepo;

impl ChatMessageRepo {
    /// Post a message. `user_id` is `None` for system announcements.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        user_id: Option<DbId>,
        user_name: &str,
        user_avatar: Option<&str>,
        content: &str,
    ) -> Result<ChatMessage, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_messages (project_id, user_id, user_name, user_avatar, content)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChatMessage>(&query)
            .bind(project_id)
            .bind(user_id)
            .bind(user_name)
            .bind(user_avatar)
            .bind(content)
            .fetch_one(pool)
            .await
    }

    /// A project's chat in chronological order.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM (
                SELECT {COLUMNS} FROM project_messages
                WHERE project_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
             ) recent
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, ChatMessage>(&query)
            .bind(project_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
