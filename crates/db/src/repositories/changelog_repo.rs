//! Repository for the append-only `project_changelog` table.

use montage_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::changelog::{ChangelogEntry, CreateChangelogEntry};

const COLUMNS: &str = "id, project_id, user_id, user_name, action, description, created_at";

/// Appends and reads changelog entries. There is no update or delete.
pub struct ChangelogRepo;

impl ChangelogRepo {
    /// Append an entry.
    pub async fn create(
        pool: &PgPool,
        input: &CreateChangelogEntry,
    ) -> Result<ChangelogEntry, sqlx::Error> {
        Self::create_inner(pool, input).await
    }

    /// Append an entry on any executor, so promotions can log inside their
    /// transaction.
    pub(crate) async fn create_inner<'e>(
        executor: impl PgExecutor<'e>,
        input: &CreateChangelogEntry,
    ) -> Result<ChangelogEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_changelog (project_id, user_id, user_name, action, description)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ChangelogEntry>(&query)
            .bind(input.project_id)
            .bind(input.user_id)
            .bind(&input.user_name)
            .bind(&input.action)
            .bind(&input.description)
            .fetch_one(executor)
            .await
    }

    /// A project's changelog, most recent first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ChangelogEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_changelog
             WHERE project_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ChangelogEntry>(&query)
            .bind(project_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }
}
