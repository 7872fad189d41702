//! Project changelog model.

use montage_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the append-only `project_changelog` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChangelogEntry {
    pub id: DbId,
    pub project_id: DbId,
    /// `None` for entries written by the voting coordinator.
    pub user_id: Option<DbId>,
    pub user_name: String,
    pub action: String,
    pub description: String,
    pub created_at: Timestamp,
}

/// DTO for appending a changelog entry.
#[derive(Debug, Clone)]
pub struct CreateChangelogEntry {
    pub project_id: DbId,
    pub user_id: Option<DbId>,
    pub user_name: String,
    pub action: String,
    pub description: String,
}
