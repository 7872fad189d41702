//! Pending (community-submitted) clip model and DTOs.

use montage_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::changelog::ChangelogEntry;
use crate::models::video_clip::VideoClip;

/// A row from the `pending_clips` table.
///
/// `voting_batch`, `voting_rank` and `voting_ends_at` only carry meaning
/// while `status` is `pending`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PendingClip {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: Option<DbId>,
    pub user_name: String,
    pub user_avatar: Option<String>,
    pub name: String,
    pub src: String,
    pub thumbnail: Option<String>,
    pub duration: f64,
    pub votes: i32,
    pub status: String,
    pub voting_batch: Option<String>,
    pub voting_rank: Option<i32>,
    pub voting_ends_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for submitting a clip to a project's curation queue.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePendingClip {
    pub name: String,
    pub src: String,
    pub thumbnail: Option<String>,
    pub duration: f64,
    pub user_avatar: Option<String>,
}

/// One voting batch, derived by grouping pending clips on their token.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BatchSummary {
    pub project_id: DbId,
    pub voting_batch: String,
    pub clip_count: i64,
    pub voting_ends_at: Option<Timestamp>,
}

/// Rows written together when a pending clip is promoted to the timeline.
#[derive(Debug, Clone, Serialize)]
pub struct PromotedClip {
    pub clip: PendingClip,
    pub timeline_clip: VideoClip,
    pub changelog: ChangelogEntry,
}
