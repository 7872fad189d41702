//! Clip like (paid vote) model.

use montage_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `clip_likes` table. One per clip, user and voting round.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClipLike {
    pub id: DbId,
    pub clip_id: DbId,
    pub user_id: DbId,
    pub voting_batch: String,
    pub payment_id: Option<String>,
    pub created_at: Timestamp,
}
