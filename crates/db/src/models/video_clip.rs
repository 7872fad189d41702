//! Timeline clip model and DTOs.

use montage_core::effects::VideoEffect;
use montage_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `video_clips` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VideoClip {
    pub id: DbId,
    pub project_id: DbId,
    /// Set when the clip was promoted from the curation queue.
    pub pending_clip_id: Option<DbId>,
    pub name: String,
    pub src: String,
    pub thumbnail: Option<String>,
    pub position: i32,
    pub start_time: f64,
    pub duration: f64,
    /// JSON array of `{ "type", "value" }` objects.
    pub effects: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl VideoClip {
    /// Decode the stored effect stack. A malformed column decodes as empty.
    pub fn effect_stack(&self) -> Vec<VideoEffect> {
        serde_json::from_value(self.effects.clone()).unwrap_or_default()
    }
}

/// DTO for inserting a clip onto a timeline.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVideoClip {
    pub name: String,
    pub src: String,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub start_time: f64,
    pub duration: f64,
    #[serde(default)]
    pub effects: Vec<VideoEffect>,
}

/// One row of a reorder request.
#[derive(Debug, Clone, Deserialize)]
pub struct ClipPlacement {
    pub id: DbId,
    pub position: i32,
    pub start_time: Option<f64>,
    pub duration: Option<f64>,
}
