//! Repository for the `video_clips` (timeline) table.

use montage_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::pending_clip::PendingClip;
use crate::models::video_clip::{ClipPlacement, CreateVideoClip, VideoClip};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, pending_clip_id, name, src, thumbnail, position, \
    start_time, duration, effects, created_at, updated_at";

/// Provides CRUD operations for timeline clips.
pub struct VideoClipRepo;

impl VideoClipRepo {
    /// List a project's timeline in playback order.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<VideoClip>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM video_clips WHERE project_id = $1 ORDER BY position, id"
        );
        sqlx::query_as::<_, VideoClip>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Find a clip by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<VideoClip>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM video_clips WHERE id = $1");
        sqlx::query_as::<_, VideoClip>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Append an uploaded clip at the end of the project's timeline.
    pub async fn append(
        pool: &PgPool,
        project_id: DbId,
        input: &CreateVideoClip,
    ) -> Result<VideoClip, sqlx::Error> {
        let effects = serde_json::to_value(&input.effects)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let query = format!(
            "INSERT INTO video_clips
                (project_id, name, src, thumbnail, position, start_time, duration, effects)
             SELECT $1, $2, $3, $4, COALESCE(MAX(position) + 1, 0), $5, $6, $7
             FROM video_clips WHERE project_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoClip>(&query)
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.src)
            .bind(&input.thumbnail)
            .bind(input.start_time)
            .bind(input.duration)
            .bind(effects)
            .fetch_one(pool)
            .await
    }

    /// Append an approved pending clip to its project's timeline.
    ///
    /// The clip starts at 0 and keeps the media reference and duration of
    /// the pending record. The `uq_video_clips_pending_clip` constraint
    /// rejects a second promotion of the same pending clip.
    ///
    /// Takes any executor so `PendingClipRepo::promote` can run it inside its
    /// transaction.
    pub async fn append_from_pending<'e>(
        executor: impl PgExecutor<'e>,
        clip: &PendingClip,
    ) -> Result<VideoClip, sqlx::Error> {
        let query = format!(
            "INSERT INTO video_clips
                (project_id, pending_clip_id, name, src, thumbnail, position, start_time, duration)
             SELECT $1, $2, $3, $4, $5, COALESCE(MAX(position) + 1, 0), 0, $6
             FROM video_clips WHERE project_id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoClip>(&query)
            .bind(clip.project_id)
            .bind(clip.id)
            .bind(&clip.name)
            .bind(&clip.src)
            .bind(&clip.thumbnail)
            .bind(clip.duration)
            .fetch_one(executor)
            .await
    }

    /// Apply one row of a reorder request within a project.
    ///
    /// Returns `false` if the clip does not belong to `project_id`.
    pub async fn apply_placement(
        pool: &PgPool,
        project_id: DbId,
        placement: &ClipPlacement,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE video_clips SET
                position = $3,
                start_time = COALESCE($4, start_time),
                duration = COALESCE($5, duration)
             WHERE id = $1 AND project_id = $2",
        )
        .bind(placement.id)
        .bind(project_id)
        .bind(placement.position)
        .bind(placement.start_time)
        .bind(placement.duration)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set a clip's trim window.
    pub async fn trim(
        pool: &PgPool,
        id: DbId,
        start_time: f64,
        duration: f64,
    ) -> Result<Option<VideoClip>, sqlx::Error> {
        let query = format!(
            "UPDATE video_clips SET start_time = $2, duration = $3
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoClip>(&query)
            .bind(id)
            .bind(start_time)
            .bind(duration)
            .fetch_optional(pool)
            .await
    }

    /// Replace a clip's effect stack.
    pub async fn set_effects(
        pool: &PgPool,
        id: DbId,
        effects: &serde_json::Value,
    ) -> Result<Option<VideoClip>, sqlx::Error> {
        let query = format!(
            "UPDATE video_clips SET effects = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VideoClip>(&query)
            .bind(id)
            .bind(effects)
            .fetch_optional(pool)
            .await
    }

    /// Remove a clip from the timeline. Returns the deleted row.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<VideoClip>, sqlx::Error> {
        let query = format!("DELETE FROM video_clips WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, VideoClip>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
