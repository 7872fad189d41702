//! Repository for the `pending_clips` table.
//!
//! Every status and batch mutation is conditional on the clip still being
//! `pending` (and, for batch moves, still carrying the expected token), so a
//! stale caller sees `None`/`false` instead of overwriting newer state.

use montage_core::changelog::{approved_description, ACTION_APPROVED_CLIP};
use montage_core::clip_status::{STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED};
use montage_core::types::{DbId, Timestamp};
use montage_core::voting::UNBATCHED;
use sqlx::{PgExecutor, PgPool};

use crate::models::changelog::CreateChangelogEntry;
use crate::models::pending_clip::{BatchSummary, CreatePendingClip, PendingClip, PromotedClip};
use crate::repositories::{ChangelogRepo, VideoClipRepo};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, user_id, user_name, user_avatar, name, src, thumbnail, \
    duration, votes, status, voting_batch, voting_rank, voting_ends_at, created_at, updated_at";

/// Provides persistence for clips awaiting curation.
pub struct PendingClipRepo;

impl PendingClipRepo {
    // -----------------------------------------------------------------------
    // Submission and reads
    // -----------------------------------------------------------------------

    /// Insert a newly submitted clip. It starts `pending` and unbatched.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        user_id: Option<DbId>,
        user_name: &str,
        input: &CreatePendingClip,
    ) -> Result<PendingClip, sqlx::Error> {
        let query = format!(
            "INSERT INTO pending_clips
                (project_id, user_id, user_name, user_avatar, name, src, thumbnail, duration, status)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PendingClip>(&query)
            .bind(project_id)
            .bind(user_id)
            .bind(user_name)
            .bind(&input.user_avatar)
            .bind(&input.name)
            .bind(&input.src)
            .bind(&input.thumbnail)
            .bind(input.duration)
            .bind(STATUS_PENDING)
            .fetch_one(pool)
            .await
    }

    /// Find a clip by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<PendingClip>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM pending_clips WHERE id = $1");
        sqlx::query_as::<_, PendingClip>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a project's clips, newest first, optionally filtered by status.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
        status: Option<&str>,
    ) -> Result<Vec<PendingClip>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pending_clips
             WHERE project_id = $1 AND ($2::TEXT IS NULL OR status = $2)
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, PendingClip>(&query)
            .bind(project_id)
            .bind(status)
            .fetch_all(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Voting batches
    // -----------------------------------------------------------------------

    /// All pending clips not yet assigned to a batch, grouped by project.
    pub async fn list_unbatched_pending(pool: &PgPool) -> Result<Vec<PendingClip>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pending_clips
             WHERE status = $1 AND {}
             ORDER BY project_id, created_at, id",
            unbatched_predicate("$2")
        );
        sqlx::query_as::<_, PendingClip>(&query)
            .bind(STATUS_PENDING)
            .bind(UNBATCHED)
            .fetch_all(pool)
            .await
    }

    /// Stamp a batch token and window end onto a clip that is still
    /// unbatched. Returns `false` if the clip was already batched or decided.
    ///
    /// Likes cast before batching move into the new round with the clip, so
    /// `votes` keeps matching the likes recorded under the clip's token.
    pub async fn stamp_batch(
        pool: &PgPool,
        id: DbId,
        token: &str,
        ends_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE pending_clips SET voting_batch = $2, voting_ends_at = $3
             WHERE id = $1 AND status = $4 AND {}",
            unbatched_predicate("$5")
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(token)
            .bind(ends_at)
            .bind(STATUS_PENDING)
            .bind(UNBATCHED)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE clip_likes SET voting_batch = $2
             WHERE clip_id = $1 AND voting_batch IN ('', $3)",
        )
        .bind(id)
        .bind(token)
        .bind(UNBATCHED)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Summarise the open batches, optionally for a single project.
    ///
    /// The window end reported is the latest one among the member clips.
    pub async fn list_batches(
        pool: &PgPool,
        project_id: Option<DbId>,
    ) -> Result<Vec<BatchSummary>, sqlx::Error> {
        let query = format!(
            "SELECT project_id, voting_batch, COUNT(*) AS clip_count,
                    MAX(voting_ends_at) AS voting_ends_at
             FROM pending_clips
             WHERE status = $1 AND NOT {}
               AND ($3::BIGINT IS NULL OR project_id = $3)
             GROUP BY project_id, voting_batch
             ORDER BY MAX(voting_ends_at) NULLS LAST, voting_batch",
            unbatched_predicate("$2")
        );
        sqlx::query_as::<_, BatchSummary>(&query)
            .bind(STATUS_PENDING)
            .bind(UNBATCHED)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Pending clips of one batch, newest first.
    pub async fn list_batch_clips(
        pool: &PgPool,
        project_id: DbId,
        token: &str,
    ) -> Result<Vec<PendingClip>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM pending_clips
             WHERE project_id = $1 AND voting_batch = $2 AND status = $3
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, PendingClip>(&query)
            .bind(project_id)
            .bind(token)
            .bind(STATUS_PENDING)
            .fetch_all(pool)
            .await
    }

    /// Persist (or clear) a clip's rank within its batch.
    pub async fn set_rank(pool: &PgPool, id: DbId, rank: Option<i32>) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pending_clips SET voting_rank = $2 WHERE id = $1 AND status = $3",
        )
        .bind(id)
        .bind(rank)
        .bind(STATUS_PENDING)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Move a clip from `from_token` into a fresh batch with its votes reset.
    ///
    /// Returns `false` if the clip left `from_token` or is no longer pending.
    pub async fn rebatch(
        pool: &PgPool,
        id: DbId,
        from_token: &str,
        token: &str,
        ends_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE pending_clips
             SET voting_batch = $3, voting_ends_at = $4, votes = 0, voting_rank = NULL
             WHERE id = $1 AND voting_batch = $2 AND status = $5",
        )
        .bind(id)
        .bind(from_token)
        .bind(token)
        .bind(ends_at)
        .bind(STATUS_PENDING)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // -----------------------------------------------------------------------
    // Status transitions
    // -----------------------------------------------------------------------

    /// Compare-and-set `pending -> rejected`. `None` if the clip was not pending.
    pub async fn mark_rejected(pool: &PgPool, id: DbId) -> Result<Option<PendingClip>, sqlx::Error> {
        Self::transition(pool, id, STATUS_REJECTED).await
    }

    /// Approve a pending clip, append it to the timeline and log the
    /// approval, all in one transaction.
    ///
    /// `None` if the clip was not pending. Any failure rolls the clip back to
    /// `pending`, so a later attempt can promote it.
    pub async fn promote(
        pool: &PgPool,
        id: DbId,
        actor_id: Option<DbId>,
        actor_name: &str,
    ) -> Result<Option<PromotedClip>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let Some(clip) = Self::transition(&mut *tx, id, STATUS_APPROVED).await? else {
            return Ok(None);
        };
        let timeline_clip = VideoClipRepo::append_from_pending(&mut *tx, &clip).await?;
        let changelog = ChangelogRepo::create_inner(
            &mut *tx,
            &CreateChangelogEntry {
                project_id: clip.project_id,
                user_id: actor_id,
                user_name: actor_name.to_string(),
                action: ACTION_APPROVED_CLIP.to_string(),
                description: approved_description(&clip.name),
            },
        )
        .await?;

        tx.commit().await?;
        Ok(Some(PromotedClip {
            clip,
            timeline_clip,
            changelog,
        }))
    }

    async fn transition<'e>(
        executor: impl PgExecutor<'e>,
        id: DbId,
        to: &str,
    ) -> Result<Option<PendingClip>, sqlx::Error> {
        let query = format!(
            "UPDATE pending_clips SET status = $2
             WHERE id = $1 AND status = $3
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PendingClip>(&query)
            .bind(id)
            .bind(to)
            .bind(STATUS_PENDING)
            .fetch_optional(executor)
            .await
    }

    // -----------------------------------------------------------------------
    // Vote counters
    // -----------------------------------------------------------------------

    /// Add one vote to a pending clip.
    pub async fn increment_votes(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PendingClip>, sqlx::Error> {
        let query = format!(
            "UPDATE pending_clips SET votes = votes + 1
             WHERE id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PendingClip>(&query)
            .bind(id)
            .bind(STATUS_PENDING)
            .fetch_optional(pool)
            .await
    }

    /// Remove one vote from a pending clip, never going below zero.
    pub async fn decrement_votes(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PendingClip>, sqlx::Error> {
        let query = format!(
            "UPDATE pending_clips SET votes = GREATEST(votes - 1, 0)
             WHERE id = $1 AND status = $2
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PendingClip>(&query)
            .bind(id)
            .bind(STATUS_PENDING)
            .fetch_optional(pool)
            .await
    }
}

/// Predicate matching an unbatched clip, with the sentinel bound at `param`.
fn unbatched_predicate(param: &str) -> String {
    format!("(voting_batch IS NULL OR voting_batch = '' OR voting_batch = {param})")
}
