//! Repository for the `clip_likes` table.

use montage_core::types::DbId;
use sqlx::PgPool;

use crate::models::clip_like::ClipLike;

const COLUMNS: &str = "id, clip_id, user_id, voting_batch, payment_id, created_at";

/// Records paid votes, scoped to the clip's voting round.
///
/// The round is the clip's batch token, or an empty string while the clip
/// is unbatched. A like without a `payment_id` is a reservation held while
/// its payment settles; it blocks a second vote by the same user but is not
/// counted.
pub struct ClipLikeRepo;

impl ClipLikeRepo {
    /// Find the caller's like for a clip in the given round.
    pub async fn find(
        pool: &PgPool,
        clip_id: DbId,
        user_id: DbId,
        voting_batch: &str,
    ) -> Result<Option<ClipLike>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM clip_likes
             WHERE clip_id = $1 AND user_id = $2 AND voting_batch = $3"
        );
        sqlx::query_as::<_, ClipLike>(&query)
            .bind(clip_id)
            .bind(user_id)
            .bind(voting_batch)
            .fetch_optional(pool)
            .await
    }

    /// Record a like. Fails on `uq_clip_likes_clip_user_batch` if the user
    /// already voted in this round.
    pub async fn create(
        pool: &PgPool,
        clip_id: DbId,
        user_id: DbId,
        voting_batch: &str,
        payment_id: Option<&str>,
    ) -> Result<ClipLike, sqlx::Error> {
        let query = format!(
            "INSERT INTO clip_likes (clip_id, user_id, voting_batch, payment_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ClipLike>(&query)
            .bind(clip_id)
            .bind(user_id)
            .bind(voting_batch)
            .bind(payment_id)
            .fetch_one(pool)
            .await
    }

    /// Attach the settled payment to a reservation. `false` if the
    /// reservation is gone or was already confirmed.
    pub async fn confirm(pool: &PgPool, id: DbId, payment_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE clip_likes SET payment_id = $2 WHERE id = $1 AND payment_id IS NULL",
        )
        .bind(id)
        .bind(payment_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop a like by ID, e.g. a reservation whose payment failed.
    pub async fn delete_by_id(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM clip_likes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove the caller's like. Returns `true` if a row was removed.
    pub async fn delete(
        pool: &PgPool,
        clip_id: DbId,
        user_id: DbId,
        voting_batch: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM clip_likes WHERE clip_id = $1 AND user_id = $2 AND voting_batch = $3",
        )
        .bind(clip_id)
        .bind(user_id)
        .bind(voting_batch)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of paid likes a clip received in the given round.
    pub async fn count(
        pool: &PgPool,
        clip_id: DbId,
        voting_batch: &str,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM clip_likes
             WHERE clip_id = $1 AND voting_batch = $2 AND payment_id IS NOT NULL",
        )
        .bind(clip_id)
        .bind(voting_batch)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }
}
