//! Repository for the `voting_batch_claims` lease table.

use chrono::Duration;
use montage_core::types::Timestamp;
use sqlx::PgPool;

/// Per-batch evaluation leases.
///
/// A claim is granted when no row exists for the token, when the existing
/// row belongs to the same owner, or when the existing row is older than
/// the lease window.
pub struct BatchClaimRepo;

impl BatchClaimRepo {
    /// Try to take the evaluation lease for `token`. Returns `true` on success.
    pub async fn try_claim(
        pool: &PgPool,
        token: &str,
        owner: &str,
        now: Timestamp,
        lease: Duration,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO voting_batch_claims (batch_token, claimed_by, claimed_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (batch_token) DO UPDATE
             SET claimed_by = EXCLUDED.claimed_by, claimed_at = EXCLUDED.claimed_at
             WHERE voting_batch_claims.claimed_by = $2
                OR voting_batch_claims.claimed_at < $4",
        )
        .bind(token)
        .bind(owner)
        .bind(now)
        .bind(now - lease)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop the lease if `owner` still holds it.
    pub async fn release(pool: &PgPool, token: &str, owner: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM voting_batch_claims WHERE batch_token = $1 AND claimed_by = $2",
        )
        .bind(token)
        .bind(owner)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
