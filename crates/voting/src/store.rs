//! Persistence seam for the coordinator.
//!
//! Every mutating call is conditional: stamping only touches unbatched
//! clips, status changes only succeed from `pending`, rebatching only moves
//! clips still in the expected batch. Callers learn about lost races from
//! the `bool`/`Option` results instead of errors.

use chrono::Duration;
use montage_core::changelog::SYSTEM_ACTOR_NAME;
use montage_core::types::{DbId, Timestamp};
use montage_db::models::changelog::{ChangelogEntry, CreateChangelogEntry};
use montage_db::models::chat_message::ChatMessage;
use montage_db::models::pending_clip::{BatchSummary, PendingClip, PromotedClip};
use montage_db::repositories::{BatchClaimRepo, ChangelogRepo, ChatMessageRepo, PendingClipRepo};
use montage_db::DbPool;

use crate::error::VotingError;

/// Storage operations the coordinator depends on.
pub trait VotingStore: Send + Sync {
    /// Pending clips without a batch, across all projects.
    fn list_unbatched_pending(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<PendingClip>, VotingError>> + Send;

    /// Put an unbatched clip into `token`. `false` if it was already batched.
    fn stamp_batch(
        &self,
        clip_id: DbId,
        token: &str,
        ends_at: Timestamp,
    ) -> impl std::future::Future<Output = Result<bool, VotingError>> + Send;

    /// Every open batch with its window end.
    fn list_batches(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<BatchSummary>, VotingError>> + Send;

    /// Pending members of a batch, newest first.
    fn list_batch_clips(
        &self,
        project_id: DbId,
        token: &str,
    ) -> impl std::future::Future<Output = Result<Vec<PendingClip>, VotingError>> + Send;

    fn set_rank(
        &self,
        clip_id: DbId,
        rank: Option<i32>,
    ) -> impl std::future::Future<Output = Result<bool, VotingError>> + Send;

    /// Approve a pending clip, append it to the timeline and log the
    /// approval as one atomic step. `None` if the clip was not pending.
    fn promote_clip(
        &self,
        clip_id: DbId,
        actor_id: Option<DbId>,
        actor_name: &str,
    ) -> impl std::future::Future<Output = Result<Option<PromotedClip>, VotingError>> + Send;

    /// `pending -> rejected`. `None` if the clip was not pending.
    fn mark_rejected(
        &self,
        clip_id: DbId,
    ) -> impl std::future::Future<Output = Result<Option<PendingClip>, VotingError>> + Send;

    /// Move a clip from `from_token` to `token`, resetting votes and rank.
    fn rebatch(
        &self,
        clip_id: DbId,
        from_token: &str,
        token: &str,
        ends_at: Timestamp,
    ) -> impl std::future::Future<Output = Result<bool, VotingError>> + Send;

    fn append_changelog(
        &self,
        entry: &CreateChangelogEntry,
    ) -> impl std::future::Future<Output = Result<ChangelogEntry, VotingError>> + Send;

    /// Post a chat message authored by the system.
    fn post_system_message(
        &self,
        project_id: DbId,
        content: &str,
    ) -> impl std::future::Future<Output = Result<ChatMessage, VotingError>> + Send;

    /// Take the evaluation lease for `token`. `false` if someone else holds
    /// an unexpired lease.
    fn claim_batch(
        &self,
        token: &str,
        owner: &str,
        now: Timestamp,
        lease: Duration,
    ) -> impl std::future::Future<Output = Result<bool, VotingError>> + Send;

    fn release_batch(
        &self,
        token: &str,
        owner: &str,
    ) -> impl std::future::Future<Output = Result<bool, VotingError>> + Send;
}

// ---------------------------------------------------------------------------
// PostgreSQL implementation
// ---------------------------------------------------------------------------

/// [`VotingStore`] backed by the `montage-db` repositories.
#[derive(Clone)]
pub struct PgVotingStore {
    pool: DbPool,
}

impl PgVotingStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl VotingStore for PgVotingStore {
    async fn list_unbatched_pending(&self) -> Result<Vec<PendingClip>, VotingError> {
        Ok(PendingClipRepo::list_unbatched_pending(&self.pool).await?)
    }

    async fn stamp_batch(
        &self,
        clip_id: DbId,
        token: &str,
        ends_at: Timestamp,
    ) -> Result<bool, VotingError> {
        Ok(PendingClipRepo::stamp_batch(&self.pool, clip_id, token, ends_at).await?)
    }

    async fn list_batches(&self) -> Result<Vec<BatchSummary>, VotingError> {
        Ok(PendingClipRepo::list_batches(&self.pool, None).await?)
    }

    async fn list_batch_clips(
        &self,
        project_id: DbId,
        token: &str,
    ) -> Result<Vec<PendingClip>, VotingError> {
        Ok(PendingClipRepo::list_batch_clips(&self.pool, project_id, token).await?)
    }

    async fn set_rank(&self, clip_id: DbId, rank: Option<i32>) -> Result<bool, VotingError> {
        Ok(PendingClipRepo::set_rank(&self.pool, clip_id, rank).await?)
    }

    async fn promote_clip(
        &self,
        clip_id: DbId,
        actor_id: Option<DbId>,
        actor_name: &str,
    ) -> Result<Option<PromotedClip>, VotingError> {
        Ok(PendingClipRepo::promote(&self.pool, clip_id, actor_id, actor_name).await?)
    }

    async fn mark_rejected(&self, clip_id: DbId) -> Result<Option<PendingClip>, VotingError> {
        Ok(PendingClipRepo::mark_rejected(&self.pool, clip_id).await?)
    }

    async fn rebatch(
        &self,
        clip_id: DbId,
        from_token: &str,
        token: &str,
        ends_at: Timestamp,
    ) -> Result<bool, VotingError> {
        Ok(PendingClipRepo::rebatch(&self.pool, clip_id, from_token, token, ends_at).await?)
    }

    async fn append_changelog(
        &self,
        entry: &CreateChangelogEntry,
    ) -> Result<ChangelogEntry, VotingError> {
        Ok(ChangelogRepo::create(&self.pool, entry).await?)
    }

    async fn post_system_message(
        &self,
        project_id: DbId,
        content: &str,
    ) -> Result<ChatMessage, VotingError> {
        Ok(
            ChatMessageRepo::create(&self.pool, project_id, None, SYSTEM_ACTOR_NAME, None, content)
                .await?,
        )
    }

    async fn claim_batch(
        &self,
        token: &str,
        owner: &str,
        now: Timestamp,
        lease: Duration,
    ) -> Result<bool, VotingError> {
        Ok(BatchClaimRepo::try_claim(&self.pool, token, owner, now, lease).await?)
    }

    async fn release_batch(&self, token: &str, owner: &str) -> Result<bool, VotingError> {
        Ok(BatchClaimRepo::release(&self.pool, token, owner).await?)
    }
}
