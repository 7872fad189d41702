//! The voting batch coordinator.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use montage_core::changelog::{
    batch_completed_description, winner_announcement, ACTION_BATCH_COMPLETED,
};
use montage_core::types::{DbId, Timestamp};
use montage_core::voting::{
    evaluate_batch, is_expired, new_batch_token, Ballot, BatchOutcome, VotingConfig,
};
use montage_db::models::pending_clip::PendingClip;
use montage_db::models::video_clip::VideoClip;
use montage_events::topics::{TABLE_PENDING_CLIPS, TABLE_PROJECT_MESSAGES};
use montage_events::{ChangeKind, EventBus};
use serde::Serialize;

use crate::error::VotingError;
use crate::notifications;
use crate::promotion::Actor;
use crate::store::VotingStore;

/// How long an evaluator may hold a batch before others can take over.
pub const DEFAULT_LEASE_MINUTES: i64 = 5;

/// A batch opened by [`VotingCoordinator::assign_unbatched`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBatch {
    pub project_id: DbId,
    pub batch_token: String,
    pub ends_at: Timestamp,
    pub clip_ids: Vec<DbId>,
}

/// Result of evaluating one batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEvaluation {
    pub project_id: DbId,
    pub batch_token: String,
    pub outcome: BatchOutcome,
    /// Timeline clip created for the winner.
    pub approved: Option<VideoClip>,
    /// Token of the round the remaining clips moved into.
    pub next_batch: Option<String>,
    pub rebatched: usize,
}

impl BatchEvaluation {
    pub fn approved_count(&self) -> usize {
        usize::from(self.approved.is_some())
    }
}

/// A batch whose evaluation failed during a sweep.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub project_id: DbId,
    pub batch_token: String,
    pub error: String,
}

/// Result of [`VotingCoordinator::check_expired_batches`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpirySweep {
    pub evaluated: Vec<BatchEvaluation>,
    pub failures: Vec<BatchFailure>,
    /// Expired batches left alone because another evaluator held them.
    pub skipped: usize,
}

/// Applies the voting policy in `montage_core::voting` to stored clips.
pub struct VotingCoordinator<S> {
    pub(crate) store: S,
    pub(crate) events: Arc<EventBus>,
    config: VotingConfig,
    lease: Duration,
    owner: String,
}

impl<S: VotingStore> VotingCoordinator<S> {
    pub fn new(store: S, events: Arc<EventBus>, config: VotingConfig) -> Self {
        Self {
            store,
            events,
            config,
            lease: Duration::minutes(DEFAULT_LEASE_MINUTES),
            owner: format!("coordinator-{}", uuid::Uuid::new_v4().simple()),
        }
    }

    /// Override the evaluation lease length.
    pub fn with_lease(mut self, lease: Duration) -> Self {
        self.lease = lease;
        self
    }

    /// Override the lease owner name (defaults to a random id per process).
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn config(&self) -> &VotingConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // -----------------------------------------------------------------------
    // Assignment
    // -----------------------------------------------------------------------

    /// Put every unbatched pending clip into a new batch for its project.
    ///
    /// Clips that already carry a token are never touched. With nothing
    /// unbatched this performs no writes. A failure in one project is
    /// logged and surfaced to that project; other projects still get their
    /// batch.
    pub async fn assign_unbatched(&self, now: Timestamp) -> Result<Vec<NewBatch>, VotingError> {
        let unbatched = self.store.list_unbatched_pending().await?;
        if unbatched.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_project: BTreeMap<DbId, Vec<PendingClip>> = BTreeMap::new();
        for clip in unbatched {
            by_project.entry(clip.project_id).or_default().push(clip);
        }

        let mut created = Vec::new();
        for (project_id, clips) in by_project {
            match self.open_batch(project_id, &clips, now).await {
                Ok(Some(batch)) => created.push(batch),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(error = %e, project_id, "Failed to create voting batch");
                    self.events
                        .publish_toast(project_id, &notifications::batch_creation_failed());
                }
            }
        }
        Ok(created)
    }

    async fn open_batch(
        &self,
        project_id: DbId,
        clips: &[PendingClip],
        now: Timestamp,
    ) -> Result<Option<NewBatch>, VotingError> {
        let batch_token = new_batch_token(now);
        let ends_at = self.config.window_end(now);

        let mut clip_ids = Vec::with_capacity(clips.len());
        for clip in clips {
            if self.store.stamp_batch(clip.id, &batch_token, ends_at).await? {
                clip_ids.push(clip.id);
                self.publish_change(
                    TABLE_PENDING_CLIPS,
                    ChangeKind::Update,
                    project_id,
                    &serde_json::json!({
                        "id": clip.id,
                        "voting_batch": batch_token,
                        "voting_ends_at": ends_at,
                    }),
                );
            }
        }
        if clip_ids.is_empty() {
            return Ok(None);
        }

        tracing::info!(project_id, %batch_token, clips = clip_ids.len(), "Voting batch created");
        self.events
            .publish_toast(project_id, &notifications::batch_created(clip_ids.len()));
        Ok(Some(NewBatch {
            project_id,
            batch_token,
            ends_at,
            clip_ids,
        }))
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    /// Decide a batch.
    ///
    /// Returns `None` without writing anything when another evaluator holds
    /// the batch lease or the batch has no pending clips left. On failure
    /// the lease is released so the next tick retries, the error is
    /// published as a toast, and the remaining steps are skipped.
    pub async fn evaluate_batch(
        &self,
        project_id: DbId,
        batch_token: &str,
        now: Timestamp,
    ) -> Result<Option<BatchEvaluation>, VotingError> {
        if !self
            .store
            .claim_batch(batch_token, &self.owner, now, self.lease)
            .await?
        {
            tracing::debug!(project_id, batch_token, "Batch is being evaluated elsewhere");
            return Ok(None);
        }

        let result = self.evaluate_claimed(project_id, batch_token, now).await;

        if let Err(e) = self.store.release_batch(batch_token, &self.owner).await {
            tracing::warn!(error = %e, batch_token, "Failed to release batch lease");
        }

        if let Err(e) = &result {
            tracing::error!(error = %e, project_id, batch_token, "Failed to evaluate voting batch");
            self.events
                .publish_toast(project_id, &notifications::evaluation_failed());
        }
        result
    }

    async fn evaluate_claimed(
        &self,
        project_id: DbId,
        batch_token: &str,
        now: Timestamp,
    ) -> Result<Option<BatchEvaluation>, VotingError> {
        let clips = self.store.list_batch_clips(project_id, batch_token).await?;
        if clips.is_empty() {
            return Ok(None);
        }

        let ballots: Vec<Ballot> = clips
            .iter()
            .map(|c| Ballot {
                clip_id: c.id,
                votes: c.votes,
            })
            .collect();
        let outcome = evaluate_batch(&ballots, &self.config);

        for &(clip_id, rank) in &outcome.ranked {
            self.store.set_rank(clip_id, Some(rank)).await?;
        }

        let mut approved = None;
        if let Some(winner) = outcome.winner {
            if let Some(promotion) = self.promote(winner, &Actor::system()).await? {
                self.announce_winner(project_id, &promotion.clip.name).await;
                approved = Some(promotion.timeline_clip);
            } else {
                tracing::warn!(project_id, clip_id = winner, "Batch winner was decided elsewhere");
            }
        }

        let (next_batch, rebatched) = self
            .carry_over(project_id, batch_token, &outcome.carried_over, now)
            .await?;

        let approved_count = usize::from(approved.is_some());
        self.record(
            project_id,
            &Actor::system(),
            ACTION_BATCH_COMPLETED,
            batch_completed_description(approved_count),
        )
        .await?;

        tracing::info!(
            project_id,
            batch_token,
            leader_votes = outcome.leader_votes,
            approved = approved_count,
            rebatched,
            "Voting batch evaluated",
        );
        self.events
            .publish_toast(project_id, &notifications::batch_evaluated(approved_count));

        Ok(Some(BatchEvaluation {
            project_id,
            batch_token: batch_token.to_string(),
            outcome,
            approved,
            next_batch,
            rebatched,
        }))
    }

    /// Move every non-approved clip into a fresh batch with votes reset.
    async fn carry_over(
        &self,
        project_id: DbId,
        from_token: &str,
        clip_ids: &[DbId],
        now: Timestamp,
    ) -> Result<(Option<String>, usize), VotingError> {
        if clip_ids.is_empty() {
            return Ok((None, 0));
        }

        let next_token = new_batch_token(now);
        let ends_at = self.config.window_end(now);
        let mut moved = 0;
        for &clip_id in clip_ids {
            if self
                .store
                .rebatch(clip_id, from_token, &next_token, ends_at)
                .await?
            {
                moved += 1;
                self.publish_change(
                    TABLE_PENDING_CLIPS,
                    ChangeKind::Update,
                    project_id,
                    &serde_json::json!({
                        "id": clip_id,
                        "votes": 0,
                        "voting_batch": next_token,
                        "voting_ends_at": ends_at,
                        "voting_rank": null,
                    }),
                );
            }
        }

        if moved > 0 {
            self.events
                .publish_toast(project_id, &notifications::round_started(moved));
        }
        Ok((Some(next_token), moved))
    }

    /// Post the winner announcement. Failures are logged only.
    async fn announce_winner(&self, project_id: DbId, clip_name: &str) {
        match self
            .store
            .post_system_message(project_id, &winner_announcement(clip_name))
            .await
        {
            Ok(message) => {
                self.publish_change(TABLE_PROJECT_MESSAGES, ChangeKind::Insert, project_id, &message)
            }
            Err(e) => {
                tracing::error!(error = %e, project_id, "Failed to post winner announcement")
            }
        }
    }

    // -----------------------------------------------------------------------
    // Expiry sweep
    // -----------------------------------------------------------------------

    /// Evaluate every batch whose window closed before `now`.
    ///
    /// One batch failing does not stop the others.
    pub async fn check_expired_batches(&self, now: Timestamp) -> Result<ExpirySweep, VotingError> {
        let batches = self.store.list_batches().await?;
        let mut sweep = ExpirySweep::default();

        for batch in batches
            .into_iter()
            .filter(|b| is_expired(b.voting_ends_at, now))
        {
            match self
                .evaluate_batch(batch.project_id, &batch.voting_batch, now)
                .await
            {
                Ok(Some(evaluation)) => sweep.evaluated.push(evaluation),
                Ok(None) => sweep.skipped += 1,
                Err(e) => sweep.failures.push(BatchFailure {
                    project_id: batch.project_id,
                    batch_token: batch.voting_batch,
                    error: e.to_string(),
                }),
            }
        }
        Ok(sweep)
    }
}
