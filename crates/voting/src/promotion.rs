//! Approving and rejecting pending clips.
//!
//! The batch winner and a collaborator's manual approval go through the
//! same [`VotingCoordinator::promote`] path, so both leave identical traces:
//! the clip becomes `approved`, a timeline clip is appended with the
//! pending record's media and duration, and an "approved clip" changelog
//! entry is written. The store commits those three writes together, so a
//! failed promotion leaves the clip pending for the next attempt.

use montage_core::changelog::{rejected_description, ACTION_REJECTED_CLIP, SYSTEM_ACTOR_NAME};
use montage_core::error::CoreError;
use montage_core::types::DbId;
use montage_db::models::changelog::{ChangelogEntry, CreateChangelogEntry};
use montage_db::models::pending_clip::PendingClip;
use montage_events::topics::{TABLE_PENDING_CLIPS, TABLE_PROJECT_CHANGELOG, TABLE_VIDEO_CLIPS};
use montage_events::{ChangeKind, PlatformEvent};
use serde::Serialize;

/// Everything written by a successful approval.
pub use montage_db::models::pending_clip::PromotedClip as Promotion;

use crate::coordinator::VotingCoordinator;
use crate::error::VotingError;
use crate::store::VotingStore;

/// Who performed a curation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// `None` for the coordinator itself.
    pub user_id: Option<DbId>,
    pub name: String,
}

impl Actor {
    pub fn system() -> Self {
        Self {
            user_id: None,
            name: SYSTEM_ACTOR_NAME.to_string(),
        }
    }

    pub fn user(user_id: DbId, name: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            name: name.into(),
        }
    }
}

impl<S: VotingStore> VotingCoordinator<S> {
    /// Manually approve a pending clip.
    ///
    /// Returns a conflict if the clip is no longer pending.
    pub async fn approve_clip(&self, clip_id: DbId, actor: &Actor) -> Result<Promotion, VotingError> {
        self.promote(clip_id, actor).await?.ok_or_else(|| no_longer_pending(clip_id))
    }

    /// Manually reject a pending clip.
    ///
    /// Returns a conflict if the clip is no longer pending.
    pub async fn reject_clip(
        &self,
        clip_id: DbId,
        actor: &Actor,
    ) -> Result<(PendingClip, ChangelogEntry), VotingError> {
        let clip = self
            .store
            .mark_rejected(clip_id)
            .await?
            .ok_or_else(|| no_longer_pending(clip_id))?;
        self.publish_change(TABLE_PENDING_CLIPS, ChangeKind::Update, clip.project_id, &clip);

        let entry = self
            .record(clip.project_id, actor, ACTION_REJECTED_CLIP, rejected_description(&clip.name))
            .await?;

        tracing::info!(clip_id, project_id = clip.project_id, actor = %actor.name, "Clip rejected");
        Ok((clip, entry))
    }

    /// Approve `clip_id` and append it to the timeline.
    ///
    /// `None` means the compare-and-set lost: another caller already
    /// approved or rejected the clip, and nothing was written.
    pub(crate) async fn promote(
        &self,
        clip_id: DbId,
        actor: &Actor,
    ) -> Result<Option<Promotion>, VotingError> {
        let Some(promotion) = self
            .store
            .promote_clip(clip_id, actor.user_id, &actor.name)
            .await?
        else {
            return Ok(None);
        };
        let Promotion {
            clip,
            timeline_clip,
            changelog,
        } = &promotion;
        self.publish_change(TABLE_PENDING_CLIPS, ChangeKind::Update, clip.project_id, clip);
        self.publish_change(TABLE_VIDEO_CLIPS, ChangeKind::Insert, clip.project_id, timeline_clip);
        self.publish_change(TABLE_PROJECT_CHANGELOG, ChangeKind::Insert, clip.project_id, changelog);

        tracing::info!(
            clip_id,
            project_id = clip.project_id,
            position = timeline_clip.position,
            actor = %actor.name,
            "Clip promoted to timeline",
        );
        Ok(Some(promotion))
    }

    /// Append a changelog entry and announce it.
    pub(crate) async fn record(
        &self,
        project_id: DbId,
        actor: &Actor,
        action: &str,
        description: String,
    ) -> Result<ChangelogEntry, VotingError> {
        let entry = self
            .store
            .append_changelog(&CreateChangelogEntry {
                project_id,
                user_id: actor.user_id,
                user_name: actor.name.clone(),
                action: action.to_string(),
                description,
            })
            .await?;
        self.publish_change(TABLE_PROJECT_CHANGELOG, ChangeKind::Insert, project_id, &entry);
        Ok(entry)
    }

    pub(crate) fn publish_change<T: Serialize>(
        &self,
        table: &str,
        change: ChangeKind,
        project_id: DbId,
        record: &T,
    ) {
        self.events
            .publish(PlatformEvent::change(table, change, project_id).with_record(record));
    }
}

fn no_longer_pending(clip_id: DbId) -> VotingError {
    VotingError::Core(CoreError::Conflict(format!(
        "Clip {clip_id} is no longer pending"
    )))
}
