//! In-memory [`VotingStore`] for coordinator tests.
//!
//! Mirrors the conditional semantics of the PostgreSQL store, counts every
//! successful row write (lease bookkeeping excluded), and can be told to
//! fail specific operations.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use montage_core::changelog::{approved_description, ACTION_APPROVED_CLIP};
use montage_core::clip_status::{STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED};
use montage_core::types::{DbId, Timestamp};
use montage_core::voting::is_unbatched;
use montage_db::models::changelog::{ChangelogEntry, CreateChangelogEntry};
use montage_db::models::chat_message::ChatMessage;
use montage_db::models::pending_clip::{BatchSummary, PendingClip, PromotedClip};
use montage_db::models::video_clip::VideoClip;
use montage_voting::{VotingError, VotingStore};

/// Fixed reference instant so tests are deterministic.
pub fn epoch() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

#[derive(Default)]
struct State {
    clips: Vec<PendingClip>,
    timeline: Vec<VideoClip>,
    changelog: Vec<ChangelogEntry>,
    messages: Vec<ChatMessage>,
    claims: HashMap<String, (String, Timestamp)>,
    writes: usize,
    failing_ops: HashSet<&'static str>,
    failing_batches: HashSet<String>,
    next_id: DbId,
}

impl State {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    /// Insert a pending clip. Later inserts are newer.
    pub fn add_clip(
        &self,
        project_id: DbId,
        name: &str,
        votes: i32,
        batch: Option<&str>,
        ends_at: Option<Timestamp>,
    ) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let created_at = epoch() - Duration::days(2) + Duration::seconds(id);
        state.clips.push(PendingClip {
            id,
            project_id,
            user_id: Some(100),
            user_name: "submitter".to_string(),
            user_avatar: None,
            name: name.to_string(),
            src: format!("https://cdn.example.com/{name}.mp4"),
            thumbnail: Some(format!("https://cdn.example.com/{name}.jpg")),
            duration: 4.0 + id as f64,
            votes,
            status: STATUS_PENDING.to_string(),
            voting_batch: batch.map(str::to_string),
            voting_rank: None,
            voting_ends_at: ends_at,
            created_at,
            updated_at: created_at,
        });
        id
    }

    /// Insert an existing timeline clip for a project.
    pub fn add_timeline_clip(&self, project_id: DbId, name: &str) -> DbId {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        let position = next_position(&state.timeline, project_id);
        state.timeline.push(VideoClip {
            id,
            project_id,
            pending_clip_id: None,
            name: name.to_string(),
            src: format!("https://cdn.example.com/{name}.mp4"),
            thumbnail: None,
            position,
            start_time: 0.0,
            duration: 3.0,
            effects: serde_json::json!([]),
            created_at: epoch(),
            updated_at: epoch(),
        });
        id
    }

    /// Record a lease held by `owner` since `at`.
    pub fn hold_claim(&self, token: &str, owner: &str, at: Timestamp) {
        let mut state = self.state.lock().unwrap();
        state
            .claims
            .insert(token.to_string(), (owner.to_string(), at));
    }

    /// Make every call of `op` fail.
    pub fn fail_on(&self, op: &'static str) {
        self.state.lock().unwrap().failing_ops.insert(op);
    }

    /// Let `op` succeed again.
    pub fn recover(&self, op: &'static str) {
        self.state.lock().unwrap().failing_ops.remove(op);
    }

    /// Make reading the members of `token` fail.
    pub fn fail_batch(&self, token: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_batches
            .insert(token.to_string());
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn clip(&self, id: DbId) -> PendingClip {
        self.state
            .lock()
            .unwrap()
            .clips
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .expect("clip should exist")
    }

    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn timeline(&self, project_id: DbId) -> Vec<VideoClip> {
        let state = self.state.lock().unwrap();
        let mut clips: Vec<_> = state
            .timeline
            .iter()
            .filter(|c| c.project_id == project_id)
            .cloned()
            .collect();
        clips.sort_by_key(|c| c.position);
        clips
    }

    pub fn changelog(&self, project_id: DbId) -> Vec<ChangelogEntry> {
        let state = self.state.lock().unwrap();
        state
            .changelog
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn messages(&self, project_id: DbId) -> Vec<ChatMessage> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect()
    }

    pub fn approved_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state
            .clips
            .iter()
            .filter(|c| c.status == STATUS_APPROVED)
            .count()
    }

    pub fn has_claim(&self, token: &str) -> bool {
        self.state.lock().unwrap().claims.contains_key(token)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn check(&self, state: &State, op: &'static str) -> Result<(), VotingError> {
        if state.failing_ops.contains(op) {
            return Err(VotingError::Database(sqlx::Error::Protocol(format!(
                "injected failure in {op}"
            ))));
        }
        Ok(())
    }

    fn transition(
        &self,
        op: &'static str,
        clip_id: DbId,
        to: &str,
    ) -> Result<Option<PendingClip>, VotingError> {
        let mut state = self.state.lock().unwrap();
        self.check(&state, op)?;
        let Some(clip) = state
            .clips
            .iter_mut()
            .find(|c| c.id == clip_id && c.status == STATUS_PENDING)
        else {
            return Ok(None);
        };
        clip.status = to.to_string();
        let clip = clip.clone();
        state.writes += 1;
        Ok(Some(clip))
    }
}

fn next_position(timeline: &[VideoClip], project_id: DbId) -> i32 {
    timeline
        .iter()
        .filter(|c| c.project_id == project_id)
        .map(|c| c.position + 1)
        .max()
        .unwrap_or(0)
}

impl VotingStore for MemoryStore {
    async fn list_unbatched_pending(&self) -> Result<Vec<PendingClip>, VotingError> {
        let state = self.state.lock().unwrap();
        self.check(&state, "list_unbatched_pending")?;
        Ok(state
            .clips
            .iter()
            .filter(|c| c.status == STATUS_PENDING && is_unbatched(c.voting_batch.as_deref()))
            .cloned()
            .collect())
    }

    async fn stamp_batch(
        &self,
        clip_id: DbId,
        token: &str,
        ends_at: Timestamp,
    ) -> Result<bool, VotingError> {
        let mut state = self.state.lock().unwrap();
        self.check(&state, "stamp_batch")?;
        let Some(clip) = state.clips.iter_mut().find(|c| {
            c.id == clip_id && c.status == STATUS_PENDING && is_unbatched(c.voting_batch.as_deref())
        }) else {
            return Ok(false);
        };
        clip.voting_batch = Some(token.to_string());
        clip.voting_ends_at = Some(ends_at);
        state.writes += 1;
        Ok(true)
    }

    async fn list_batches(&self) -> Result<Vec<BatchSummary>, VotingError> {
        let state = self.state.lock().unwrap();
        self.check(&state, "list_batches")?;
        let mut groups: BTreeMap<(DbId, String), BatchSummary> = BTreeMap::new();
        for clip in state.clips.iter().filter(|c| c.status == STATUS_PENDING) {
            let Some(token) = clip.voting_batch.as_deref() else {
                continue;
            };
            if is_unbatched(Some(token)) {
                continue;
            }
            let summary = groups
                .entry((clip.project_id, token.to_string()))
                .or_insert_with(|| BatchSummary {
                    project_id: clip.project_id,
                    voting_batch: token.to_string(),
                    clip_count: 0,
                    voting_ends_at: None,
                });
            summary.clip_count += 1;
            summary.voting_ends_at = summary.voting_ends_at.max(clip.voting_ends_at);
        }
        Ok(groups.into_values().collect())
    }

    async fn list_batch_clips(
        &self,
        project_id: DbId,
        token: &str,
    ) -> Result<Vec<PendingClip>, VotingError> {
        let state = self.state.lock().unwrap();
        self.check(&state, "list_batch_clips")?;
        if state.failing_batches.contains(token) {
            return Err(VotingError::Database(sqlx::Error::Protocol(format!(
                "injected failure reading {token}"
            ))));
        }
        let mut clips: Vec<_> = state
            .clips
            .iter()
            .filter(|c| {
                c.project_id == project_id
                    && c.status == STATUS_PENDING
                    && c.voting_batch.as_deref() == Some(token)
            })
            .cloned()
            .collect();
        clips.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(clips)
    }

    async fn set_rank(&self, clip_id: DbId, rank: Option<i32>) -> Result<bool, VotingError> {
        let mut state = self.state.lock().unwrap();
        self.check(&state, "set_rank")?;
        let Some(clip) = state
            .clips
            .iter_mut()
            .find(|c| c.id == clip_id && c.status == STATUS_PENDING)
        else {
            return Ok(false);
        };
        clip.voting_rank = rank;
        state.writes += 1;
        Ok(true)
    }

    async fn mark_rejected(&self, clip_id: DbId) -> Result<Option<PendingClip>, VotingError> {
        self.transition("mark_rejected", clip_id, STATUS_REJECTED)
    }

    async fn promote_clip(
        &self,
        clip_id: DbId,
        actor_id: Option<DbId>,
        actor_name: &str,
    ) -> Result<Option<PromotedClip>, VotingError> {
        let mut state = self.state.lock().unwrap();
        self.check(&state, "promote_clip")?;
        let Some(index) = state
            .clips
            .iter()
            .position(|c| c.id == clip_id && c.status == STATUS_PENDING)
        else {
            return Ok(None);
        };
        if state
            .timeline
            .iter()
            .any(|c| c.pending_clip_id == Some(clip_id))
        {
            return Err(VotingError::Database(sqlx::Error::Protocol(
                "duplicate key value violates unique constraint \"uq_video_clips_pending_clip\""
                    .to_string(),
            )));
        }

        state.clips[index].status = STATUS_APPROVED.to_string();
        let clip = state.clips[index].clone();

        let id = state.next_id();
        let position = next_position(&state.timeline, clip.project_id);
        let timeline_clip = VideoClip {
            id,
            project_id: clip.project_id,
            pending_clip_id: Some(clip.id),
            name: clip.name.clone(),
            src: clip.src.clone(),
            thumbnail: clip.thumbnail.clone(),
            position,
            start_time: 0.0,
            duration: clip.duration,
            effects: serde_json::json!([]),
            created_at: epoch(),
            updated_at: epoch(),
        };
        state.timeline.push(timeline_clip.clone());

        let id = state.next_id();
        let changelog = ChangelogEntry {
            id,
            project_id: clip.project_id,
            user_id: actor_id,
            user_name: actor_name.to_string(),
            action: ACTION_APPROVED_CLIP.to_string(),
            description: approved_description(&clip.name),
            created_at: epoch(),
        };
        state.changelog.push(changelog.clone());
        state.writes += 3;

        Ok(Some(PromotedClip {
            clip,
            timeline_clip,
            changelog,
        }))
    }

    async fn rebatch(
        &self,
        clip_id: DbId,
        from_token: &str,
        token: &str,
        ends_at: Timestamp,
    ) -> Result<bool, VotingError> {
        let mut state = self.state.lock().unwrap();
        self.check(&state, "rebatch")?;
        let Some(clip) = state.clips.iter_mut().find(|c| {
            c.id == clip_id
                && c.status == STATUS_PENDING
                && c.voting_batch.as_deref() == Some(from_token)
        }) else {
            return Ok(false);
        };
        clip.voting_batch = Some(token.to_string());
        clip.voting_ends_at = Some(ends_at);
        clip.votes = 0;
        clip.voting_rank = None;
        state.writes += 1;
        Ok(true)
    }

    async fn append_changelog(
        &self,
        entry: &CreateChangelogEntry,
    ) -> Result<ChangelogEntry, VotingError> {
        let mut state = self.state.lock().unwrap();
        self.check(&state, "append_changelog")?;
        let id = state.next_id();
        let row = ChangelogEntry {
            id,
            project_id: entry.project_id,
            user_id: entry.user_id,
            user_name: entry.user_name.clone(),
            action: entry.action.clone(),
            description: entry.description.clone(),
            created_at: epoch(),
        };
        state.changelog.push(row.clone());
        state.writes += 1;
        Ok(row)
    }

    async fn post_system_message(
        &self,
        project_id: DbId,
        content: &str,
    ) -> Result<ChatMessage, VotingError> {
        let mut state = self.state.lock().unwrap();
        self.check(&state, "post_system_message")?;
        let id = state.next_id();
        let row = ChatMessage {
            id,
            project_id,
            user_id: None,
            user_name: "System".to_string(),
            user_avatar: None,
            content: content.to_string(),
            created_at: epoch(),
        };
        state.messages.push(row.clone());
        state.writes += 1;
        Ok(row)
    }

    async fn claim_batch(
        &self,
        token: &str,
        owner: &str,
        now: Timestamp,
        lease: Duration,
    ) -> Result<bool, VotingError> {
        let mut state = self.state.lock().unwrap();
        self.check(&state, "claim_batch")?;
        if let Some((holder, at)) = state.claims.get(token) {
            if holder != owner && *at >= now - lease {
                return Ok(false);
            }
        }
        state
            .claims
            .insert(token.to_string(), (owner.to_string(), now));
        Ok(true)
    }

    async fn release_batch(&self, token: &str, owner: &str) -> Result<bool, VotingError> {
        let mut state = self.state.lock().unwrap();
        self.check(&state, "release_batch")?;
        let held = matches!(state.claims.get(token), Some((holder, _)) if holder == owner);
        if held {
            state.claims.remove(token);
        }
        Ok(held)
    }
}
