//! Coordinator behaviour against the in-memory store:
//! - Batch assignment and its no-op cases
//! - Batch evaluation scenarios and invariants
//! - Lease handling and failure isolation
//! - Manual approve/reject

mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::Duration;
use montage_core::changelog::{
    ACTION_APPROVED_CLIP, ACTION_BATCH_COMPLETED, ACTION_REJECTED_CLIP, SYSTEM_ACTOR_NAME,
};
use montage_core::clip_status::{STATUS_APPROVED, STATUS_PENDING, STATUS_REJECTED};
use montage_core::error::CoreError;
use montage_core::voting::{batch_created_at, VotingConfig};
use montage_events::{EventBus, PlatformEvent, ToastVariant};
use montage_voting::{Actor, VotingCoordinator, VotingError};
use tokio::sync::broadcast;

use common::{epoch, MemoryStore};

const PROJECT: i64 = 1;
const OTHER_PROJECT: i64 = 2;
const BATCH: &str = "batch_1717156800000_0badc0de";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn coordinator(store: &MemoryStore) -> (VotingCoordinator<MemoryStore>, Arc<EventBus>) {
    let bus = Arc::new(EventBus::default());
    let coordinator = VotingCoordinator::new(store.clone(), bus.clone(), VotingConfig::default())
        .with_owner("test-node");
    (coordinator, bus)
}

fn expired() -> Option<chrono::DateTime<chrono::Utc>> {
    Some(epoch() - Duration::minutes(1))
}

fn drain(rx: &mut broadcast::Receiver<PlatformEvent>) -> Vec<PlatformEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn toast_titles(events: &[PlatformEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| e.as_toast())
        .map(|t| t.title)
        .collect()
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_unbatched_set_performs_zero_writes() {
    let store = MemoryStore::new();
    store.add_clip(PROJECT, "already", 3, Some(BATCH), expired());
    let (coordinator, bus) = coordinator(&store);
    let mut rx = bus.subscribe();

    let created = coordinator.assign_unbatched(epoch()).await.unwrap();

    assert!(created.is_empty());
    assert_eq!(store.writes(), 0);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn assignment_never_touches_batched_clips() {
    let store = MemoryStore::new();
    let batched = store.add_clip(PROJECT, "batched", 4, Some(BATCH), expired());
    let fresh = store.add_clip(PROJECT, "fresh", 0, None, None);
    let sentinel = store.add_clip(PROJECT, "sentinel", 0, Some("unbatched"), None);
    let (coordinator, _bus) = coordinator(&store);

    let created = coordinator.assign_unbatched(epoch()).await.unwrap();

    assert_eq!(created.len(), 1);
    let batch = &created[0];
    assert_eq!(batch.clip_ids, vec![fresh, sentinel]);
    assert_eq!(batch.ends_at, epoch() + Duration::hours(24));
    assert_eq!(batch_created_at(&batch.batch_token), Some(epoch()));

    let untouched = store.clip(batched);
    assert_eq!(untouched.voting_batch.as_deref(), Some(BATCH));
    assert_eq!(untouched.votes, 4);
    assert_eq!(untouched.voting_ends_at, expired());

    for id in [fresh, sentinel] {
        let clip = store.clip(id);
        assert_eq!(clip.voting_batch.as_deref(), Some(batch.batch_token.as_str()));
        assert_eq!(clip.voting_ends_at, Some(batch.ends_at));
    }
}

#[tokio::test]
async fn assignment_is_idempotent() {
    let store = MemoryStore::new();
    store.add_clip(PROJECT, "a", 0, None, None);
    let (coordinator, _bus) = coordinator(&store);

    coordinator.assign_unbatched(epoch()).await.unwrap();
    let writes = store.writes();
    let second = coordinator
        .assign_unbatched(epoch() + Duration::seconds(60))
        .await
        .unwrap();

    assert!(second.is_empty());
    assert_eq!(store.writes(), writes);
}

#[tokio::test]
async fn each_project_gets_its_own_batch() {
    let store = MemoryStore::new();
    store.add_clip(PROJECT, "a", 0, None, None);
    store.add_clip(OTHER_PROJECT, "b", 0, None, None);
    let (coordinator, bus) = coordinator(&store);
    let mut rx = bus.subscribe();

    let created = coordinator.assign_unbatched(epoch()).await.unwrap();

    assert_eq!(created.len(), 2);
    assert_ne!(created[0].batch_token, created[1].batch_token);
    let toasts: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter(|e| e.as_toast().is_some())
        .map(|e| e.project_id)
        .collect();
    assert_eq!(toasts, vec![PROJECT, OTHER_PROJECT]);
}

// ---------------------------------------------------------------------------
// Evaluation scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn leader_is_approved_and_others_move_to_a_new_round() {
    let store = MemoryStore::new();
    let c = store.add_clip(PROJECT, "C", 5, Some(BATCH), expired());
    let b = store.add_clip(PROJECT, "B", 6, Some(BATCH), expired());
    let a = store.add_clip(PROJECT, "A", 10, Some(BATCH), expired());
    let (coordinator, bus) = coordinator(&store);
    let mut rx = bus.subscribe();

    let evaluation = coordinator
        .evaluate_batch(PROJECT, BATCH, epoch())
        .await
        .unwrap()
        .expect("batch should be evaluated");

    // A approved and on the timeline.
    assert_eq!(evaluation.outcome.winner, Some(a));
    assert_eq!(evaluation.outcome.ranked, vec![(a, 1), (b, 2)]);
    assert_eq!(store.clip(a).status, STATUS_APPROVED);
    let timeline = store.timeline(PROJECT);
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0].pending_clip_id, Some(a));

    // B ranked but not promoted; B and C rebatched with votes reset.
    let next = evaluation.next_batch.clone().expect("remaining clips rebatched");
    assert_ne!(next, BATCH);
    assert_eq!(evaluation.rebatched, 2);
    for id in [b, c] {
        let clip = store.clip(id);
        assert_eq!(clip.status, STATUS_PENDING);
        assert_eq!(clip.votes, 0);
        assert_eq!(clip.voting_rank, None);
        assert_eq!(clip.voting_batch.as_deref(), Some(next.as_str()));
        assert_eq!(clip.voting_ends_at, Some(epoch() + Duration::hours(24)));
    }

    // Audit trail and announcement.
    let log = store.changelog(PROJECT);
    let actions: Vec<_> = log.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, vec![ACTION_APPROVED_CLIP, ACTION_BATCH_COMPLETED]);
    assert!(log.iter().all(|e| e.user_id.is_none() && e.user_name == SYSTEM_ACTOR_NAME));
    assert_eq!(log[1].description, "Voting batch completed, 1 clips approved");
    let messages = store.messages(PROJECT);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].content.contains("\"A\""));

    assert_eq!(
        toast_titles(&drain(&mut rx)),
        vec!["New voting round started", "Voting batch evaluated"]
    );
    assert!(!store.has_claim(BATCH), "lease released after evaluation");
}

#[tokio::test]
async fn lone_clip_below_threshold_is_carried_over() {
    let store = MemoryStore::new();
    let d = store.add_clip(PROJECT, "D", 2, Some(BATCH), expired());
    let (coordinator, _bus) = coordinator(&store);

    let evaluation = coordinator
        .evaluate_batch(PROJECT, BATCH, epoch())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(evaluation.approved_count(), 0);
    assert!(store.timeline(PROJECT).is_empty());
    assert!(store.messages(PROJECT).is_empty());

    let clip = store.clip(d);
    assert_eq!(clip.status, STATUS_PENDING);
    assert_eq!(clip.votes, 0);
    assert_ne!(clip.voting_batch.as_deref(), Some(BATCH));

    let log = store.changelog(PROJECT);
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].description, "Voting batch completed, 0 clips approved");
}

#[tokio::test]
async fn at_most_one_clip_is_approved_per_batch() {
    let store = MemoryStore::new();
    let ids: Vec<_> = (0..12)
        .map(|i| store.add_clip(PROJECT, &format!("clip{i}"), 20, Some(BATCH), expired()))
        .collect();
    let (coordinator, _bus) = coordinator(&store);

    let evaluation = coordinator
        .evaluate_batch(PROJECT, BATCH, epoch())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(store.approved_count(), 1);
    // Equal votes keep fetch order, which is newest first.
    assert_eq!(evaluation.outcome.winner, ids.last().copied());
    assert_eq!(evaluation.rebatched, 11);
    for id in &ids[..11] {
        assert_eq!(store.clip(*id).votes, 0);
    }
}

#[tokio::test]
async fn winner_keeps_media_and_duration_on_timeline() {
    let store = MemoryStore::new();
    store.add_timeline_clip(PROJECT, "intro");
    let a = store.add_clip(PROJECT, "A", 9, Some(BATCH), expired());
    let (coordinator, _bus) = coordinator(&store);

    coordinator.evaluate_batch(PROJECT, BATCH, epoch()).await.unwrap();

    let pending = store.clip(a);
    let placed = store.timeline(PROJECT).pop().unwrap();
    assert_eq!(placed.position, 1);
    assert_eq!(placed.src, pending.src);
    assert_eq!(placed.start_time, 0.0);
    assert!((placed.duration - pending.duration).abs() < f64::EPSILON);
}

#[tokio::test]
async fn empty_batch_writes_nothing() {
    let store = MemoryStore::new();
    let (coordinator, _bus) = coordinator(&store);

    let evaluation = coordinator.evaluate_batch(PROJECT, BATCH, epoch()).await.unwrap();

    assert!(evaluation.is_none());
    assert_eq!(store.writes(), 0);
    assert!(!store.has_claim(BATCH));
}

// ---------------------------------------------------------------------------
// Concurrency and failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn held_lease_skips_evaluation() {
    let store = MemoryStore::new();
    let a = store.add_clip(PROJECT, "A", 10, Some(BATCH), expired());
    store.hold_claim(BATCH, "other-node", epoch() - Duration::minutes(1));
    let (coordinator, _bus) = coordinator(&store);

    let evaluation = coordinator.evaluate_batch(PROJECT, BATCH, epoch()).await.unwrap();

    assert!(evaluation.is_none());
    assert_eq!(store.writes(), 0);
    assert_eq!(store.clip(a).status, STATUS_PENDING);
}

#[tokio::test]
async fn stale_lease_is_taken_over() {
    let store = MemoryStore::new();
    store.add_clip(PROJECT, "A", 10, Some(BATCH), expired());
    store.hold_claim(BATCH, "crashed-node", epoch() - Duration::minutes(30));
    let (coordinator, _bus) = coordinator(&store);

    let evaluation = coordinator.evaluate_batch(PROJECT, BATCH, epoch()).await.unwrap();

    assert!(evaluation.is_some());
    assert_eq!(store.approved_count(), 1);
}

#[tokio::test]
async fn concurrent_evaluators_approve_once() {
    let store = MemoryStore::new();
    store.add_clip(PROJECT, "A", 10, Some(BATCH), expired());
    store.add_clip(PROJECT, "B", 7, Some(BATCH), expired());
    let bus = Arc::new(EventBus::default());
    let first = VotingCoordinator::new(store.clone(), bus.clone(), VotingConfig::default())
        .with_owner("node-a");
    let second = VotingCoordinator::new(store.clone(), bus, VotingConfig::default())
        .with_owner("node-b");

    let (r1, r2) = tokio::join!(
        first.evaluate_batch(PROJECT, BATCH, epoch()),
        second.evaluate_batch(PROJECT, BATCH, epoch()),
    );

    let evaluated = [r1.unwrap(), r2.unwrap()]
        .into_iter()
        .filter(Option::is_some)
        .count();
    assert_eq!(evaluated, 1);
    assert_eq!(store.approved_count(), 1);
    assert_eq!(store.timeline(PROJECT).len(), 1);
}

#[tokio::test]
async fn failure_releases_lease_and_notifies_project() {
    let store = MemoryStore::new();
    store.add_clip(PROJECT, "A", 10, Some(BATCH), expired());
    store.add_clip(PROJECT, "B", 1, Some(BATCH), expired());
    store.fail_on("rebatch");
    let (coordinator, bus) = coordinator(&store);
    let mut rx = bus.subscribe();

    let err = coordinator
        .evaluate_batch(PROJECT, BATCH, epoch())
        .await
        .unwrap_err();

    assert_matches!(err, VotingError::Database(_));
    assert!(!store.has_claim(BATCH));
    let changelog = store.changelog(PROJECT);
    assert!(
        changelog.iter().all(|e| e.action != ACTION_BATCH_COMPLETED),
        "remaining steps are skipped after a failure"
    );
    let toast = drain(&mut rx)
        .iter()
        .filter_map(|e| e.as_toast())
        .last()
        .expect("failure toast");
    assert_eq!(toast.variant, ToastVariant::Destructive);
}

#[tokio::test]
async fn failed_promotion_keeps_winner_pending_for_next_tick() {
    let store = MemoryStore::new();
    let a = store.add_clip(PROJECT, "A", 10, Some(BATCH), expired());
    store.fail_on("promote_clip");
    let (coordinator, _bus) = coordinator(&store);

    let err = coordinator
        .evaluate_batch(PROJECT, BATCH, epoch())
        .await
        .unwrap_err();
    assert_matches!(err, VotingError::Database(_));
    assert_eq!(store.clip(a).status, STATUS_PENDING);
    assert!(store.timeline(PROJECT).is_empty());
    assert!(store.changelog(PROJECT).is_empty());

    store.recover("promote_clip");
    let evaluation = coordinator
        .evaluate_batch(PROJECT, BATCH, epoch())
        .await
        .unwrap()
        .expect("batch should be evaluated on retry");
    assert_eq!(evaluation.outcome.winner, Some(a));
    assert_eq!(store.clip(a).status, STATUS_APPROVED);
    assert_eq!(store.timeline(PROJECT).len(), 1);
}

#[tokio::test]
async fn announcement_failure_does_not_abort_evaluation() {
    let store = MemoryStore::new();
    let a = store.add_clip(PROJECT, "A", 10, Some(BATCH), expired());
    store.fail_on("post_system_message");
    let (coordinator, _bus) = coordinator(&store);

    let evaluation = coordinator
        .evaluate_batch(PROJECT, BATCH, epoch())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(evaluation.outcome.winner, Some(a));
    assert_eq!(store.clip(a).status, STATUS_APPROVED);
    assert_eq!(store.changelog(PROJECT).len(), 2);
}

// ---------------------------------------------------------------------------
// Expiry sweep
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sweep_evaluates_only_expired_batches() {
    let store = MemoryStore::new();
    let open = "batch_1717243200000_00000001";
    let a = store.add_clip(PROJECT, "A", 10, Some(BATCH), expired());
    let later = store.add_clip(PROJECT, "later", 10, Some(open), Some(epoch() + Duration::hours(3)));
    let (coordinator, _bus) = coordinator(&store);

    let sweep = coordinator.check_expired_batches(epoch()).await.unwrap();

    assert_eq!(sweep.evaluated.len(), 1);
    assert!(sweep.failures.is_empty());
    assert_eq!(store.clip(a).status, STATUS_APPROVED);
    let untouched = store.clip(later);
    assert_eq!(untouched.status, STATUS_PENDING);
    assert_eq!(untouched.votes, 10);
}

#[tokio::test]
async fn sweep_continues_past_a_failing_batch() {
    let store = MemoryStore::new();
    let broken = "batch_1717070400000_deadbeef";
    store.add_clip(PROJECT, "stuck", 10, Some(broken), expired());
    let b = store.add_clip(OTHER_PROJECT, "B", 10, Some(BATCH), expired());
    store.fail_batch(broken);
    let (coordinator, bus) = coordinator(&store);
    let mut rx = bus.subscribe();

    let sweep = coordinator.check_expired_batches(epoch()).await.unwrap();

    assert_eq!(sweep.failures.len(), 1);
    assert_eq!(sweep.failures[0].project_id, PROJECT);
    assert_eq!(sweep.evaluated.len(), 1);
    assert_eq!(store.clip(b).status, STATUS_APPROVED);

    let failure_toasts: Vec<_> = drain(&mut rx)
        .into_iter()
        .filter(|e| {
            e.as_toast()
                .is_some_and(|t| t.variant == ToastVariant::Destructive)
        })
        .map(|e| e.project_id)
        .collect();
    assert_eq!(failure_toasts, vec![PROJECT]);
}

// ---------------------------------------------------------------------------
// Manual curation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn manual_approval_round_trip() {
    let store = MemoryStore::new();
    store.add_timeline_clip(PROJECT, "intro");
    store.add_timeline_clip(PROJECT, "middle");
    let id = store.add_clip(PROJECT, "community", 0, Some(BATCH), expired());
    let (coordinator, _bus) = coordinator(&store);

    let promotion = coordinator
        .approve_clip(id, &Actor::user(7, "alice"))
        .await
        .unwrap();

    let pending = store.clip(id);
    assert_eq!(pending.status, STATUS_APPROVED);
    assert_eq!(promotion.timeline_clip.position, 2);
    assert_eq!(promotion.timeline_clip.src, pending.src);
    assert!((promotion.timeline_clip.duration - pending.duration).abs() < f64::EPSILON);
    assert_eq!(promotion.changelog.user_id, Some(7));
    assert_eq!(promotion.changelog.description, "Approved community clip: community");
}

#[tokio::test]
async fn deciding_twice_is_a_conflict() {
    let store = MemoryStore::new();
    let id = store.add_clip(PROJECT, "community", 0, None, None);
    let (coordinator, _bus) = coordinator(&store);
    let actor = Actor::user(7, "alice");

    coordinator.approve_clip(id, &actor).await.unwrap();

    assert_matches!(
        coordinator.approve_clip(id, &actor).await,
        Err(VotingError::Core(CoreError::Conflict(_)))
    );
    assert_matches!(
        coordinator.reject_clip(id, &actor).await,
        Err(VotingError::Core(CoreError::Conflict(_)))
    );
    assert_eq!(store.timeline(PROJECT).len(), 1);
}

#[tokio::test]
async fn manual_rejection_records_changelog() {
    let store = MemoryStore::new();
    let id = store.add_clip(PROJECT, "meh", 1, None, None);
    let (coordinator, _bus) = coordinator(&store);

    let (clip, entry) = coordinator
        .reject_clip(id, &Actor::user(3, "bob"))
        .await
        .unwrap();

    assert_eq!(clip.status, STATUS_REJECTED);
    assert_eq!(entry.action, ACTION_REJECTED_CLIP);
    assert_eq!(entry.description, "Rejected community clip: meh");
    assert!(store.timeline(PROJECT).is_empty());
}
