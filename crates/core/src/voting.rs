//! Voting batch policy: batch tokens, windows and winner selection.
//!
//! Pending clips are grouped into time-boxed batches. When a batch window
//! closes, [`evaluate_batch`] decides from a snapshot of vote counts which
//! clip (if any) is promoted, which clips earn a rank, and which clips are
//! carried over into a fresh batch. Everything here is pure; the coordinator
//! in `montage-voting` applies the outcome to the store.

use chrono::{DateTime, Duration};
use serde::Serialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Length of a voting window.
pub const DEFAULT_BATCH_DURATION_HOURS: i64 = 24;

/// Minimum votes a clip needs before it can be auto-approved.
pub const DEFAULT_MIN_VOTES: i32 = 3;

/// Fraction of the batch leader's votes a clip needs to qualify.
pub const DEFAULT_PERCENTAGE_THRESHOLD: f64 = 0.6;

/// Maximum clips evaluated per batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;

/// Sentinel some clients write instead of leaving the batch column empty.
pub const UNBATCHED: &str = "unbatched";

const BATCH_TOKEN_PREFIX: &str = "batch_";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Thresholds governing batch evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct VotingConfig {
    /// How long a batch stays open for voting.
    pub batch_duration: Duration,
    /// Absolute vote floor for qualification.
    pub min_votes: i32,
    /// Relative floor, as a fraction of the leader's votes.
    pub percentage_threshold: f64,
    /// Only the first `max_batch_size` clips in rank order are evaluated.
    pub max_batch_size: usize,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            batch_duration: Duration::hours(DEFAULT_BATCH_DURATION_HOURS),
            min_votes: DEFAULT_MIN_VOTES,
            percentage_threshold: DEFAULT_PERCENTAGE_THRESHOLD,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl VotingConfig {
    /// End of a voting window opened at `now`.
    pub fn window_end(&self, now: Timestamp) -> Timestamp {
        now + self.batch_duration
    }

    /// Reject configurations that could never approve anything or that
    /// would approve everything.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.batch_duration <= Duration::zero() {
            return Err(CoreError::Validation(
                "batch_duration must be positive".to_string(),
            ));
        }
        if self.min_votes < 0 {
            return Err(CoreError::Validation(format!(
                "min_votes must be >= 0, got {}",
                self.min_votes
            )));
        }
        if !(0.0..=1.0).contains(&self.percentage_threshold) {
            return Err(CoreError::Validation(format!(
                "percentage_threshold must be within 0.0..=1.0, got {}",
                self.percentage_threshold
            )));
        }
        if self.max_batch_size == 0 {
            return Err(CoreError::Validation(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Batch tokens
// ---------------------------------------------------------------------------

/// Whether a clip's batch column means "not yet batched".
pub fn is_unbatched(batch: Option<&str>) -> bool {
    match batch {
        None => true,
        Some(b) => b.is_empty() || b == UNBATCHED,
    }
}

/// Mint a batch token embedding the creation time.
///
/// Format: `batch_<unix-millis>_<8 hex chars>`. The random suffix keeps two
/// batches minted within the same millisecond apart.
pub fn new_batch_token(now: Timestamp) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{BATCH_TOKEN_PREFIX}{}_{}",
        now.timestamp_millis(),
        &suffix[..8]
    )
}

/// Recover the creation time embedded in a batch token.
///
/// Accepts both the current format and the bare `batch_<millis>` form.
pub fn batch_created_at(token: &str) -> Option<Timestamp> {
    let rest = token.strip_prefix(BATCH_TOKEN_PREFIX)?;
    let millis: i64 = rest.split('_').next()?.parse().ok()?;
    DateTime::from_timestamp_millis(millis)
}

/// Whether a batch window has closed.
///
/// A batch without an end time never expires.
pub fn is_expired(ends_at: Option<Timestamp>, now: Timestamp) -> bool {
    ends_at.is_some_and(|end| end < now)
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Vote snapshot for one clip of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ballot {
    pub clip_id: DbId,
    pub votes: i32,
}

/// Result of evaluating one batch snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Highest vote count in the snapshot (0 for an empty batch).
    pub leader_votes: i32,
    /// Clip promoted to the timeline. Always the rank-1 clip when present.
    pub winner: Option<DbId>,
    /// Every qualifying clip with its 1-based rank, winner included.
    pub ranked: Vec<(DbId, i32)>,
    /// Clips moved into the next round, in rank order.
    pub carried_over: Vec<DbId>,
}

/// Whether a clip with `votes` qualifies against the batch leader.
pub fn qualifies(votes: i32, leader_votes: i32, config: &VotingConfig) -> bool {
    votes >= config.min_votes
        && f64::from(votes) >= f64::from(leader_votes) * config.percentage_threshold
}

/// Decide the outcome of a batch.
///
/// Ballots are sorted by votes descending with a stable sort, so equal
/// counts keep the order they were passed in. At most
/// `config.max_batch_size` clips are considered for a rank. Only the clip at
/// index 0 can be promoted; other qualifying clips are ranked and then
/// carried over like everything else.
pub fn evaluate_batch(ballots: &[Ballot], config: &VotingConfig) -> BatchOutcome {
    let mut sorted = ballots.to_vec();
    sorted.sort_by(|a, b| b.votes.cmp(&a.votes));

    let leader_votes = sorted.first().map_or(0, |b| b.votes);
    let mut outcome = BatchOutcome {
        leader_votes,
        ..BatchOutcome::default()
    };

    for (index, ballot) in sorted.iter().enumerate().take(config.max_batch_size) {
        if !qualifies(ballot.votes, leader_votes, config) {
            continue;
        }
        outcome.ranked.push((ballot.clip_id, index as i32 + 1));
        if index == 0 {
            outcome.winner = Some(ballot.clip_id);
        }
    }

    outcome.carried_over = sorted
        .iter()
        .map(|b| b.clip_id)
        .filter(|id| Some(*id) != outcome.winner)
        .collect();

    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
