//! Pending clip lifecycle constants and transition checks.
//!
//! A community-submitted clip starts as `pending` and ends in exactly one of
//! the two terminal states. Both terminal states are reachable from `pending`
//! at any time, whether or not the clip currently belongs to a voting batch.

use crate::error::CoreError;

/// Clip is awaiting curation (manual decision or batch vote).
pub const STATUS_PENDING: &str = "pending";

/// Clip was promoted onto the project timeline.
pub const STATUS_APPROVED: &str = "approved";

/// Clip was declined by a collaborator.
pub const STATUS_REJECTED: &str = "rejected";

/// All valid status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_PENDING, STATUS_APPROVED, STATUS_REJECTED];

/// Validate that a status string is one of the accepted values.
pub fn validate_status(status: &str) -> Result<(), CoreError> {
    if VALID_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid clip status '{status}'. Must be one of: {}",
            VALID_STATUSES.join(", ")
        )))
    }
}

/// Whether a clip may move from `from` to `to`.
///
/// Only `pending` has outgoing transitions; approved and rejected are final.
pub fn can_transition(from: &str, to: &str) -> bool {
    from == STATUS_PENDING && (to == STATUS_APPROVED || to == STATUS_REJECTED)
}

/// Validate a status transition, returning a conflict for invalid ones.
pub fn validate_transition(from: &str, to: &str) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Clip cannot move from '{from}' to '{to}'"
        )))
    }
}
