//! Timeline clip constants and validation.
//!
//! Times are in seconds. A clip plays `duration` seconds of its media
//! starting at `start_time`; trimming narrows that window.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum seconds of content that must remain after trimming.
pub const MIN_TRIMMED_DURATION_SECS: f64 = 0.5;

/// Maximum clips accepted in a single reorder request.
pub const MAX_REORDER_BATCH: usize = 500;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a clip duration supplied on create.
pub fn validate_duration(duration: f64) -> Result<(), CoreError> {
    if !duration.is_finite() || duration <= 0.0 {
        return Err(CoreError::Validation(format!(
            "duration must be a positive number of seconds, got {duration}"
        )));
    }
    Ok(())
}

/// Validate trim points against a clip's current window.
///
/// Checks:
/// - `start >= 0`
/// - `end - start >= MIN_TRIMMED_DURATION_SECS`
/// - `end <= current_start + current_duration`
///
/// Returns the new duration (`end - start`).
pub fn validate_trim(
    start: f64,
    end: f64,
    current_start: f64,
    current_duration: f64,
) -> Result<f64, CoreError> {
    if !start.is_finite() || !end.is_finite() {
        return Err(CoreError::Validation(
            "trim points must be finite numbers".to_string(),
        ));
    }
    if start < 0.0 {
        return Err(CoreError::Validation(format!(
            "start_time must be >= 0, got {start}"
        )));
    }
    let trimmed = end - start;
    if trimmed < MIN_TRIMMED_DURATION_SECS {
        return Err(CoreError::Validation(format!(
            "Trimmed duration ({trimmed:.2}s) is below minimum of {MIN_TRIMMED_DURATION_SECS}s"
        )));
    }
    let limit = current_start + current_duration;
    if end > limit {
        return Err(CoreError::Validation(format!(
            "end_time ({end}) exceeds clip end ({limit})"
        )));
    }
    Ok(trimmed)
}

/// Validate a reorder request.
///
/// Every clip may appear once, positions must be non-negative and unique.
pub fn validate_reorder(entries: &[(DbId, i32)]) -> Result<(), CoreError> {
    if entries.is_empty() {
        return Err(CoreError::Validation(
            "Reorder request must contain at least one clip".to_string(),
        ));
    }
    if entries.len() > MAX_REORDER_BATCH {
        return Err(CoreError::Validation(format!(
            "Reorder request exceeds maximum of {MAX_REORDER_BATCH} clips"
        )));
    }

    let mut ids = HashSet::new();
    let mut positions = HashSet::new();
    for &(id, position) in entries {
        if position < 0 {
            return Err(CoreError::Validation(format!(
                "position must be >= 0, got {position} for clip {id}"
            )));
        }
        if !ids.insert(id) {
            return Err(CoreError::Validation(format!(
                "Clip {id} appears more than once"
            )));
        }
        if !positions.insert(position) {
            return Err(CoreError::Validation(format!(
                "Position {position} is assigned to more than one clip"
            )));
        }
    }
    Ok(())
}
