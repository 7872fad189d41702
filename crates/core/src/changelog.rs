//! Changelog and chat vocabulary shared by manual and automatic curation.

/// Display name used for entries and messages written by the coordinator.
pub const SYSTEM_ACTOR_NAME: &str = "System";

/// Fallback display name for users without a Pi username.
pub const ANONYMOUS_ACTOR_NAME: &str = "Anonymous";

pub const ACTION_APPROVED_CLIP: &str = "approved clip";
pub const ACTION_REJECTED_CLIP: &str = "rejected clip";
pub const ACTION_BATCH_COMPLETED: &str = "batch completed";
pub const ACTION_ADDED_CLIP: &str = "added clip";
pub const ACTION_REMOVED_CLIP: &str = "removed clip";

pub fn approved_description(clip_name: &str) -> String {
    format!("Approved community clip: {clip_name}")
}

pub fn rejected_description(clip_name: &str) -> String {
    format!("Rejected community clip: {clip_name}")
}

pub fn added_description(clip_name: &str) -> String {
    format!("Added clip to timeline: {clip_name}")
}

pub fn removed_description(clip_name: &str) -> String {
    format!("Removed clip from timeline: {clip_name}")
}

/// Completion note for an evaluated batch.
pub fn batch_completed_description(approved: usize) -> String {
    format!("Voting batch completed, {approved} clips approved")
}

/// Chat announcement posted when a batch winner reaches the timeline.
pub fn winner_announcement(clip_name: &str) -> String {
    format!("\u{1F3C6} Community vote winner: \"{clip_name}\" has been added to the project timeline!")
}
