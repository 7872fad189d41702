//! Toasts published to a project's realtime subscribers.

use montage_events::Toast;

pub fn batch_created(clip_count: usize) -> Toast {
    Toast::info(
        "New voting batch created",
        format!("{clip_count} clips are now open for voting"),
    )
}

pub fn round_started(clip_count: usize) -> Toast {
    Toast::info(
        "New voting round started",
        format!("{clip_count} clips have been moved to the next voting round"),
    )
}

pub fn batch_evaluated(approved: usize) -> Toast {
    let description = if approved > 0 {
        "Top clips have been automatically approved"
    } else {
        "No clips met the voting threshold"
    };
    Toast::info("Voting batch evaluated", description)
}

pub fn batch_creation_failed() -> Toast {
    Toast::error("Error", "Failed to create voting batch")
}

pub fn evaluation_failed() -> Toast {
    Toast::error("Error", "Failed to evaluate voting batch")
}

#[cfg(test)]
mod tests {
    use montage_events::ToastVariant;

    use super::*;

    #[test]
    fn evaluated_toast_reflects_approvals() {
        assert_eq!(
            batch_evaluated(1).description,
            "Top clips have been automatically approved"
        );
        assert_eq!(
            batch_evaluated(0).description,
            "No clips met the voting threshold"
        );
    }

    #[test]
    fn failures_are_destructive() {
        assert_eq!(evaluation_failed().variant, ToastVariant::Destructive);
        assert_eq!(batch_created(2).variant, ToastVariant::Default);
    }
}
