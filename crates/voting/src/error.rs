use montage_core::error::CoreError;

/// Errors raised while coordinating votes.
#[derive(Debug, thiserror::Error)]
pub enum VotingError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}
