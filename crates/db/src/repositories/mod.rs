//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod batch_claim_repo;
pub mod changelog_repo;
pub mod chat_message_repo;
pub mod clip_like_repo;
pub mod pending_clip_repo;
pub mod project_repo;
pub mod user_repo;
pub mod video_clip_repo;

pub use batch_claim_repo::BatchClaimRepo;
pub use changelog_repo::ChangelogRepo;
pub use chat_message_repo::ChatMessageRepo;
pub use clip_like_repo::ClipLikeRepo;
pub use pending_clip_repo::PendingClipRepo;
pub use project_repo::ProjectRepo;
pub use user_repo::UserRepo;
pub use video_clip_repo::VideoClipRepo;
