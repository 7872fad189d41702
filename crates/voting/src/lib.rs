//! Voting Batch Coordinator.
//!
//! Turns raw vote counts on pending clips into timeline promotions:
//!
//! - [`VotingCoordinator::assign_unbatched`] groups new submissions into a
//!   time-boxed batch per project.
//! - [`VotingCoordinator::evaluate_batch`] decides a closed batch, promotes
//!   at most one clip and carries the rest into a fresh round.
//! - [`VotingCoordinator::check_expired_batches`] sweeps every open batch
//!   and evaluates those whose window has passed.
//! - [`VotingCoordinator::approve_clip`] / [`VotingCoordinator::reject_clip`]
//!   are the manual curation path sharing the same promotion logic.
//!
//! All persistence goes through [`VotingStore`]; [`PgVotingStore`] is the
//! production implementation.

pub mod coordinator;
pub mod error;
pub mod notifications;
pub mod promotion;
pub mod store;

pub use coordinator::{BatchEvaluation, BatchFailure, ExpirySweep, NewBatch, VotingCoordinator};
pub use error::VotingError;
pub use promotion::{Actor, Promotion};
pub use store::{PgVotingStore, VotingStore};
