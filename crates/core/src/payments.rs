//! Pi-denominated vote pricing.

use serde_json::json;

use crate::types::DbId;

/// Minimum Pi balance a user needs before casting a vote.
pub const MIN_TOKEN_BALANCE_TO_VOTE: f64 = 1.0;

/// Micro-payment charged for each new vote.
pub const VOTE_PRICE: f64 = 0.01;

/// Metadata `type` tag attached to vote payments.
pub const PAYMENT_TYPE_VOTE: &str = "vote";

/// Whether a balance covers the voting floor.
pub fn has_enough_to_vote(balance: f64) -> bool {
    balance >= MIN_TOKEN_BALANCE_TO_VOTE
}

/// Payment memo shown to the user in the wallet.
pub fn vote_memo(clip_name: &str) -> String {
    format!("Vote for clip: {clip_name}")
}

/// Metadata stored with a vote payment.
pub fn vote_metadata(clip_id: DbId) -> serde_json::Value {
    json!({ "type": PAYMENT_TYPE_VOTE, "clip_id": clip_id })
}
