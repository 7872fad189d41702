//! Paid vote toggling on pending clips.
//!
//! A vote counts within the clip's current round (its batch token, or the
//! unbatched round before the first batch). Casting a vote costs
//! [`VOTE_PRICE`] Pi, settled through the Pi platform. The like row is
//! reserved before payment so a second concurrent toggle is refused before
//! it can charge; the reservation only counts once its payment completes.
//! Withdrawing a vote is free and refunds nothing.

use axum::extract::{Path, State};
use axum::Json;
use montage_core::clip_status::STATUS_PENDING;
use montage_core::error::CoreError;
use montage_core::payments::{has_enough_to_vote, vote_memo, vote_metadata, VOTE_PRICE};
use montage_core::types::DbId;
use montage_db::models::pending_clip::PendingClip;
use montage_db::models::user::User;
use montage_db::repositories::{ClipLikeRepo, PendingClipRepo, UserRepo};
use montage_events::topics::TABLE_PENDING_CLIPS;
use montage_events::ChangeKind;
use montage_pi::{PaymentRequest, PiError, PiPlatform};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

use super::pending_clip::ensure_clip_exists;
use super::publish_change;

/// Outcome of `POST /pending-clips/{id}/vote`.
#[derive(Debug, Serialize)]
pub struct VoteResult {
    /// Whether the caller's vote is now in place.
    pub voted: bool,
    pub votes: i32,
    /// Pi payment that paid for the vote. `None` when a vote was withdrawn.
    pub payment_id: Option<String>,
}

/// Response of `GET /pending-clips/{id}/votes`.
#[derive(Debug, Serialize)]
pub struct VoteStatus {
    pub clip_id: DbId,
    /// Paid likes recorded in the clip's current round.
    pub count: i64,
    pub has_voted: bool,
}

/// Round key a like is recorded under.
fn current_round(clip: &PendingClip) -> &str {
    clip.voting_batch.as_deref().unwrap_or("")
}

/// POST /api/v1/pending-clips/{id}/vote
///
/// Toggle the caller's vote. Only pending clips accept votes.
pub async fn toggle(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<VoteResult>>> {
    let clip = ensure_clip_exists(&state.pool, id).await?;
    if clip.status != STATUS_PENDING {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Clip {id} is no longer open for voting"
        ))));
    }
    let round = current_round(&clip).to_string();

    // Existing vote: withdraw it.
    if let Some(like) = ClipLikeRepo::find(&state.pool, id, auth.user_id, &round).await? {
        if like.payment_id.is_none() {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "A vote on clip {id} is already being processed"
            ))));
        }
        if !ClipLikeRepo::delete(&state.pool, id, auth.user_id, &round).await? {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Vote on clip {id} was already withdrawn"
            ))));
        }
        let updated = PendingClipRepo::decrement_votes(&state.pool, id)
            .await?
            .ok_or_else(|| closed_during_vote(id))?;
        publish_change(&state, &auth, TABLE_PENDING_CLIPS, ChangeKind::Update, updated.project_id, &updated);
        tracing::info!(user_id = auth.user_id, clip_id = id, votes = updated.votes, "Vote withdrawn");
        return Ok(Json(DataResponse {
            data: VoteResult {
                voted: false,
                votes: updated.votes,
                payment_id: None,
            },
        }));
    }

    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    if !has_enough_to_vote(user.token_balance) {
        return Err(AppError::Core(CoreError::Forbidden(format!(
            "Insufficient Pi balance to vote ({:.2})",
            user.token_balance
        ))));
    }

    // Unique per (clip, user, round): a concurrent toggle fails here with 409.
    let reservation = ClipLikeRepo::create(&state.pool, id, auth.user_id, &round, None).await?;

    let payment_id = match charge_vote(state.pi.as_ref(), &user, &clip).await {
        Ok(payment_id) => payment_id,
        Err(e) => {
            if let Err(db_err) = ClipLikeRepo::delete_by_id(&state.pool, reservation.id).await {
                tracing::error!(
                    error = %db_err,
                    like_id = reservation.id,
                    "Failed to drop vote reservation"
                );
            }
            return Err(e.into());
        }
    };

    ClipLikeRepo::confirm(&state.pool, reservation.id, &payment_id).await?;
    let updated = PendingClipRepo::increment_votes(&state.pool, id)
        .await?
        .ok_or_else(|| closed_during_vote(id))?;
    UserRepo::update_balance(&state.pool, user.id, user.token_balance - VOTE_PRICE).await?;
    publish_change(&state, &auth, TABLE_PENDING_CLIPS, ChangeKind::Update, updated.project_id, &updated);

    tracing::info!(
        user_id = auth.user_id,
        clip_id = id,
        votes = updated.votes,
        payment_id = %payment_id,
        "Vote cast"
    );

    Ok(Json(DataResponse {
        data: VoteResult {
            voted: true,
            votes: updated.votes,
            payment_id: Some(payment_id),
        },
    }))
}

/// GET /api/v1/pending-clips/{id}/votes
pub async fn status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<VoteStatus>>> {
    let clip = ensure_clip_exists(&state.pool, id).await?;
    let round = current_round(&clip);

    let count = ClipLikeRepo::count(&state.pool, id, round).await?;
    let has_voted = ClipLikeRepo::find(&state.pool, id, auth.user_id, round)
        .await?
        .is_some_and(|like| like.payment_id.is_some());

    Ok(Json(DataResponse {
        data: VoteStatus {
            clip_id: id,
            count,
            has_voted,
        },
    }))
}

/// Pay for one vote. Returns the completed payment's identifier.
///
/// Any failure after the payment exists cancels it.
pub async fn charge_vote(
    pi: &dyn PiPlatform,
    user: &User,
    clip: &PendingClip,
) -> Result<String, PiError> {
    let payment = pi
        .create_payment(&PaymentRequest {
            amount: VOTE_PRICE,
            memo: vote_memo(&clip.name),
            metadata: vote_metadata(clip.id),
            uid: user.pi_uid.clone(),
        })
        .await?;
    let payment_id = payment.identifier;

    if let Err(e) = settle_payment(pi, &payment_id).await {
        tracing::warn!(error = %e, payment_id = %payment_id, clip_id = clip.id, "Vote payment failed, cancelling");
        if let Err(cancel_err) = pi.cancel_payment(&payment_id).await {
            tracing::error!(error = %cancel_err, payment_id = %payment_id, "Failed to cancel vote payment");
        }
        return Err(e);
    }
    Ok(payment_id)
}

async fn settle_payment(pi: &dyn PiPlatform, payment_id: &str) -> Result<(), PiError> {
    let submitted = pi.submit_payment(payment_id).await?;
    let txid = submitted
        .txid()
        .ok_or_else(|| PiError::InvalidResponse(format!("payment {payment_id} has no transaction")))?
        .to_string();
    pi.complete_payment(payment_id, &txid).await?;
    Ok(())
}

fn closed_during_vote(id: DbId) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Clip {id} was decided while the vote was processed"
    )))
}
