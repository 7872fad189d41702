//! The Pi platform seam.

use async_trait::async_trait;

use crate::error::PiError;
use crate::types::{PaymentRequest, PiPayment, PiUser};

/// Identity and payment operations against the Pi platform.
///
/// A vote payment runs `create_payment`, `submit_payment` and
/// `complete_payment` in order; any failure after creation should be
/// followed by `cancel_payment`.
#[async_trait]
pub trait PiPlatform: Send + Sync {
    /// Resolve a user's access token to their Pi identity.
    async fn authenticate(&self, access_token: &str) -> Result<PiUser, PiError>;

    /// Spendable balance for `uid`.
    async fn token_balance(&self, uid: &str) -> Result<f64, PiError>;

    async fn create_payment(&self, request: &PaymentRequest) -> Result<PiPayment, PiError>;

    /// Approve a created payment for settlement. The returned payment
    /// carries its transaction once one exists.
    async fn submit_payment(&self, payment_id: &str) -> Result<PiPayment, PiError>;

    async fn complete_payment(&self, payment_id: &str, txid: &str) -> Result<PiPayment, PiError>;

    async fn cancel_payment(&self, payment_id: &str) -> Result<PiPayment, PiError>;
}
