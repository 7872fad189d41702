//! In-memory Pi platform for local development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::client::PiPlatform;
use crate::error::PiError;
use crate::types::{PaymentRequest, PaymentStatus, PaymentTransaction, PiPayment, PiUser};

pub const DEV_USERNAME: &str = "DemoUser";
pub const DEV_UID: &str = "demo123";
pub const DEV_BALANCE: f64 = 10.0;

/// Deterministic stand-in for the Pi platform.
///
/// Any non-empty access token authenticates as `DemoUser` (`demo123`) unless
/// the token has the form `dev:<uid>:<username>`, which lets tests log in
/// as several distinct users. Payments settle instantly.
pub struct DevPiPlatform {
    balance: f64,
    fail_payments: bool,
    payments: Mutex<HashMap<String, PiPayment>>,
}

impl DevPiPlatform {
    pub fn new() -> Self {
        Self::with_balance(DEV_BALANCE)
    }

    /// Report `balance` for every user.
    pub fn with_balance(balance: f64) -> Self {
        Self {
            balance,
            fail_payments: false,
            payments: Mutex::new(HashMap::new()),
        }
    }

    /// Make every `submit_payment` fail, to exercise cancellation.
    pub fn failing_payments(mut self) -> Self {
        self.fail_payments = true;
        self
    }

    /// Snapshot of a payment, for assertions.
    pub async fn payment(&self, payment_id: &str) -> Option<PiPayment> {
        self.payments.lock().await.get(payment_id).cloned()
    }

    /// Every payment created so far, in no particular order.
    pub async fn payments(&self) -> Vec<PiPayment> {
        self.payments.lock().await.values().cloned().collect()
    }

    async fn update<F>(&self, payment_id: &str, apply: F) -> Result<PiPayment, PiError>
    where
        F: FnOnce(&mut PiPayment) -> Result<(), PiError>,
    {
        let mut payments = self.payments.lock().await;
        let payment = payments.get_mut(payment_id).ok_or_else(|| PiError::Api {
            status: 404,
            message: format!("payment {payment_id} not found"),
        })?;
        apply(payment)?;
        Ok(payment.clone())
    }
}

impl Default for DevPiPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PiPlatform for DevPiPlatform {
    async fn authenticate(&self, access_token: &str) -> Result<PiUser, PiError> {
        if access_token.trim().is_empty() {
            return Err(PiError::NotAuthenticated);
        }
        if let Some(rest) = access_token.strip_prefix("dev:") {
            if let Some((uid, username)) = rest.split_once(':') {
                return Ok(PiUser {
                    uid: uid.to_string(),
                    username: username.to_string(),
                });
            }
        }
        Ok(PiUser {
            uid: DEV_UID.to_string(),
            username: DEV_USERNAME.to_string(),
        })
    }

    async fn token_balance(&self, _uid: &str) -> Result<f64, PiError> {
        Ok(self.balance)
    }

    async fn create_payment(&self, request: &PaymentRequest) -> Result<PiPayment, PiError> {
        let payment = PiPayment {
            identifier: format!("dev_pay_{}", uuid::Uuid::new_v4().simple()),
            amount: request.amount,
            memo: request.memo.clone(),
            metadata: request.metadata.clone(),
            user_uid: request.uid.clone(),
            status: PaymentStatus::default(),
            transaction: None,
        };
        self.payments
            .lock()
            .await
            .insert(payment.identifier.clone(), payment.clone());
        Ok(payment)
    }

    async fn submit_payment(&self, payment_id: &str) -> Result<PiPayment, PiError> {
        let fail = self.fail_payments;
        self.update(payment_id, |payment| {
            if fail {
                return Err(PiError::Api {
                    status: 400,
                    message: "payment rejected by development platform".to_string(),
                });
            }
            payment.status.developer_approved = true;
            payment.status.transaction_verified = true;
            payment.transaction = Some(PaymentTransaction {
                txid: format!("dev_tx_{}", payment.identifier),
                verified: true,
            });
            Ok(())
        })
        .await
    }

    async fn complete_payment(&self, payment_id: &str, txid: &str) -> Result<PiPayment, PiError> {
        self.update(payment_id, |payment| {
            if payment.txid() != Some(txid) {
                return Err(PiError::InvalidResponse(format!(
                    "txid {txid} does not match payment {}",
                    payment.identifier
                )));
            }
            payment.status.developer_completed = true;
            Ok(())
        })
        .await
    }

    async fn cancel_payment(&self, payment_id: &str) -> Result<PiPayment, PiError> {
        self.update(payment_id, |payment| {
            payment.status.cancelled = true;
            Ok(())
        })
        .await
    }
}
