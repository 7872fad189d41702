//! Pi platform wire types.

use serde::{Deserialize, Serialize};

/// Identity returned by `GET /v2/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiUser {
    pub uid: String,
    pub username: String,
}

/// Body of a payment creation request.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentRequest {
    pub amount: f64,
    pub memo: String,
    pub metadata: serde_json::Value,
    /// Pi uid of the paying user.
    pub uid: String,
}

/// Lifecycle flags reported by the platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatus {
    #[serde(default)]
    pub developer_approved: bool,
    #[serde(default)]
    pub transaction_verified: bool,
    #[serde(default)]
    pub developer_completed: bool,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub user_cancelled: bool,
}

/// On-chain transaction attached once a payment is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub txid: String,
    #[serde(default)]
    pub verified: bool,
}

/// A payment as reported by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiPayment {
    pub identifier: String,
    pub amount: f64,
    pub memo: String,
    #[serde(default)]
    pub metadata: serde_json::Value,
    #[serde(default)]
    pub user_uid: String,
    #[serde(default)]
    pub status: PaymentStatus,
    pub transaction: Option<PaymentTransaction>,
}

impl PiPayment {
    /// Transaction id, once the payment reached the chain.
    pub fn txid(&self) -> Option<&str> {
        self.transaction.as_ref().map(|t| t.txid.as_str())
    }

    pub fn is_completed(&self) -> bool {
        self.status.developer_completed
    }
}
