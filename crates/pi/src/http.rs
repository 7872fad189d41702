//! REST client for the Pi platform API.
//!
//! Identity calls authenticate with the user's access token
//! (`Authorization: Bearer`); payment calls authenticate with the app's
//! server key (`Authorization: Key`).

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::client::PiPlatform;
use crate::config::PiConfig;
use crate::error::PiError;
use crate::types::{PaymentRequest, PiPayment, PiUser};

/// HTTP implementation of [`PiPlatform`].
pub struct HttpPiPlatform {
    client: reqwest::Client,
    api_base_url: String,
    api_key: String,
    default_balance: f64,
}

impl HttpPiPlatform {
    /// Build a client from configuration. Requires `api_key`.
    pub fn new(config: &PiConfig) -> Result<Self, PiError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| PiError::InvalidResponse("PI_API_KEY is required".to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_base_url: config.api_base_url.clone(),
            api_key,
            default_balance: config.default_balance,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v2{path}", self.api_base_url)
    }

    async fn post_payment(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<PiPayment, PiError> {
        let response = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Key {}", self.api_key))
            .json(&body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Map non-2xx responses to [`PiError::Api`] and decode the body.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, PiError> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PiError::NotAuthenticated);
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PiError::Api {
                status: status.as_u16(),
                message,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| PiError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PiPlatform for HttpPiPlatform {
    async fn authenticate(&self, access_token: &str) -> Result<PiUser, PiError> {
        let response = self
            .client
            .get(self.url("/me"))
            .bearer_auth(access_token)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn token_balance(&self, uid: &str) -> Result<f64, PiError> {
        tracing::debug!(uid, balance = self.default_balance, "Reporting configured Pi balance");
        Ok(self.default_balance)
    }

    async fn create_payment(&self, request: &PaymentRequest) -> Result<PiPayment, PiError> {
        self.post_payment("/payments", serde_json::json!({ "payment": request }))
            .await
    }

    async fn submit_payment(&self, payment_id: &str) -> Result<PiPayment, PiError> {
        self.post_payment(
            &format!("/payments/{payment_id}/approve"),
            serde_json::json!({}),
        )
        .await
    }

    async fn complete_payment(&self, payment_id: &str, txid: &str) -> Result<PiPayment, PiError> {
        self.post_payment(
            &format!("/payments/{payment_id}/complete"),
            serde_json::json!({ "txid": txid }),
        )
        .await
    }

    async fn cancel_payment(&self, payment_id: &str) -> Result<PiPayment, PiError> {
        self.post_payment(
            &format!("/payments/{payment_id}/cancel"),
            serde_json::json!({}),
        )
        .await
    }
}
