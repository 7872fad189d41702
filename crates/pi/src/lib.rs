//! Pi Network identity and payment integration.
//!
//! The rest of the workspace talks to the Pi platform only through the
//! object-safe [`PiPlatform`] trait, held as `Arc<dyn PiPlatform>`:
//!
//! - [`HttpPiPlatform`] calls the Pi platform REST API with the app's
//!   server API key.
//! - [`DevPiPlatform`] is a deterministic in-memory stand-in used when no
//!   API key is configured.

pub mod client;
pub mod config;
pub mod dev;
pub mod error;
pub mod http;
pub mod types;

use std::sync::Arc;

pub use client::PiPlatform;
pub use config::PiConfig;
pub use dev::DevPiPlatform;
pub use error::PiError;
pub use http::HttpPiPlatform;
pub use types::{PaymentRequest, PaymentStatus, PaymentTransaction, PiPayment, PiUser};

/// Build the platform client for `config`.
///
/// Falls back to [`DevPiPlatform`] when no API key is set.
pub fn build_platform(config: &PiConfig) -> Result<Arc<dyn PiPlatform>, PiError> {
    match &config.api_key {
        Some(_) => Ok(Arc::new(HttpPiPlatform::new(config)?)),
        None => {
            tracing::warn!("PI_API_KEY not set, using the development Pi platform");
            Ok(Arc::new(DevPiPlatform::new()))
        }
    }
}
