//! Authentication primitives.
//!
//! - [`jwt`] -- JWT access-token generation and validation.
//!
//! Identity itself comes from the Pi platform: `POST /auth/pi` exchanges a
//! Pi access token for one of our JWTs.

pub mod jwt;

/// Role carried by every Pi-authenticated session.
pub const ROLE_USER: &str = "user";
