//! User entity model and DTOs.

use montage_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A user row from the `users` table.
///
/// Users are created on first Pi authentication and refreshed on each
/// subsequent login.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub pi_uid: String,
    pub username: String,
    /// Last Pi balance reported by the platform.
    pub token_balance: f64,
    pub last_login_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Identity data returned by the Pi platform at login.
#[derive(Debug, Clone)]
pub struct UpsertPiUser {
    pub pi_uid: String,
    pub username: String,
    pub token_balance: f64,
}
