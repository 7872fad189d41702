//! Repository for the `users` table.

use montage_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::{UpsertPiUser, User};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, pi_uid, username, token_balance, last_login_at, created_at, updated_at";

/// Provides persistence for Pi-authenticated users.
pub struct UserRepo;

impl UserRepo {
    /// Create the user on first login, or refresh username and balance.
    ///
    /// Uses `ON CONFLICT (pi_uid) DO UPDATE` to guarantee one row per Pi uid.
    pub async fn upsert_from_pi(pool: &PgPool, input: &UpsertPiUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (pi_uid, username, token_balance, last_login_at) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (pi_uid) DO UPDATE \
             SET username = EXCLUDED.username, \
                 token_balance = EXCLUDED.token_balance, \
                 last_login_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.pi_uid)
            .bind(&input.username)
            .bind(input.token_balance)
            .fetch_one(pool)
            .await
    }

    /// Find a user by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Store a freshly fetched Pi balance. Returns `None` if the user is gone.
    pub async fn update_balance(
        pool: &PgPool,
        id: DbId,
        token_balance: f64,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET token_balance = $2 WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(token_balance)
            .fetch_optional(pool)
            .await
    }
}
