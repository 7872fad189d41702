//! Handlers for Pi sign-in.

use axum::extract::State;
use axum::Json;
use montage_core::error::CoreError;
use montage_db::models::user::{UpsertPiUser, User};
use montage_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::generate_access_token;
use crate::auth::ROLE_USER;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /auth/pi`.
#[derive(Debug, Deserialize)]
pub struct PiLoginRequest {
    /// Access token obtained by the Pi SDK in the browser.
    pub access_token: String,
}

/// Successful sign-in.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    /// Seconds until `access_token` expires.
    pub expires_in: i64,
    pub user: User,
    pub token_balance: f64,
}

/// POST /api/v1/auth/pi
///
/// Verify a Pi access token, refresh the stored balance and issue our own
/// JWT.
pub async fn pi_login(
    State(state): State<AppState>,
    Json(input): Json<PiLoginRequest>,
) -> AppResult<Json<DataResponse<LoginResponse>>> {
    if input.access_token.trim().is_empty() {
        return Err(AppError::BadRequest("access_token is required".into()));
    }

    let pi_user = state.pi.authenticate(&input.access_token).await?;
    let token_balance = state.pi.token_balance(&pi_user.uid).await?;

    let user = UserRepo::upsert_from_pi(
        &state.pool,
        &UpsertPiUser {
            pi_uid: pi_user.uid,
            username: pi_user.username,
            token_balance,
        },
    )
    .await?;

    let jwt = &state.config.jwt;
    let access_token = generate_access_token(user.id, ROLE_USER, &user.username, jwt)
        .map_err(|e| AppError::InternalError(format!("Failed to sign token: {e}")))?;

    tracing::info!(user_id = user.id, username = %user.username, token_balance, "Pi user signed in");

    Ok(Json(DataResponse {
        data: LoginResponse {
            access_token,
            token_type: "Bearer",
            expires_in: jwt.access_token_expiry_mins * 60,
            token_balance: user.token_balance,
            user,
        },
    }))
}

/// GET /api/v1/auth/me
pub async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<User>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    Ok(Json(DataResponse { data: user }))
}
