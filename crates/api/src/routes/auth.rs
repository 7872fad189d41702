use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST   /pi      -> pi_login
/// GET    /me      -> me
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pi", post(auth::pi_login))
        .route("/me", get(auth::me))
}
