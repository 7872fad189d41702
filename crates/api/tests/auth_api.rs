//! HTTP-level tests for Pi sign-in and the `AuthUser` extractor.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, get_auth, post_json, post_json_auth};
use montage_db::repositories::{PendingClipRepo, UserRepo};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn pi_login_issues_token_and_reports_balance(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let response = post_json(
        app,
        "/api/v1/auth/pi",
        serde_json::json!({ "access_token": "mock-pi-token" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert!(json["data"]["access_token"].is_string());
    assert_eq!(json["data"]["token_type"], "Bearer");
    assert_eq!(json["data"]["token_balance"], 10.0);
    assert_eq!(json["data"]["user"]["username"], "DemoUser");
    assert_eq!(json["data"]["user"]["pi_uid"], "demo123");

    let id = json["data"]["user"]["id"].as_i64().unwrap();
    let stored = UserRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(stored.token_balance, 10.0);
    assert!(stored.last_login_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn repeated_login_reuses_the_user(pool: PgPool) {
    let app = common::build_test_app(pool);

    let first = post_json(app.clone(), "/api/v1/auth/pi", serde_json::json!({ "access_token": "dev:u-1:alice" })).await;
    let second = post_json(app, "/api/v1/auth/pi", serde_json::json!({ "access_token": "dev:u-1:alice" })).await;

    let a = body_json(first).await;
    let b = body_json(second).await;
    assert_eq!(a["data"]["user"]["id"], b["data"]["user"]["id"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_pi_token_is_bad_request(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(app, "/api/v1/auth/pi", serde_json::json!({ "access_token": "" })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn me_returns_signed_in_user(pool: PgPool) {
    let app = common::build_test_app(pool);
    let token = common::login(app.clone(), "dev:u-9:bob").await;

    let response = get_auth(app, "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], "bob");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_token_is_401(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/auth/me").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_token_rejects_before_any_write(pool: PgPool) {
    let app = common::build_test_app(pool.clone());

    let response = post_json_auth(
        app,
        "/api/v1/projects/1/pending-clips",
        serde_json::json!({ "name": "Intro", "src": "https://cdn.example.com/a.mp4", "duration": 4.0 }),
        "not-a-jwt",
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let clips = PendingClipRepo::list_by_project(&pool, 1, None).await.unwrap();
    assert!(clips.is_empty());
}
