//! HTTP-level integration tests for the `/auth` and `/admin/users` endpoints.
//!
//! Covers registration, login (body and cookie), refresh rotation and replay,
//! logout, RBAC enforcement, admin user management and account lockout.

mod common;

use axum::body::Body;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use common::{
    admin_token, body_json, create_user, get, get_auth, login, post_auth, post_json,
    post_json_auth, put_json_auth, EMPLOYEE_ROLE_ID, TEST_PASSWORD,
};
use salesdesk_core::positions::Position;
use salesdesk_db::repositories::UserRepo;
use sqlx::PgPool;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_creates_employee(pool: PgPool) {
    let body = serde_json::json!({
        "username": "newhire",
        "email": "newhire@test.com",
        "password": "a-long-enough-password",
        "position": "JUNIOR_EC",
    });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["username"], "newhire");
    assert_eq!(json["role"], "employee");
    assert_eq!(json["position"], "JUNIOR_EC");
    assert!(json.get("password_hash").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_rejects_short_password(pool: PgPool) {
    let body = serde_json::json!({
        "username": "shorty",
        "email": "shorty@test.com",
        "password": "tooshort",
    });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_duplicate_username_is_409(pool: PgPool) {
    create_user(&pool, "taken", EMPLOYEE_ROLE_ID, None).await;

    let body = serde_json::json!({
        "username": "taken",
        "email": "other@test.com",
        "password": "a-long-enough-password",
    });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/register", body).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Login, cookie session, me
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_returns_tokens_and_sets_cookie(pool: PgPool) {
    let user = create_user(&pool, "rep", EMPLOYEE_ROLE_ID, Some(Position::EnergyConsultant)).await;

    let body = serde_json::json!({ "username": "rep", "password": TEST_PASSWORD });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));

    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert!(json["refresh_token"].is_string());
    assert_eq!(json["expires_in"], 15 * 60);
    assert_eq!(json["user"]["id"], user.id);
    assert_eq!(json["user"]["position"], "ENERGY_CONSULTANT");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn session_cookie_authenticates(pool: PgPool) {
    create_user(&pool, "cookie", EMPLOYEE_ROLE_ID, None).await;

    let body = serde_json::json!({ "username": "cookie", "password": TEST_PASSWORD });
    let response = post_json(common::build_test_app(pool.clone()), "/api/v1/auth/login", body).await;
    let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap();
    let pair = set_cookie.split(';').next().unwrap().to_string();

    let request = Request::builder()
        .uri("/api/v1/auth/me")
        .header(COOKIE, pair)
        .body(Body::empty())
        .unwrap();
    let response = common::build_test_app(pool).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "cookie");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_wrong_password_is_401(pool: PgPool) {
    create_user(&pool, "wrongpw", EMPLOYEE_ROLE_ID, None).await;

    let body = serde_json::json!({ "username": "wrongpw", "password": "not-the-password" });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_unknown_user_is_401(pool: PgPool) {
    let body = serde_json::json!({ "username": "ghost", "password": "whatever" });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_deactivated_user_is_403(pool: PgPool) {
    let user = create_user(&pool, "gone", EMPLOYEE_ROLE_ID, None).await;
    UserRepo::deactivate(&pool, user.id).await.unwrap();

    let body = serde_json::json!({ "username": "gone", "password": TEST_PASSWORD });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn account_locks_after_five_failures(pool: PgPool) {
    create_user(&pool, "locked", EMPLOYEE_ROLE_ID, None).await;

    for _ in 0..5 {
        let body = serde_json::json!({ "username": "locked", "password": "nope-nope-nope" });
        let response =
            post_json(common::build_test_app(pool.clone()), "/api/v1/auth/login", body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the right password is refused while locked.
    let body = serde_json::json!({ "username": "locked", "password": TEST_PASSWORD });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

// ---------------------------------------------------------------------------
// Refresh and logout
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_rotates_and_rejects_replay(pool: PgPool) {
    create_user(&pool, "refresher", EMPLOYEE_ROLE_ID, None).await;
    let original = login(&pool, "refresher").await["refresh_token"]
        .as_str()
        .unwrap()
        .to_string();

    let body = serde_json::json!({ "refresh_token": original });
    let response =
        post_json(common::build_test_app(pool.clone()), "/api/v1/auth/refresh", body.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_ne!(json["refresh_token"].as_str().unwrap(), original);

    let replay = post_json(common::build_test_app(pool), "/api/v1/auth/refresh", body).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_with_garbage_is_401(pool: PgPool) {
    let body = serde_json::json!({ "refresh_token": "not-a-real-token" });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/refresh", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_revokes_refresh_and_clears_cookie(pool: PgPool) {
    create_user(&pool, "leaver", EMPLOYEE_ROLE_ID, None).await;
    let json = login(&pool, "leaver").await;
    let access = json["access_token"].as_str().unwrap();
    let refresh = json["refresh_token"].as_str().unwrap();

    let response =
        post_auth(common::build_test_app(pool.clone()), "/api/v1/auth/logout", access).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cleared = response.headers()[SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let body = serde_json::json!({ "refresh_token": refresh });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ---------------------------------------------------------------------------
// Admin user management
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_routes_require_auth(pool: PgPool) {
    let response = get(common::build_test_app(pool), "/api/v1/admin/users").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_routes_require_admin_role(pool: PgPool) {
    let (_, token) = common::user_with_token(&pool, "plain", EMPLOYEE_ROLE_ID, None).await;

    let response = get_auth(common::build_test_app(pool), "/api/v1/admin/users", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_creates_and_updates_user(pool: PgPool) {
    let token = admin_token(&pool).await;

    let body = serde_json::json!({
        "username": "hired",
        "email": "hired@test.com",
        "password": "a-long-enough-password",
        "position": "MANAGER",
    });
    let response =
        post_json_auth(common::build_test_app(pool.clone()), "/api/v1/admin/users", body, &token)
            .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["role"], "employee");
    assert_eq!(created["position"], "MANAGER");

    let id = created["id"].as_i64().unwrap();
    let body = serde_json::json!({ "position": "ENERGY_SPECIALIST" });
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/admin/users/{id}"),
        body,
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["position"], "ENERGY_SPECIALIST");

    let response = get_auth(common::build_test_app(pool), "/api/v1/admin/users", &token).await;
    let list = body_json(response).await;
    assert_eq!(list.as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_reset_password_allows_new_login(pool: PgPool) {
    let token = admin_token(&pool).await;
    let user = create_user(&pool, "forgetful", EMPLOYEE_ROLE_ID, None).await;

    let body = serde_json::json!({ "new_password": "a-brand-new-password" });
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/admin/users/{}/reset-password", user.id),
        body,
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = serde_json::json!({ "username": "forgetful", "password": "a-brand-new-password" });
    let response = post_json(common::build_test_app(pool), "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_get_missing_user_is_404(pool: PgPool) {
    let token = admin_token(&pool).await;
    let response =
        get_auth(common::build_test_app(pool), "/api/v1/admin/users/999999", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
