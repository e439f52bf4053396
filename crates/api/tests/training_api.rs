//! HTTP-level integration tests for training modules, sections and the
//! module roll-up.

mod common;

use axum::http::StatusCode;
use common::{
    admin_token, body_json, delete_auth, get_auth, post_auth, post_json_auth, put_json_auth,
    user_with_token, EMPLOYEE_ROLE_ID,
};
use salesdesk_core::positions::Position;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn create_module(pool: &PgPool, token: &str, body: serde_json::Value) -> serde_json::Value {
    let response =
        post_json_auth(common::build_test_app(pool.clone()), "/api/v1/training/modules", body, token)
            .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

/// A published module with two 20-minute sections.
async fn seed_module(pool: &PgPool, admin: &str, title: &str, prerequisites: &[i64]) -> i64 {
    let module = create_module(
        pool,
        admin,
        serde_json::json!({
            "title": title,
            "is_published": true,
            "prerequisite_ids": prerequisites,
            "sections": [
                { "title": "Intro", "section_order": 1, "estimated_duration": 20 },
                { "title": "Practice", "section_order": 2, "estimated_duration": 20 },
            ],
        }),
    )
    .await;
    module["id"].as_i64().unwrap()
}

async fn get_module(pool: &PgPool, token: &str, id: i64) -> serde_json::Value {
    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/training/modules/{id}"),
        token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["data"].clone()
}

async fn post(pool: &PgPool, token: &str, uri: &str) -> axum::response::Response {
    post_auth(common::build_test_app(pool.clone()), uri, token).await
}

// ---------------------------------------------------------------------------
// Statistics and roll-up
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn module_without_sections_is_zero_percent(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let module = create_module(
        &pool,
        &admin,
        serde_json::json!({ "title": "Empty", "is_published": true }),
    )
    .await;
    let (_, rep) = user_with_token(&pool, "rep", EMPLOYEE_ROLE_ID, None).await;

    let detail = get_module(&pool, &rep, module["id"].as_i64().unwrap()).await;
    assert_eq!(detail["stats"]["total_steps"], 0);
    assert_eq!(detail["stats"]["percent_complete"], 0);
    assert_eq!(detail["progress"]["status"], "NOT_STARTED");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn section_progress_rolls_up_to_module(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let module_id = seed_module(&pool, &admin, "Objection handling", &[]).await;
    let (_, rep) = user_with_token(&pool, "rep", EMPLOYEE_ROLE_ID, None).await;

    let sections = get_module(&pool, &rep, module_id).await["sections"].clone();
    let first = sections[0]["id"].as_i64().unwrap();
    let second = sections[1]["id"].as_i64().unwrap();

    let response = post(&pool, &rep, &format!("/api/v1/training/sections/{first}/complete")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "COMPLETED");
    assert_eq!(json["data"]["module"]["status"], "IN_PROGRESS");
    assert_eq!(json["data"]["module"]["percent_complete"], 50);

    let response = post(&pool, &rep, &format!("/api/v1/training/sections/{second}/complete")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["module"]["status"], "COMPLETED");
    assert_eq!(json["data"]["module"]["percent_complete"], 100);

    // Resetting a section reopens the module.
    let response = post(&pool, &rep, &format!("/api/v1/training/sections/{second}/reset")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let detail = get_module(&pool, &rep, module_id).await;
    assert_eq!(detail["progress"]["status"], "IN_PROGRESS");
    assert_eq!(detail["progress"]["percent_complete"], 50);
    assert!(detail["progress"]["completed_at"].is_null());
    assert_eq!(detail["stats"]["estimated_time_remaining"], 20);
    assert_eq!(detail["next_section_id"], second);

    let response = get_auth(common::build_test_app(pool), "/api/v1/notifications", &rep).await;
    let json = body_json(response).await;
    let kinds: Vec<_> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, vec!["training.module_completed"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn module_start_complete_reset(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let module_id = seed_module(&pool, &admin, "Product basics", &[]).await;
    let (_, rep) = user_with_token(&pool, "rep", EMPLOYEE_ROLE_ID, None).await;
    let base = format!("/api/v1/training/modules/{module_id}");

    let response = post(&pool, &rep, &format!("{base}/start")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "IN_PROGRESS");

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("{base}/complete"),
        serde_json::json!({ "notes": "quiz passed" }),
        &rep,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "COMPLETED");
    assert_eq!(json["data"]["percent_complete"], 100);
    assert_eq!(json["data"]["notes"], "quiz passed");

    // Starting again leaves the completed module alone.
    let response = post(&pool, &rep, &format!("{base}/start")).await;
    assert_eq!(body_json(response).await["data"]["status"], "COMPLETED");

    let response = post(&pool, &rep, &format!("{base}/reset")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = post(&pool, &rep, &format!("{base}/reset")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let detail = get_module(&pool, &rep, module_id).await;
    assert_eq!(detail["progress"]["status"], "NOT_STARTED");
}

// ---------------------------------------------------------------------------
// Prerequisites and gating
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn prerequisites_gate_availability(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let basics = seed_module(&pool, &admin, "Basics", &[]).await;
    let advanced = seed_module(&pool, &admin, "Advanced", &[basics]).await;
    let (_, rep) = user_with_token(&pool, "rep", EMPLOYEE_ROLE_ID, None).await;

    let response =
        get_auth(common::build_test_app(pool.clone()), "/api/v1/training/modules", &rep).await;
    let json = body_json(response).await;
    let list = json["data"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    let advanced_entry = list.iter().find(|m| m["id"] == advanced).unwrap();
    assert_eq!(advanced_entry["is_unlocked"], false);
    assert_eq!(advanced_entry["prerequisite_ids"], serde_json::json!([basics]));

    let available = |pool: PgPool, rep: String| async move {
        let response =
            get_auth(common::build_test_app(pool), "/api/v1/training/modules/available", &rep)
                .await;
        let json = body_json(response).await;
        json["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_i64().unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(available(pool.clone(), rep.clone()).await, vec![basics]);

    // Gating is advisory: a locked module can still be started.
    let response = post(&pool, &rep, &format!("/api/v1/training/modules/{advanced}/start")).await;
    assert_eq!(response.status(), StatusCode::OK);

    post(&pool, &rep, &format!("/api/v1/training/modules/{basics}/complete")).await;
    assert_eq!(available(pool.clone(), rep.clone()).await, vec![basics, advanced]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn prerequisite_cycle_is_rejected(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let a = seed_module(&pool, &admin, "A", &[]).await;
    let b = seed_module(&pool, &admin, "B", &[a]).await;

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/training/modules/{a}"),
        serde_json::json!({ "prerequisite_ids": [b] }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/training/modules/{a}"),
        serde_json::json!({ "prerequisite_ids": [a] }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let detail = get_module(&pool, &admin, a).await;
    assert_eq!(detail["prerequisite_ids"], serde_json::json!([]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_prerequisite_is_404(pool: PgPool) {
    let admin = admin_token(&pool).await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/training/modules",
        serde_json::json!({ "title": "Orphan", "prerequisite_ids": [98765] }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Visibility and administration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn unpublished_and_restricted_modules_are_hidden(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let draft = create_module(&pool, &admin, serde_json::json!({ "title": "Draft" })).await;
    let managers = create_module(
        &pool,
        &admin,
        serde_json::json!({
            "title": "Coaching",
            "is_published": true,
            "visible_to_positions": ["MANAGER"],
        }),
    )
    .await;
    let (_, rep) =
        user_with_token(&pool, "rep", EMPLOYEE_ROLE_ID, Some(Position::EnergyConsultant)).await;

    for module in [&draft, &managers] {
        let response = get_auth(
            common::build_test_app(pool.clone()),
            &format!("/api/v1/training/modules/{}", module["id"]),
            &rep,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    let draft_id = draft["id"].as_i64().unwrap();
    let response = post(&pool, &admin, &format!("/api/v1/training/modules/{draft_id}/publish")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_published"], true);

    get_module(&pool, &rep, draft_id).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_section_orders_are_rejected(pool: PgPool) {
    let admin = admin_token(&pool).await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/training/modules",
        serde_json::json!({
            "title": "Clash",
            "sections": [
                { "title": "One", "section_order": 1 },
                { "title": "Also one", "section_order": 1 },
            ],
        }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_replaces_sections(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let module_id = seed_module(&pool, &admin, "Rework", &[]).await;
    let sections = get_module(&pool, &admin, module_id).await["sections"].clone();
    let kept = sections[1]["id"].as_i64().unwrap();

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/training/modules/{module_id}"),
        serde_json::json!({
            "sections": [
                { "id": kept, "title": "Practice", "section_order": 1 },
                { "title": "Role play", "section_order": 2, "estimated_duration": 45 },
            ],
        }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let detail = get_module(&pool, &admin, module_id).await;
    let titles: Vec<_> = detail["sections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Practice", "Role play"]);
    assert_eq!(detail["sections"][0]["id"], kept);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn section_changes_re_derive_module_progress(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let module_id = seed_module(&pool, &admin, "Closing", &[]).await;
    let (_, rep) = user_with_token(&pool, "rep", EMPLOYEE_ROLE_ID, None).await;

    let sections = get_module(&pool, &rep, module_id).await["sections"].clone();
    let first = sections[0]["id"].as_i64().unwrap();
    let second = sections[1]["id"].as_i64().unwrap();
    for id in [first, second] {
        post(&pool, &rep, &format!("/api/v1/training/sections/{id}/complete")).await;
    }
    assert_eq!(get_module(&pool, &rep, module_id).await["progress"]["status"], "COMPLETED");

    let uri = format!("/api/v1/training/modules/{module_id}");
    let existing = serde_json::json!([
        { "id": first, "title": "Intro", "section_order": 1, "estimated_duration": 20 },
        { "id": second, "title": "Practice", "section_order": 2, "estimated_duration": 20 },
    ]);
    let mut with_extra = existing.as_array().unwrap().clone();
    with_extra.push(serde_json::json!({ "title": "Follow-up", "section_order": 3, "estimated_duration": 10 }));

    // A new section reopens the module at the live percentage.
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &uri,
        serde_json::json!({ "sections": with_extra }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let detail = get_module(&pool, &rep, module_id).await;
    assert_eq!(detail["progress"]["status"], "IN_PROGRESS");
    assert_eq!(detail["progress"]["percent_complete"], 67);
    assert_eq!(detail["stats"]["percent_complete"], 67);
    assert!(detail["progress"]["completed_at"].is_null());

    // Dropping it again leaves only finished sections.
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &uri,
        serde_json::json!({ "sections": existing }),
        &admin,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let detail = get_module(&pool, &rep, module_id).await;
    assert_eq!(detail["progress"]["status"], "COMPLETED");
    assert_eq!(detail["progress"]["percent_complete"], 100);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_module_then_404(pool: PgPool) {
    let admin = admin_token(&pool).await;
    let module_id = seed_module(&pool, &admin, "Short lived", &[]).await;
    let uri = format!("/api/v1/training/modules/{module_id}");

    let response = delete_auth(common::build_test_app(pool.clone()), &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = delete_auth(common::build_test_app(pool.clone()), &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(common::build_test_app(pool), &uri, &admin).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
