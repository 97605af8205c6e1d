//! HTTP-level integration tests for calendars: listing, CRUD, visibility,
//! and the sharing guards.

mod common;

use axum::http::StatusCode;
use chronos_core::types::DbId;
use chronos_db::repositories::CalendarRepo;
use common::{
    body_json, create_calendar, delete_auth, get_auth, post_json_auth, put_json_auth, register,
};
use sqlx::PgPool;

async fn main_calendar_id(pool: &PgPool, owner: DbId) -> DbId {
    CalendarRepo::find_main_for_owner(pool, owner)
        .await
        .unwrap()
        .expect("main calendar must exist")
        .id
}

async fn holiday_calendar_id(pool: &PgPool, owner: DbId) -> DbId {
    CalendarRepo::find_holiday_for_owner(pool, owner)
        .await
        .unwrap()
        .expect("holiday calendar must exist")
        .id
}

// ---------------------------------------------------------------------------
// Sharing
// ---------------------------------------------------------------------------

/// Owner invites bob as editor: bob lands in editors only and sees it listed.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_invite_as_editor(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner").await;
    let bob = register(common::build_test_app(pool.clone()), "bob").await;
    let calendar_id = create_calendar(common::build_test_app(pool.clone()), &owner, "Team").await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{calendar_id}/invite"),
        &owner.token,
        serde_json::json!({ "email": "BOB@example.com", "role": "editor" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["editors"], serde_json::json!([bob.id]));
    assert_eq!(json["data"]["members"], serde_json::json!([]));
    assert_eq!(json["data"]["editor_users"][0]["username"], "bob");
    assert_eq!(json["data"]["owner"]["id"], owner.id);

    let response = get_auth(common::build_test_app(pool.clone()), "/api/calendars", &bob.token).await;
    let listed = body_json(response).await["data"].as_array().unwrap().clone();
    assert!(listed.iter().any(|c| c["id"] == calendar_id));

    // Bob got a calendar_invite notification.
    let response = get_auth(common::build_test_app(pool), "/api/notifications", &bob.token).await;
    let notifications = body_json(response).await["data"].as_array().unwrap().clone();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["kind"], "calendar_invite");
    assert_eq!(notifications[0]["calendar_id"], calendar_id);
}

/// Role changes keep editors and members disjoint.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_role_changes_keep_sets_disjoint(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner").await;
    let bob = register(common::build_test_app(pool.clone()), "bob").await;
    let calendar_id = create_calendar(common::build_test_app(pool.clone()), &owner, "Team").await;

    // Unknown roles default to member.
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{calendar_id}/invite"),
        &owner.token,
        serde_json::json!({ "email": bob.email, "role": "viewer" }),
    )
    .await;
    assert_eq!(body_json(response).await["data"]["members"], serde_json::json!([bob.id]));

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{calendar_id}/members/update"),
        &owner.token,
        serde_json::json!({ "user_id": bob.id, "role": "editor" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["editors"], serde_json::json!([bob.id]));
    assert_eq!(json["data"]["members"], serde_json::json!([]));

    let stored = CalendarRepo::find_by_id(&pool, calendar_id).await.unwrap().unwrap();
    assert_eq!(stored.editors, vec![bob.id]);
    assert!(stored.members.is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_invite_unknown_email_is_404(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner").await;
    let calendar_id = create_calendar(common::build_test_app(pool.clone()), &owner, "Team").await;

    let response = post_json_auth(
        common::build_test_app(pool),
        &format!("/api/calendars/{calendar_id}/invite"),
        &owner.token,
        serde_json::json!({ "email": "nobody@example.com" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_non_owner_cannot_invite(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner").await;
    let bob = register(common::build_test_app(pool.clone()), "bob").await;
    register(common::build_test_app(pool.clone()), "carol").await;
    let calendar_id = create_calendar(common::build_test_app(pool.clone()), &owner, "Team").await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{calendar_id}/invite"),
        &bob.token,
        serde_json::json!({ "email": "carol@example.com" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let stored = CalendarRepo::find_by_id(&pool, calendar_id).await.unwrap().unwrap();
    assert!(stored.members.is_empty());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_main_and_holiday_calendars_cannot_be_shared(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner").await;
    register(common::build_test_app(pool.clone()), "bob").await;

    for calendar_id in [
        main_calendar_id(&pool, owner.id).await,
        holiday_calendar_id(&pool, owner.id).await,
    ] {
        let response = post_json_auth(
            common::build_test_app(pool.clone()),
            &format!("/api/calendars/{calendar_id}/invite"),
            &owner.token,
            serde_json::json!({ "email": "bob@example.com", "role": "editor" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

/// Only the owner or the member themself may remove a member.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_remove_member_rules(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner").await;
    let bob = register(common::build_test_app(pool.clone()), "bob").await;
    let carol = register(common::build_test_app(pool.clone()), "carol").await;
    let calendar_id = create_calendar(common::build_test_app(pool.clone()), &owner, "Team").await;

    for (user, role) in [(&bob, "editor"), (&carol, "member")] {
        post_json_auth(
            common::build_test_app(pool.clone()),
            &format!("/api/calendars/{calendar_id}/invite"),
            &owner.token,
            serde_json::json!({ "email": user.email, "role": role }),
        )
        .await;
    }

    // Bob (an editor) cannot remove carol.
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{calendar_id}/members/remove"),
        &bob.token,
        serde_json::json!({ "user_id": carol.id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Carol can remove herself.
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{calendar_id}/members/remove"),
        &carol.token,
        serde_json::json!({ "user_id": carol.id }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["members"], serde_json::json!([]));

    // The owner removes bob; doing it twice is harmless.
    for _ in 0..2 {
        let response = post_json_auth(
            common::build_test_app(pool.clone()),
            &format!("/api/calendars/{calendar_id}/members/remove"),
            &owner.token,
            serde_json::json!({ "user_id": bob.id }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let stored = CalendarRepo::find_by_id(&pool, calendar_id).await.unwrap().unwrap();
    assert!(stored.editors.is_empty());
    assert!(stored.members.is_empty());

    // Bob hears about the removal; carol removed herself and does not.
    let response = get_auth(common::build_test_app(pool.clone()), "/api/notifications", &bob.token).await;
    let kinds: Vec<String> = body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap().to_string())
        .collect();
    assert!(kinds.contains(&"calendar_removed".to_string()));

    let response = get_auth(common::build_test_app(pool), "/api/notifications", &carol.token).await;
    let carol_kinds: Vec<String> = body_json(response).await["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["kind"].as_str().unwrap().to_string())
        .collect();
    assert!(!carol_kinds.contains(&"calendar_removed".to_string()));
}

// ---------------------------------------------------------------------------
// Protected calendars
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_main_calendar_is_protected(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner").await;
    let main_id = main_calendar_id(&pool, owner.id).await;

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{main_id}"),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{main_id}/hide"),
        &owner.token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Renaming is accepted but the name is kept; other fields change.
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{main_id}"),
        &owner.token,
        serde_json::json!({ "name": "Renamed", "color": "#123456" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "My Calendar");
    assert_eq!(json["data"]["color"], "#123456");

    let stored = CalendarRepo::find_by_id(&pool, main_id).await.unwrap().unwrap();
    assert!(!stored.is_hidden);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_holiday_calendar_keeps_source_and_can_be_hidden(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner").await;
    let holiday_id = holiday_calendar_id(&pool, owner.id).await;

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{holiday_id}"),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{holiday_id}"),
        &owner.token,
        serde_json::json!({ "name": "Days off", "holiday_country": "US", "holiday_year": 1999 }),
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Days off");
    assert_eq!(json["data"]["holiday_country"], "UA");
    assert_ne!(json["data"]["holiday_year"], 1999);

    // Hide, confirm it drops from the default list, then show again.
    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{holiday_id}/hide"),
        &owner.token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(common::build_test_app(pool.clone()), "/api/calendars", &owner.token).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/calendars?include_hidden=true",
        &owner.token,
    )
    .await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{holiday_id}/show"),
        &owner.token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["is_hidden"], false);
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn test_delete_calendar_removes_its_events(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner").await;
    let calendar_id = create_calendar(common::build_test_app(pool.clone()), &owner, "Gym").await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/events",
        &owner.token,
        serde_json::json!({
            "title": "Leg day",
            "date": "2026-03-01T08:00:00Z",
            "calendar_id": calendar_id,
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{calendar_id}"),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(CalendarRepo::find_by_id(&pool, calendar_id).await.unwrap().is_none());
    let count = chronos_db::repositories::EventRepo::count_by_calendar(&pool, calendar_id)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_non_owner_cannot_update_or_delete(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner").await;
    let bob = register(common::build_test_app(pool.clone()), "bob").await;
    let calendar_id = create_calendar(common::build_test_app(pool.clone()), &owner, "Team").await;

    post_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{calendar_id}/invite"),
        &owner.token,
        serde_json::json!({ "email": bob.email, "role": "editor" }),
    )
    .await;

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{calendar_id}"),
        &bob.token,
        serde_json::json!({ "name": "Mine now" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{calendar_id}"),
        &bob.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let stored = CalendarRepo::find_by_id(&pool, calendar_id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Team");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_get_calendar_visibility(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner").await;
    let stranger = register(common::build_test_app(pool.clone()), "stranger").await;
    let calendar_id = create_calendar(common::build_test_app(pool.clone()), &owner, "Private").await;

    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{calendar_id}"),
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["owner"]["username"], "owner");

    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/calendars/{calendar_id}"),
        &stranger.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get_auth(
        common::build_test_app(pool),
        "/api/calendars/999999",
        &owner.token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_create_calendar_requires_name(pool: PgPool) {
    let owner = register(common::build_test_app(pool.clone()), "owner").await;

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/calendars",
        &owner.token,
        serde_json::json!({ "name": "   " }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// An explicit `null` clears a nullable field; an absent field is kept.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_update_calendar_null_clears_description(pool: PgPool) {
    let alice = register(common::build_test_app(pool.clone()), "alice").await;
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/calendars",
        &alice.token,
        serde_json::json!({ "name": "Gym", "description": "legs", "color": "#123456" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cal_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = put_json_auth(
        common::build_test_app(pool),
        &format!("/api/calendars/{cal_id}"),
        &alice.token,
        serde_json::json!({ "description": null }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["data"]["description"].is_null());
    assert_eq!(json["data"]["color"], "#123456");
    assert_eq!(json["data"]["name"], "Gym");
}
