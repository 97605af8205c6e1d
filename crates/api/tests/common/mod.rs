#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use chronos_api::auth::jwt::JwtConfig;
use chronos_api::config::ServerConfig;
use chronos_api::router::build_app_router;
use chronos_api::state::AppState;
use chronos_core::holiday::Holiday;
use chronos_core::types::DbId;
use chronos_events::HolidaySource;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            expiry_hours: 1,
        },
        holiday_api_url: "http://127.0.0.1:1".to_string(),
        default_holiday_region: "UA".to_string(),
    }
}

/// Holiday source with a fixed two-entry list for every country and year.
pub struct FixedHolidays;

#[async_trait]
impl HolidaySource for FixedHolidays {
    async fn holidays(&self, country: &str, year: i32) -> Vec<Holiday> {
        vec![
            Holiday {
                date: NaiveDate::from_ymd_opt(year, 1, 1).unwrap(),
                local_name: "New Year".into(),
                name: "New Year's Day".into(),
                country_code: country.to_string(),
            },
            Holiday {
                date: NaiveDate::from_ymd_opt(year, 12, 25).unwrap(),
                local_name: "Christmas".into(),
                name: "Christmas Day".into(),
                country_code: country.to_string(),
            },
        ]
    }
}

/// Holiday source that behaves like an unreachable feed.
pub struct NoHolidays;

#[async_trait]
impl HolidaySource for NoHolidays {
    async fn holidays(&self, _country: &str, _year: i32) -> Vec<Holiday> {
        Vec::new()
    }
}

/// Holiday source whose entries the database refuses to store (a NUL byte
/// in the title), so the holiday insert fails mid-write.
pub struct UnstorableHolidays;

#[async_trait]
impl HolidaySource for UnstorableHolidays {
    async fn holidays(&self, country: &str, year: i32) -> Vec<Holiday> {
        vec![Holiday {
            date: NaiveDate::from_ymd_opt(year, 5, 1).unwrap(),
            local_name: "Labour\0Day".into(),
            name: "Labour Day".into(),
            country_code: country.to_string(),
        }]
    }
}

/// Application state over the given pool with [`FixedHolidays`] and no mailer.
pub fn build_test_state(pool: PgPool) -> AppState {
    build_state_with(pool, Arc::new(FixedHolidays))
}

/// Application state with a specific holiday source.
pub fn build_state_with(pool: PgPool, holidays: Arc<dyn HolidaySource>) -> AppState {
    AppState::new(pool, test_config(), holidays, None)
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(pool: PgPool) -> Router {
    app_for(build_test_state(pool))
}

/// Router over an existing state, so a test can inspect the state afterwards.
pub fn app_for(state: AppState) -> Router {
    build_app_router(state, &test_config())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, "GET", uri, None, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, "POST", uri, None, Some(body)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, "GET", uri, Some(token), None).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    send(app, "POST", uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response {
    send(app, "PUT", uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, "DELETE", uri, Some(token), None).await
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A user registered through the API.
pub struct TestUser {
    pub id: DbId,
    pub token: String,
    pub email: String,
}

/// Register `username` with password `secret1` and return its id and token.
pub async fn register(app: Router, username: &str) -> TestUser {
    let email = format!("{username}@example.com");
    let body = serde_json::json!({
        "username": username,
        "full_name": format!("{username} Test"),
        "email": email,
        "password": "secret1",
    });
    let response = post_json(app, "/api/auth/register", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    TestUser {
        id: json["data"]["user"]["id"].as_i64().unwrap(),
        token: json["data"]["token"].as_str().unwrap().to_string(),
        email,
    }
}

/// Create a plain calendar owned by `owner` and return its id.
pub async fn create_calendar(app: Router, owner: &TestUser, name: &str) -> DbId {
    let response = post_json_auth(
        app,
        "/api/calendars",
        &owner.token,
        serde_json::json!({ "name": name }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
