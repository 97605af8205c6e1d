//! Handlers for the `/auth` resource (register, login, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Datelike;
use chronos_core::accounts::{describe_validation_errors, NewAccount};
use chronos_core::error::CoreError;
use chronos_core::holiday::normalize_region;
use chronos_core::types::DbId;
use chronos_db::models::calendar::CreateCalendar;
use chronos_db::models::user::{CreateUser, UserResponse};
use chronos_db::repositories::{CalendarRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::generate_token;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::holiday_calendar;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Name of the calendar every user gets at registration.
pub const MAIN_CALENDAR_NAME: &str = "My Calendar";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
///
/// `login` matches either the email address or the username.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email", alias = "username")]
    pub login: String,
    pub password: String,
}

/// Successful authentication response returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/register
///
/// Create the account, its main calendar, and its holiday calendar in one
/// transaction, then return a token. Holiday feed failures leave the
/// holiday calendar empty.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<NewAccount>,
) -> AppResult<(StatusCode, Json<DataResponse<AuthResponse>>)> {
    // 1. Validate input.
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(describe_validation_errors(&e))))?;

    let region = normalize_region(
        input
            .holiday_region
            .as_deref()
            .unwrap_or(&state.config.default_holiday_region),
    )
    .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    // 2. Fetch holidays before opening the transaction.
    let year = chrono::Utc::now().year();
    let holidays = state.holidays.holidays(&region, year).await;

    // 3. Create the user. Duplicate username / email surface as 409.
    let mut tx = state.pool.begin().await?;
    let user = UserRepo::create(
        &mut *tx,
        &CreateUser {
            username: input.username.trim().to_string(),
            email: input.email.trim().to_lowercase(),
            password_hash,
            full_name: input.full_name.trim().to_string(),
            holiday_region: region.clone(),
        },
    )
    .await?;

    // 4. Main calendar.
    CalendarRepo::create(
        &mut *tx,
        &CreateCalendar {
            name: MAIN_CALENDAR_NAME.to_string(),
            owner_id: user.id,
            is_main: true,
            ..Default::default()
        },
    )
    .await?;

    // 5. Holiday calendar for the current year.
    holiday_calendar::bootstrap(&mut tx, &holidays, user.id, &region, year).await?;
    tx.commit().await?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    let token = issue_token(&state, user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: AuthResponse {
                token,
                user: user.into(),
            },
        }),
    ))
}

/// POST /api/auth/login
///
/// Authenticate with email-or-username + password.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let invalid = || {
        AppError::Core(CoreError::Unauthorized(
            "Invalid login or password".into(),
        ))
    };

    let user = UserRepo::find_by_login(&state.pool, input.login.trim())
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        tracing::debug!(user_id = user.id, "Rejected login with wrong password");
        return Err(invalid());
    }

    let token = issue_token(&state, user.id)?;
    Ok(Json(DataResponse {
        data: AuthResponse {
            token,
            user: user.into(),
        },
    }))
}

/// GET /api/auth/me
pub async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    Ok(Json(DataResponse { data: user.into() }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn issue_token(state: &AppState, user_id: DbId) -> AppResult<String> {
    generate_token(user_id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))
}
