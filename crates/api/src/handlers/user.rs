//! Handlers for the `/users` resource: profile, password, holiday region.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Datelike;
use chronos_core::accounts::describe_validation_errors;
use chronos_core::error::CoreError;
use chronos_core::holiday::normalize_region;
use chronos_db::models::calendar::Calendar;
use chronos_db::models::user::{UpdateProfile, UserResponse};
use chronos_db::repositories::UserRepo;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::holiday_calendar;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `PUT /users/update`. Absent fields are kept.
#[derive(Debug, Deserialize, Validate)]
pub struct ProfileRequest {
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Email address is invalid"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Full name must not be empty"))]
    pub full_name: Option<String>,
    pub avatar: Option<String>,
}

/// Request body for `PUT /users/change-password`.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Request body for `PUT /users/holiday-region`.
#[derive(Debug, Deserialize)]
pub struct HolidayRegionRequest {
    pub region: String,
}

/// Response for `PUT /users/holiday-region`.
#[derive(Debug, Serialize)]
pub struct HolidayRegionResponse {
    pub user: UserResponse,
    pub calendar: Calendar,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// PUT /api/users/update
pub async fn update_profile(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ProfileRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(describe_validation_errors(&e))))?;

    let changes = UpdateProfile {
        username: input.username.map(|u| u.trim().to_string()),
        email: input.email.map(|e| e.trim().to_lowercase()),
        full_name: input.full_name.map(|n| n.trim().to_string()),
        avatar: input.avatar,
    };
    let user = UserRepo::update_profile(&state.pool, auth.user_id, &changes)
        .await?
        .ok_or_else(|| AppError::not_found("User", auth.user_id))?;

    Ok(Json(DataResponse { data: user.into() }))
}

/// PUT /api/users/change-password
pub async fn change_password(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", auth.user_id))?;

    let current_valid = verify_password(&input.current_password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !current_valid {
        return Err(AppError::Core(CoreError::Validation(
            "Current password is incorrect".into(),
        )));
    }

    validate_password_strength(&input.new_password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let new_hash = hash_password(&input.new_password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
    UserRepo::update_password(&state.pool, auth.user_id, &new_hash).await?;

    tracing::info!(user_id = auth.user_id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/users/holiday-region
///
/// Store the new region and regenerate the holiday calendar for it, both in
/// one transaction.
pub async fn update_holiday_region(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<HolidayRegionRequest>,
) -> AppResult<Json<DataResponse<HolidayRegionResponse>>> {
    let region =
        normalize_region(&input.region).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let year = chrono::Utc::now().year();
    let holidays = state.holidays.holidays(&region, year).await;

    let mut tx = state.pool.begin().await?;
    let user = UserRepo::update_holiday_region(&mut *tx, auth.user_id, &region)
        .await?
        .ok_or_else(|| AppError::not_found("User", auth.user_id))?;
    let calendar =
        holiday_calendar::rebuild(&mut tx, &holidays, auth.user_id, &region, year).await?;
    tx.commit().await?;

    tracing::info!(user_id = auth.user_id, region = %region, "Holiday region changed");

    Ok(Json(DataResponse {
        data: HolidayRegionResponse {
            user: user.into(),
            calendar,
        },
    }))
}
