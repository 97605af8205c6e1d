//! Handlers for the `/calendars` resource.
//!
//! Every handler loads the calendar aggregate, runs the matching
//! [`CalendarAction`] guard, applies the change in memory, and saves the
//! whole aggregate back. Concurrent writers race; the last save wins.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chronos_core::calendar_access::{CalendarAccess, CalendarAction, CalendarPatch, ShareRole};
use chronos_core::error::CoreError;
use chronos_core::notification_kinds::{
    KIND_CALENDAR_INVITE, KIND_CALENDAR_REMOVED, KIND_CALENDAR_ROLE_CHANGED,
};
use chronos_core::types::DbId;
use chronos_db::models::calendar::{Calendar, CreateCalendar, NewCalendar, PopulatedCalendar};
use chronos_db::models::notification::CreateNotification;
use chronos_db::repositories::{CalendarRepo, EventRepo, UserRepo};
use chronos_db::DbPool;
use chronos_events::{CalendarInviteEmail, EmailDelivery};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::IncludeHiddenParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /calendars/{id}/invite`.
#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub email: String,
    /// `"editor"` for write access; anything else grants membership.
    #[serde(default)]
    pub role: Option<String>,
}

/// Request body for `POST /calendars/{id}/members/update`.
#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub user_id: DbId,
    pub role: String,
}

/// Request body for `POST /calendars/{id}/members/remove`.
#[derive(Debug, Deserialize)]
pub struct RemoveMemberRequest {
    pub user_id: DbId,
}

// ---------------------------------------------------------------------------
// Listing and CRUD
// ---------------------------------------------------------------------------

/// GET /api/calendars
///
/// Calendars the user owns, edits, or is a member of. Hidden calendars are
/// omitted unless `?include_hidden=true`, which adds hidden ones the user owns.
pub async fn list_calendars(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<IncludeHiddenParams>,
) -> AppResult<Json<DataResponse<Vec<Calendar>>>> {
    let calendars =
        CalendarRepo::list_for_user(&state.pool, auth.user_id, params.include_hidden).await?;
    Ok(Json(DataResponse { data: calendars }))
}

/// POST /api/calendars
pub async fn create_calendar(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewCalendar>,
) -> AppResult<(StatusCode, Json<DataResponse<Calendar>>)> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Calendar name must not be empty".into(),
        )));
    }

    let calendar = CalendarRepo::create(
        &state.pool,
        &CreateCalendar {
            name: name.to_string(),
            description: input.description,
            color: input.color,
            owner_id: auth.user_id,
            ..Default::default()
        },
    )
    .await?;

    tracing::info!(user_id = auth.user_id, calendar_id = calendar.id, "Calendar created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: calendar })))
}

/// GET /api/calendars/{id}
///
/// The calendar with owner, editors, and members resolved. Anyone without a
/// role on the calendar gets 404.
pub async fn get_calendar(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(calendar_id): Path<DbId>,
) -> AppResult<Json<DataResponse<PopulatedCalendar>>> {
    let calendar = load_calendar(&state.pool, calendar_id).await?;
    guard(&calendar, auth.user_id, CalendarAction::View)?;
    Ok(Json(DataResponse {
        data: populate(&state.pool, calendar).await?,
    }))
}

/// PUT /api/calendars/{id}
///
/// Owner only. A main calendar keeps its name; a holiday calendar keeps its
/// country and year.
pub async fn update_calendar(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(calendar_id): Path<DbId>,
    Json(patch): Json<CalendarPatch>,
) -> AppResult<Json<DataResponse<Calendar>>> {
    let calendar = load_calendar(&state.pool, calendar_id).await?;
    guard(&calendar, auth.user_id, CalendarAction::Update)?;

    if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Core(CoreError::Validation(
            "Calendar name must not be empty".into(),
        )));
    }

    let details = calendar.details().apply(patch, &calendar.access());
    let updated = CalendarRepo::update_details(&state.pool, calendar_id, &details)
        .await?
        .ok_or_else(|| AppError::not_found("Calendar", calendar_id))?;

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/calendars/{id}
///
/// Owner only; main and holiday calendars cannot be deleted. The calendar's
/// events go with it.
pub async fn delete_calendar(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(calendar_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let calendar = load_calendar(&state.pool, calendar_id).await?;
    guard(&calendar, auth.user_id, CalendarAction::Delete)?;

    let events = EventRepo::delete_by_calendar(&state.pool, calendar_id).await?;
    CalendarRepo::delete(&state.pool, calendar_id).await?;

    tracing::info!(
        user_id = auth.user_id,
        calendar_id,
        events,
        "Calendar deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/calendars/{id}/hide
pub async fn hide_calendar(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(calendar_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Calendar>>> {
    set_visibility(&state, auth, calendar_id, true).await
}

/// PUT /api/calendars/{id}/show
pub async fn show_calendar(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(calendar_id): Path<DbId>,
) -> AppResult<Json<DataResponse<Calendar>>> {
    set_visibility(&state, auth, calendar_id, false).await
}

async fn set_visibility(
    state: &AppState,
    auth: AuthUser,
    calendar_id: DbId,
    hidden: bool,
) -> AppResult<Json<DataResponse<Calendar>>> {
    let calendar = load_calendar(&state.pool, calendar_id).await?;
    let action = if hidden {
        CalendarAction::Hide
    } else {
        CalendarAction::Show
    };
    guard(&calendar, auth.user_id, action)?;

    let updated = CalendarRepo::set_hidden(&state.pool, calendar_id, hidden)
        .await?
        .ok_or_else(|| AppError::not_found("Calendar", calendar_id))?;
    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Sharing
// ---------------------------------------------------------------------------

/// POST /api/calendars/{id}/invite
///
/// Owner grants a role to the user with the given email. The invitee gets
/// a notification and, when SMTP is configured, an email.
pub async fn invite_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(calendar_id): Path<DbId>,
    Json(input): Json<InviteRequest>,
) -> AppResult<Json<DataResponse<PopulatedCalendar>>> {
    let calendar = load_calendar(&state.pool, calendar_id).await?;
    let email = input.email.trim().to_lowercase();

    let target = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFoundBy {
                entity: "User",
                key: email.clone(),
            })
        })?;
    guard(
        &calendar,
        auth.user_id,
        CalendarAction::Share { target: target.id },
    )?;

    let role = ShareRole::from_request(input.role.as_deref().unwrap_or_default());
    let mut access = calendar.access();
    access.set_role(target.id, role);
    let saved = save_roles(&state.pool, calendar_id, &access).await?;

    tracing::info!(
        user_id = auth.user_id,
        calendar_id,
        target_id = target.id,
        role = role.as_str(),
        "Calendar shared"
    );

    state
        .notifications
        .notify_best_effort(CreateNotification {
            user_id: target.id,
            calendar_id: Some(calendar_id),
            event_id: None,
            kind: KIND_CALENDAR_INVITE.to_string(),
            message: format!("You were added to \"{}\" as {}", saved.name, role.as_str()),
            metadata: Some(serde_json::json!({
                "invited_by": auth.user_id,
                "role": role.as_str(),
            })),
        })
        .await;

    if let Some(mailer) = &state.mailer {
        let inviter_name = UserRepo::find_by_id(&state.pool, auth.user_id)
            .await?
            .map(|u| u.full_name)
            .unwrap_or_default();
        spawn_invite_email(
            Arc::clone(mailer),
            CalendarInviteEmail {
                to_email: target.email.clone(),
                inviter_name,
                calendar_name: saved.name.clone(),
                role: role.as_str().to_string(),
            },
        );
    }

    Ok(Json(DataResponse {
        data: populate(&state.pool, saved).await?,
    }))
}

/// POST /api/calendars/{id}/members/update
///
/// Owner moves a user to the given role. A user who had no role is added.
pub async fn update_member_role(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(calendar_id): Path<DbId>,
    Json(input): Json<UpdateMemberRequest>,
) -> AppResult<Json<DataResponse<PopulatedCalendar>>> {
    let calendar = load_calendar(&state.pool, calendar_id).await?;
    UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", input.user_id))?;
    guard(
        &calendar,
        auth.user_id,
        CalendarAction::Share {
            target: input.user_id,
        },
    )?;

    let role = ShareRole::from_request(&input.role);
    let mut access = calendar.access();
    access.set_role(input.user_id, role);
    let saved = save_roles(&state.pool, calendar_id, &access).await?;

    state
        .notifications
        .notify_best_effort(CreateNotification {
            user_id: input.user_id,
            calendar_id: Some(calendar_id),
            event_id: None,
            kind: KIND_CALENDAR_ROLE_CHANGED.to_string(),
            message: format!("Your role in \"{}\" is now {}", saved.name, role.as_str()),
            metadata: Some(serde_json::json!({ "role": role.as_str() })),
        })
        .await;

    Ok(Json(DataResponse {
        data: populate(&state.pool, saved).await?,
    }))
}

/// POST /api/calendars/{id}/members/remove
///
/// The owner may remove anyone; any user may remove themself. Removing a
/// user who has no role is a no-op.
pub async fn remove_member(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(calendar_id): Path<DbId>,
    Json(input): Json<RemoveMemberRequest>,
) -> AppResult<Json<DataResponse<PopulatedCalendar>>> {
    let calendar = load_calendar(&state.pool, calendar_id).await?;
    guard(
        &calendar,
        auth.user_id,
        CalendarAction::RemoveMember {
            target: input.user_id,
        },
    )?;

    let mut access = calendar.access();
    if !access.remove_member(input.user_id) {
        return Ok(Json(DataResponse {
            data: populate(&state.pool, calendar).await?,
        }));
    }
    let saved = save_roles(&state.pool, calendar_id, &access).await?;

    if input.user_id != auth.user_id {
        state
            .notifications
            .notify_best_effort(CreateNotification {
                user_id: input.user_id,
                calendar_id: Some(calendar_id),
                event_id: None,
                kind: KIND_CALENDAR_REMOVED.to_string(),
                message: format!("You were removed from \"{}\"", saved.name),
                metadata: None,
            })
            .await;
    }

    Ok(Json(DataResponse {
        data: populate(&state.pool, saved).await?,
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_calendar(pool: &DbPool, calendar_id: DbId) -> AppResult<Calendar> {
    CalendarRepo::find_by_id(pool, calendar_id)
        .await?
        .ok_or_else(|| AppError::not_found("Calendar", calendar_id))
}

fn guard(calendar: &Calendar, requester: DbId, action: CalendarAction) -> AppResult<()> {
    calendar
        .access()
        .authorize(requester, action)
        .map_err(|denied| AppError::calendar_denied(denied, calendar.id))
}

async fn save_roles(
    pool: &DbPool,
    calendar_id: DbId,
    access: &CalendarAccess,
) -> AppResult<Calendar> {
    CalendarRepo::save_roles(pool, calendar_id, access)
        .await?
        .ok_or_else(|| AppError::not_found("Calendar", calendar_id))
}

/// Resolve owner, editors, and members to user summaries.
pub async fn populate(pool: &DbPool, calendar: Calendar) -> Result<PopulatedCalendar, sqlx::Error> {
    let owner = UserRepo::summaries(pool, &[calendar.owner_id])
        .await?
        .into_iter()
        .next();
    let editor_users = UserRepo::summaries(pool, &calendar.editors).await?;
    let member_users = UserRepo::summaries(pool, &calendar.members).await?;
    Ok(PopulatedCalendar {
        calendar,
        owner,
        editor_users,
        member_users,
    })
}

fn spawn_invite_email(mailer: Arc<EmailDelivery>, invite: CalendarInviteEmail) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send_calendar_invite(&invite).await {
            tracing::warn!(error = %e, to = %invite.to_email, "Invitation email failed");
        }
    });
}
