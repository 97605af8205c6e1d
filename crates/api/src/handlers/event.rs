//! Handlers for the `/events` resource.
//!
//! Events are scoped to their creator: anyone else asking about an event
//! gets 404. Read-only events (holidays) cannot be changed by anyone.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chronos_core::error::CoreError;
use chronos_core::event_category::{validate_user_category, DEFAULT_CATEGORY};
use chronos_core::notification_kinds::KIND_EVENT_INVITE;
use chronos_core::types::DbId;
use chronos_db::models::event::{CreateEvent, Event, EventWithCalendar, NewEvent, UpdateEvent};
use chronos_db::models::notification::CreateNotification;
use chronos_db::repositories::{CalendarRepo, EventRepo, UserRepo};
use chronos_db::DbPool;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Length of an event created without an explicit duration.
const DEFAULT_DURATION_MINUTES: i32 = 60;

/// Request body for `POST /events/{id}/invite`.
#[derive(Debug, Deserialize)]
pub struct InviteToEventRequest {
    pub emails: Vec<String>,
}

/// GET /api/events
pub async fn list_events(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Event>>>> {
    let events = EventRepo::list_by_creator(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: events }))
}

/// GET /api/events/with-calendar
pub async fn list_events_with_calendar(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<EventWithCalendar>>>> {
    let events = EventRepo::list_by_creator_with_calendar(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: events }))
}

/// POST /api/events
///
/// The requester becomes the creator. The target calendar is not checked
/// against the requester's roles.
pub async fn create_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewEvent>,
) -> AppResult<(StatusCode, Json<DataResponse<Event>>)> {
    let title = validate_title(&input.title)?;
    let category = input
        .category
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    validate_user_category(&category).map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    let duration = input.duration.unwrap_or(DEFAULT_DURATION_MINUTES);
    validate_duration(duration)?;

    let event = EventRepo::create(
        &state.pool,
        &CreateEvent {
            title,
            date: input.date,
            duration,
            all_day: input.all_day.unwrap_or(false),
            category,
            description: input.description,
            color: input.color,
            calendar_id: input.calendar_id,
            creator_id: auth.user_id,
            invited_from: None,
            read_only: false,
        },
    )
    .await?;

    tracing::info!(user_id = auth.user_id, event_id = event.id, "Event created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: event })))
}

/// PUT /api/events/{id}
pub async fn update_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
    Json(mut input): Json<UpdateEvent>,
) -> AppResult<Json<DataResponse<Event>>> {
    let event = load_own_event(&state.pool, event_id, auth.user_id).await?;
    reject_read_only(&event)?;

    if let Some(title) = &input.title {
        input.title = Some(validate_title(title)?);
    }
    if let Some(category) = &input.category {
        validate_user_category(category)
            .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;
    }
    if let Some(duration) = input.duration {
        validate_duration(duration)?;
    }

    let updated = EventRepo::update(&state.pool, event_id, &input)
        .await?
        .ok_or_else(|| AppError::not_found("Event", event_id))?;
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/events/{id}
///
/// 404 unless the requester created the event; 403 for read-only events.
pub async fn delete_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let event = load_own_event(&state.pool, event_id, auth.user_id).await?;
    reject_read_only(&event)?;

    if !EventRepo::delete_owned(&state.pool, event_id, auth.user_id).await? {
        return Err(AppError::not_found("Event", event_id));
    }
    tracing::info!(user_id = auth.user_id, event_id, "Event deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/events/{id}/invite
///
/// Read-only events cannot be shared (403). Every address is recorded on
/// the event. Addresses that belong to a registered user also get a
/// personal copy in that user's main calendar and an `event_invite`
/// notification.
pub async fn invite_to_event(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
    Json(input): Json<InviteToEventRequest>,
) -> AppResult<Json<DataResponse<Event>>> {
    let event = load_own_event(&state.pool, event_id, auth.user_id).await?;
    reject_read_only(&event)?;

    let mut emails: Vec<String> = input
        .emails
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect();
    emails.sort();
    emails.dedup();
    if emails.is_empty() {
        return Err(AppError::BadRequest(
            "At least one email address is required".into(),
        ));
    }

    let mut invited_users = Vec::new();
    for email in &emails {
        let Some(invitee) = UserRepo::find_by_email(&state.pool, email).await? else {
            continue;
        };
        if invitee.id == auth.user_id {
            continue;
        }

        let main = CalendarRepo::find_main_for_owner(&state.pool, invitee.id).await?;
        let copy = EventRepo::create(
            &state.pool,
            &CreateEvent {
                title: event.title.clone(),
                date: event.date,
                duration: event.duration,
                all_day: event.all_day,
                category: event.category.clone(),
                description: event.description.clone(),
                color: event.color.clone(),
                calendar_id: main.map(|c| c.id),
                creator_id: invitee.id,
                invited_from: Some(event.id),
                read_only: false,
            },
        )
        .await?;

        state
            .notifications
            .notify_best_effort(CreateNotification {
                user_id: invitee.id,
                calendar_id: copy.calendar_id,
                event_id: Some(copy.id),
                kind: KIND_EVENT_INVITE.to_string(),
                message: format!("You were invited to \"{}\"", event.title),
                metadata: Some(serde_json::json!({
                    "invited_by": auth.user_id,
                    "original_event_id": event.id,
                })),
            })
            .await;
        invited_users.push(invitee.id);
    }

    let updated = EventRepo::add_invitations(&state.pool, event_id, &invited_users, &emails)
        .await?
        .ok_or_else(|| AppError::not_found("Event", event_id))?;

    tracing::info!(
        user_id = auth.user_id,
        event_id,
        emails = emails.len(),
        users = invited_users.len(),
        "Event invitations sent"
    );
    Ok(Json(DataResponse { data: updated }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load an event the requester created; anything else is 404.
async fn load_own_event(pool: &DbPool, event_id: DbId, user_id: DbId) -> AppResult<Event> {
    EventRepo::find_by_id(pool, event_id)
        .await?
        .filter(|e| e.creator_id == user_id)
        .ok_or_else(|| AppError::not_found("Event", event_id))
}

fn reject_read_only(event: &Event) -> AppResult<()> {
    if event.read_only {
        return Err(AppError::Core(CoreError::Forbidden(
            "Read-only events cannot be modified".into(),
        )));
    }
    Ok(())
}

fn validate_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Event title must not be empty".into(),
        )));
    }
    Ok(title.to_string())
}

fn validate_duration(duration: i32) -> AppResult<()> {
    if duration < 0 {
        return Err(AppError::Core(CoreError::Validation(
            "Event duration must not be negative".into(),
        )));
    }
    Ok(())
}
