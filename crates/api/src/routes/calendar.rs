//! Route definitions for the `/calendars` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::calendar;
use crate::state::AppState;

/// Routes mounted at `/calendars`.
///
/// ```text
/// GET    /                          -> list_calendars (?include_hidden)
/// POST   /                          -> create_calendar
/// GET    /{id}                      -> get_calendar
/// PUT    /{id}                      -> update_calendar
/// DELETE /{id}                      -> delete_calendar
/// PUT    /{id}/hide                 -> hide_calendar
/// PUT    /{id}/show                 -> show_calendar
/// POST   /{id}/invite               -> invite_user
/// POST   /{id}/members/update       -> update_member_role
/// POST   /{id}/members/remove       -> remove_member
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(calendar::list_calendars).post(calendar::create_calendar),
        )
        .route(
            "/{id}",
            get(calendar::get_calendar)
                .put(calendar::update_calendar)
                .delete(calendar::delete_calendar),
        )
        .route("/{id}/hide", put(calendar::hide_calendar))
        .route("/{id}/show", put(calendar::show_calendar))
        // Sharing
        .route("/{id}/invite", post(calendar::invite_user))
        .route("/{id}/members/update", post(calendar::update_member_role))
        .route("/{id}/members/remove", post(calendar::remove_member))
}
