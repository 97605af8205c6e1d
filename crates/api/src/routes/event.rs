//! Route definitions for the `/events` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::event;
use crate::state::AppState;

/// Routes mounted at `/events`.
///
/// ```text
/// GET    /                          -> list_events
/// POST   /                          -> create_event
/// GET    /with-calendar             -> list_events_with_calendar
/// PUT    /{id}                      -> update_event
/// DELETE /{id}                      -> delete_event
/// POST   /{id}/invite               -> invite_to_event
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(event::list_events).post(event::create_event))
        .route("/with-calendar", get(event::list_events_with_calendar))
        .route("/{id}", put(event::update_event).delete(event::delete_event))
        .route("/{id}/invite", post(event::invite_to_event))
}
