//! Route definitions for the `/users` resource.

use axum::routing::put;
use axum::Router;

use crate::handlers::user;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// PUT    /update                    -> update_profile
/// PUT    /change-password           -> change_password
/// PUT    /holiday-region            -> update_holiday_region
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/update", put(user::update_profile))
        .route("/change-password", put(user::change_password))
        .route("/holiday-region", put(user::update_holiday_region))
}
