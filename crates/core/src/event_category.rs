//! Event category names.
//!
//! These must match the `ck_events_category` check constraint in the
//! `create_events_table` migration.

pub const CATEGORY_ARRANGEMENT: &str = "arrangement";
pub const CATEGORY_REMINDER: &str = "reminder";
pub const CATEGORY_TASK: &str = "task";

/// Reserved for events generated from the public-holiday feed.
pub const CATEGORY_HOLIDAY: &str = "holiday";

/// Categories a user may choose when creating or editing an event.
pub const USER_CATEGORIES: &[&str] = &[CATEGORY_ARRANGEMENT, CATEGORY_REMINDER, CATEGORY_TASK];

/// Category applied when a request omits one.
pub const DEFAULT_CATEGORY: &str = CATEGORY_ARRANGEMENT;

/// Returns `true` if `category` may be set through the event API.
pub fn is_user_category(category: &str) -> bool {
    USER_CATEGORIES.contains(&category)
}

/// Check a requested category, returning a human-readable reason on failure.
pub fn validate_user_category(category: &str) -> Result<(), String> {
    if category == CATEGORY_HOLIDAY {
        return Err("The holiday category is reserved for public-holiday events".into());
    }
    if !is_user_category(category) {
        return Err(format!(
            "Unknown event category '{category}'. Expected one of: {}",
            USER_CATEGORIES.join(", ")
        ));
    }
    Ok(())
}
