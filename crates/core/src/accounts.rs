//! Account input rules shared by registration and profile updates.

use serde::Deserialize;
use validator::Validate;

/// Minimum password length accepted at registration and password change.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Fields a new user submits at registration.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAccount {
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 100, message = "Full name must not be empty"))]
    pub full_name: String,
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    /// Two-letter country code for the holiday calendar. Server default when absent.
    pub holiday_region: Option<String>,
}

/// Flatten `validator` errors into a single human-readable message.
pub fn describe_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("Invalid value for {field}"),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
