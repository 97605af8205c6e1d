/// Primary key of users, calendars, events, and notifications (BIGSERIAL).
pub type DbId = i64;

/// Stored and serialized in UTC; the client converts to local time.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
