//! Public-holiday records and the rules for turning them into calendar events.

use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// Holiday events span the whole day.
pub const HOLIDAY_DURATION_MINUTES: i32 = 24 * 60;

/// Default color for holiday calendars and their events.
pub const HOLIDAY_COLOR: &str = "#e57373";

/// A public holiday as returned by the holiday feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    pub date: NaiveDate,
    /// Name in the country's own language.
    pub local_name: String,
    /// English name.
    pub name: String,
    pub country_code: String,
}

impl Holiday {
    /// Title shown on the generated event. Prefers the local name.
    pub fn title(&self) -> &str {
        if self.local_name.trim().is_empty() {
            &self.name
        } else {
            &self.local_name
        }
    }

    /// Start of the holiday at UTC midnight.
    pub fn starts_at(&self) -> Timestamp {
        Utc.from_utc_datetime(&self.date.and_time(chrono::NaiveTime::MIN))
    }
}

/// Name given to the auto-created holiday calendar.
pub fn holiday_calendar_name(country: &str) -> String {
    format!("Holidays ({country})")
}

/// Normalize a region code to the two-letter upper-case form the feed expects.
pub fn normalize_region(region: &str) -> Result<String, String> {
    let code = region.trim().to_ascii_uppercase();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(format!(
            "Holiday region must be a two-letter country code, got '{region}'"
        ));
    }
    Ok(code)
}
