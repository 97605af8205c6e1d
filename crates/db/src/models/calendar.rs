//! Calendar entity model and DTOs.

use chronos_core::calendar_access::{CalendarAccess, CalendarDetails};
use chronos_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::user::UserSummary;

/// A row from the `calendars` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Calendar {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub owner_id: DbId,
    pub editors: Vec<DbId>,
    pub members: Vec<DbId>,
    pub is_main: bool,
    pub is_holiday_calendar: bool,
    pub is_hidden: bool,
    pub holiday_country: Option<String>,
    pub holiday_year: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Calendar {
    /// Access-control view of this calendar.
    pub fn access(&self) -> CalendarAccess {
        CalendarAccess {
            owner_id: self.owner_id,
            editors: self.editors.clone(),
            members: self.members.clone(),
            is_main: self.is_main,
            is_holiday_calendar: self.is_holiday_calendar,
            is_hidden: self.is_hidden,
        }
    }

    /// User-editable fields of this calendar.
    pub fn details(&self) -> CalendarDetails {
        CalendarDetails {
            name: self.name.clone(),
            description: self.description.clone(),
            color: self.color.clone(),
            holiday_country: self.holiday_country.clone(),
            holiday_year: self.holiday_year,
        }
    }
}

/// DTO for creating a calendar.
///
/// `is_main` and `is_holiday_calendar` are only ever set by the registration
/// bootstrap; the HTTP create endpoint always passes `false`.
#[derive(Debug, Clone, Default)]
pub struct CreateCalendar {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub owner_id: DbId,
    pub is_main: bool,
    pub is_holiday_calendar: bool,
    pub holiday_country: Option<String>,
    pub holiday_year: Option<i32>,
}

/// Request body for creating a calendar through the API.
#[derive(Debug, Deserialize)]
pub struct NewCalendar {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// Calendar with owner, editors, and members resolved to user summaries.
#[derive(Debug, Clone, Serialize)]
pub struct PopulatedCalendar {
    #[serde(flatten)]
    pub calendar: Calendar,
    pub owner: Option<UserSummary>,
    pub editor_users: Vec<UserSummary>,
    pub member_users: Vec<UserSummary>,
}

/// Calendar reference embedded in event listings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CalendarSummary {
    pub id: DbId,
    pub name: String,
    pub color: Option<String>,
}
