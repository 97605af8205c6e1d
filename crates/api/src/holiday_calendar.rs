//! Holiday-calendar bootstrap and region rebuild.
//!
//! Every user owns one holiday calendar filled with read-only, all-day events
//! generated from the public-holiday feed. A feed outage yields an empty
//! calendar rather than an error. The caller fetches the holidays first and
//! owns the transaction, so a failed write leaves nothing behind.

use chronos_core::calendar_access::CalendarDetails;
use chronos_core::event_category::CATEGORY_HOLIDAY;
use chronos_core::holiday::{holiday_calendar_name, Holiday, HOLIDAY_COLOR, HOLIDAY_DURATION_MINUTES};
use chronos_core::types::DbId;
use chronos_db::models::calendar::{Calendar, CreateCalendar};
use chronos_db::models::event::CreateEvent;
use chronos_db::repositories::{CalendarRepo, EventRepo};
use chronos_db::DbTransaction;

/// Build the event rows for a holiday calendar.
pub fn holiday_events(holidays: &[Holiday], calendar_id: DbId, owner_id: DbId) -> Vec<CreateEvent> {
    holidays
        .iter()
        .map(|holiday| CreateEvent {
            title: holiday.title().to_string(),
            date: holiday.starts_at(),
            duration: HOLIDAY_DURATION_MINUTES,
            all_day: true,
            category: CATEGORY_HOLIDAY.to_string(),
            description: Some(holiday.name.clone()),
            color: Some(HOLIDAY_COLOR.to_string()),
            calendar_id: Some(calendar_id),
            creator_id: owner_id,
            invited_from: None,
            read_only: true,
        })
        .collect()
}

/// Create the user's holiday calendar for `country` and `year` and fill it
/// with `holidays`, inside the caller's transaction.
pub async fn bootstrap(
    tx: &mut DbTransaction<'_>,
    holidays: &[Holiday],
    owner_id: DbId,
    country: &str,
    year: i32,
) -> Result<Calendar, sqlx::Error> {
    let calendar = CalendarRepo::create(
        &mut **tx,
        &CreateCalendar {
            name: holiday_calendar_name(country),
            description: None,
            color: Some(HOLIDAY_COLOR.to_string()),
            owner_id,
            is_holiday_calendar: true,
            holiday_country: Some(country.to_string()),
            holiday_year: Some(year),
            ..Default::default()
        },
    )
    .await?;

    let created =
        EventRepo::create_many_in(tx, &holiday_events(holidays, calendar.id, owner_id)).await?;

    tracing::info!(
        user_id = owner_id,
        calendar_id = calendar.id,
        country,
        year,
        events = created,
        "Holiday calendar bootstrapped"
    );
    Ok(calendar)
}

/// Point the user's holiday calendar at a new country and replace its
/// events with `holidays`, inside the caller's transaction.
///
/// Creates the calendar if the user has none.
pub async fn rebuild(
    tx: &mut DbTransaction<'_>,
    holidays: &[Holiday],
    owner_id: DbId,
    country: &str,
    year: i32,
) -> Result<Calendar, sqlx::Error> {
    let Some(existing) = CalendarRepo::find_holiday_for_owner(&mut **tx, owner_id).await? else {
        return bootstrap(tx, holidays, owner_id, country, year).await;
    };

    let details = CalendarDetails {
        name: holiday_calendar_name(country),
        holiday_country: Some(country.to_string()),
        holiday_year: Some(year),
        ..existing.details()
    };
    let calendar = CalendarRepo::update_details(&mut **tx, existing.id, &details)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;

    let removed = EventRepo::delete_by_calendar(&mut **tx, calendar.id).await?;
    let created =
        EventRepo::create_many_in(tx, &holiday_events(holidays, calendar.id, owner_id)).await?;

    tracing::info!(
        user_id = owner_id,
        calendar_id = calendar.id,
        country,
        year,
        removed,
        created,
        "Holiday calendar rebuilt"
    );
    Ok(calendar)
}
