//! Repository for the `calendars` table.
//!
//! Calendars are written as whole aggregates: the role sets are replaced in
//! one statement, last write wins.

use chronos_core::calendar_access::{CalendarAccess, CalendarDetails};
use chronos_core::types::DbId;
use sqlx::{PgExecutor, PgPool};

use crate::models::calendar::{Calendar, CreateCalendar};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, color, owner_id, editors, members, is_main, \
                       is_holiday_calendar, is_hidden, holiday_country, holiday_year, \
                       created_at, updated_at";

/// Provides CRUD and sharing operations for calendars.
pub struct CalendarRepo;

impl CalendarRepo {
    /// Insert a new calendar with empty role sets, returning the created row.
    pub async fn create<'e, E>(executor: E, input: &CreateCalendar) -> Result<Calendar, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "INSERT INTO calendars
                (name, description, color, owner_id, is_main, is_holiday_calendar,
                 holiday_country, holiday_year)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Calendar>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.color)
            .bind(input.owner_id)
            .bind(input.is_main)
            .bind(input.is_holiday_calendar)
            .bind(&input.holiday_country)
            .bind(input.holiday_year)
            .fetch_one(executor)
            .await
    }

    /// Find a calendar by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Calendar>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM calendars WHERE id = $1");
        sqlx::query_as::<_, Calendar>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List calendars the user owns, edits, or is a member of.
    ///
    /// Hidden calendars are excluded unless `include_hidden` is set, in which
    /// case hidden calendars the user *owns* are returned as well.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        include_hidden: bool,
    ) -> Result<Vec<Calendar>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM calendars
             WHERE (owner_id = $1 OR $1 = ANY(editors) OR $1 = ANY(members))
               AND (is_hidden = false OR ($2 AND owner_id = $1))
             ORDER BY is_main DESC, is_holiday_calendar DESC, created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Calendar>(&query)
            .bind(user_id)
            .bind(include_hidden)
            .fetch_all(pool)
            .await
    }

    /// The user's main calendar, if one exists.
    pub async fn find_main_for_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Option<Calendar>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM calendars WHERE owner_id = $1 AND is_main");
        sqlx::query_as::<_, Calendar>(&query)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// The user's holiday calendar, if one exists.
    pub async fn find_holiday_for_owner<'e, E>(
        executor: E,
        owner_id: DbId,
    ) -> Result<Option<Calendar>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "SELECT {COLUMNS} FROM calendars
             WHERE owner_id = $1 AND is_holiday_calendar
             ORDER BY id ASC LIMIT 1"
        );
        sqlx::query_as::<_, Calendar>(&query)
            .bind(owner_id)
            .fetch_optional(executor)
            .await
    }

    /// Overwrite the editable fields with already-merged details.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_details<'e, E>(
        executor: E,
        id: DbId,
        details: &CalendarDetails,
    ) -> Result<Option<Calendar>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            "UPDATE calendars SET
                name = $2,
                description = $3,
                color = $4,
                holiday_country = $5,
                holiday_year = $6,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Calendar>(&query)
            .bind(id)
            .bind(&details.name)
            .bind(&details.description)
            .bind(&details.color)
            .bind(&details.holiday_country)
            .bind(details.holiday_year)
            .fetch_optional(executor)
            .await
    }

    /// Replace both role sets with the state held by `access`.
    pub async fn save_roles(
        pool: &PgPool,
        id: DbId,
        access: &CalendarAccess,
    ) -> Result<Option<Calendar>, sqlx::Error> {
        let query = format!(
            "UPDATE calendars SET editors = $2, members = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Calendar>(&query)
            .bind(id)
            .bind(&access.editors)
            .bind(&access.members)
            .fetch_optional(pool)
            .await
    }

    /// Set or clear the hidden flag.
    pub async fn set_hidden(
        pool: &PgPool,
        id: DbId,
        hidden: bool,
    ) -> Result<Option<Calendar>, sqlx::Error> {
        let query = format!(
            "UPDATE calendars SET is_hidden = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Calendar>(&query)
            .bind(id)
            .bind(hidden)
            .fetch_optional(pool)
            .await
    }

    /// Delete a calendar and, via cascade, its events.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM calendars WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
