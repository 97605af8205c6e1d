//! Repository for the `events` table.

use chronos_core::types::DbId;
use sqlx::{FromRow, PgExecutor, PgPool, Postgres, Transaction};

use crate::models::calendar::CalendarSummary;
use crate::models::event::{CreateEvent, Event, EventWithCalendar, UpdateEvent};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, title, date, duration, all_day, category, description, color, \
                       calendar_id, creator_id, invited_from, invited_users, invited_emails, \
                       read_only, created_at, updated_at";

/// [`COLUMNS`] qualified with the `e` alias for joins.
const QUALIFIED_COLUMNS: &str = "e.id, e.title, e.date, e.duration, e.all_day, e.category, \
                                 e.description, e.color, e.calendar_id, e.creator_id, \
                                 e.invited_from, e.invited_users, e.invited_emails, \
                                 e.read_only, e.created_at, e.updated_at";

/// Join row for [`EventRepo::list_by_creator_with_calendar`].
#[derive(FromRow)]
struct EventCalendarRow {
    #[sqlx(flatten)]
    event: Event,
    calendar_name: Option<String>,
    calendar_color: Option<String>,
}

/// Provides CRUD operations for events.
pub struct EventRepo;

impl EventRepo {
    /// Insert a new event, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateEvent) -> Result<Event, sqlx::Error> {
        let query = format!(
            "INSERT INTO events
                (title, date, duration, all_day, category, description, color,
                 calendar_id, creator_id, invited_from, read_only)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(&input.title)
            .bind(input.date)
            .bind(input.duration)
            .bind(input.all_day)
            .bind(&input.category)
            .bind(&input.description)
            .bind(&input.color)
            .bind(input.calendar_id)
            .bind(input.creator_id)
            .bind(input.invited_from)
            .bind(input.read_only)
            .fetch_one(pool)
            .await
    }

    /// Insert many events in a single transaction.
    ///
    /// Either every event is created or none is. Returns the number inserted.
    pub async fn create_many(pool: &PgPool, inputs: &[CreateEvent]) -> Result<u64, sqlx::Error> {
        if inputs.is_empty() {
            return Ok(0);
        }

        let mut tx = pool.begin().await?;
        let inserted = Self::create_many_in(&mut tx, inputs).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    /// Insert many events within an existing transaction.
    pub async fn create_many_in(
        tx: &mut Transaction<'_, Postgres>,
        inputs: &[CreateEvent],
    ) -> Result<u64, sqlx::Error> {
        let mut inserted = 0;
        for input in inputs {
            let result = sqlx::query(
                "INSERT INTO events
                    (title, date, duration, all_day, category, description, color,
                     calendar_id, creator_id, invited_from, read_only)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(&input.title)
            .bind(input.date)
            .bind(input.duration)
            .bind(input.all_day)
            .bind(&input.category)
            .bind(&input.description)
            .bind(&input.color)
            .bind(input.calendar_id)
            .bind(input.creator_id)
            .bind(input.invited_from)
            .bind(input.read_only)
            .execute(&mut **tx)
            .await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    /// Find an event by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Event>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every event created by the user, earliest first.
    pub async fn list_by_creator(pool: &PgPool, creator_id: DbId) -> Result<Vec<Event>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM events WHERE creator_id = $1 ORDER BY date ASC, id ASC"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(creator_id)
            .fetch_all(pool)
            .await
    }

    /// Same as [`list_by_creator`](Self::list_by_creator) with each event's
    /// calendar resolved to a summary.
    pub async fn list_by_creator_with_calendar(
        pool: &PgPool,
        creator_id: DbId,
    ) -> Result<Vec<EventWithCalendar>, sqlx::Error> {
        let query = format!(
            "SELECT {QUALIFIED_COLUMNS}, c.name AS calendar_name, c.color AS calendar_color
             FROM events e
             LEFT JOIN calendars c ON c.id = e.calendar_id
             WHERE e.creator_id = $1
             ORDER BY e.date ASC, e.id ASC"
        );
        let rows = sqlx::query_as::<_, EventCalendarRow>(&query)
            .bind(creator_id)
            .fetch_all(pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let calendar = match (row.event.calendar_id, row.calendar_name) {
                    (Some(id), Some(name)) => Some(CalendarSummary {
                        id,
                        name,
                        color: row.calendar_color,
                    }),
                    _ => None,
                };
                EventWithCalendar {
                    event: row.event,
                    calendar,
                }
            })
            .collect())
    }

    /// Update an event. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateEvent,
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET
                title = COALESCE($2, title),
                date = COALESCE($3, date),
                duration = COALESCE($4, duration),
                all_day = COALESCE($5, all_day),
                category = COALESCE($6, category),
                description = COALESCE($7, description),
                color = COALESCE($8, color),
                calendar_id = COALESCE($9, calendar_id),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(input.date)
            .bind(input.duration)
            .bind(input.all_day)
            .bind(&input.category)
            .bind(&input.description)
            .bind(&input.color)
            .bind(input.calendar_id)
            .fetch_optional(pool)
            .await
    }

    /// Record the invitation targets on the original event.
    ///
    /// New entries are appended; entries already present are not duplicated.
    pub async fn add_invitations(
        pool: &PgPool,
        id: DbId,
        user_ids: &[DbId],
        emails: &[String],
    ) -> Result<Option<Event>, sqlx::Error> {
        let query = format!(
            "UPDATE events SET
                invited_users = ARRAY(
                    SELECT DISTINCT unnest(invited_users || $2::BIGINT[])
                ),
                invited_emails = ARRAY(
                    SELECT DISTINCT unnest(invited_emails || $3::TEXT[])
                ),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(user_ids)
            .bind(emails)
            .fetch_optional(pool)
            .await
    }

    /// Delete an event only if `creator_id` created it.
    ///
    /// Returns `true` if a row was deleted.
    pub async fn delete_owned(pool: &PgPool, id: DbId, creator_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND creator_id = $2")
            .bind(id)
            .bind(creator_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every event attached to a calendar. Returns the number deleted.
    pub async fn delete_by_calendar<'e, E>(executor: E, calendar_id: DbId) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM events WHERE calendar_id = $1")
            .bind(calendar_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count events attached to a calendar.
    pub async fn count_by_calendar(pool: &PgPool, calendar_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE calendar_id = $1")
            .bind(calendar_id)
            .fetch_one(pool)
            .await
    }
}
