use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use shared::{
    domain::{Attendee, AttendeeDraft, AttendeeId, AttendeeStatus, Event, EventId},
    lifecycle::apply_status,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    collections::HashMap,
    fs,
    path::Path,
    str::FromStr,
};
use tracing::{debug, info};

const ATTENDEE_COLUMNS: &str =
    "id, event_id, first_name, last_name, email, status, check_in_time";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        create_database_dir(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        // every in-memory connection is a separate database
        let max_connections = if is_in_memory(database_url) { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn list_events(&self) -> Result<Vec<Event>> {
        let event_rows = sqlx::query("SELECT id, name, date FROM events ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("failed to load events")?;
        let attendee_rows = sqlx::query(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to load attendees")?;

        let mut by_event: HashMap<EventId, Vec<Attendee>> = HashMap::new();
        for row in &attendee_rows {
            let attendee = attendee_from_row(row)?;
            by_event.entry(attendee.event_id).or_default().push(attendee);
        }

        let events = event_rows
            .iter()
            .map(|row| {
                let mut event = event_from_row(row)?;
                event.attendees = by_event.remove(&event.id).unwrap_or_default();
                Ok(event)
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(events = events.len(), "listed events");
        Ok(events)
    }

    pub async fn get_event(&self, event_id: EventId) -> Result<Option<Event>> {
        let Some(row) = sqlx::query("SELECT id, name, date FROM events WHERE id = ?")
            .bind(event_id.0)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let mut event = event_from_row(&row)?;
        event.attendees = sqlx::query(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE event_id = ? ORDER BY id"
        ))
        .bind(event_id.0)
        .fetch_all(&self.pool)
        .await?
        .iter()
        .map(attendee_from_row)
        .collect::<Result<Vec<_>>>()?;
        Ok(Some(event))
    }

    pub async fn get_attendee(&self, attendee_id: AttendeeId) -> Result<Option<Attendee>> {
        let row = sqlx::query(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE id = ?"
        ))
        .bind(attendee_id.0)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(attendee_from_row).transpose()
    }

    /// Inserts the event and its whole roster in one transaction. Every
    /// attendee starts out `Registered`.
    pub async fn create_event(
        &self,
        name: &str,
        date: DateTime<Utc>,
        drafts: &[AttendeeDraft],
    ) -> Result<Event> {
        let mut tx = self.pool.begin().await?;

        let rec = sqlx::query("INSERT INTO events (name, date) VALUES (?, ?) RETURNING id")
            .bind(name)
            .bind(date)
            .fetch_one(&mut *tx)
            .await
            .context("failed to insert event")?;
        let event_id = EventId(rec.get::<i64, _>(0));

        let mut attendees = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let row = sqlx::query(&format!(
                "INSERT INTO attendees (event_id, first_name, last_name, email, status, check_in_time)
                 VALUES (?, ?, ?, ?, ?, NULL)
                 RETURNING {ATTENDEE_COLUMNS}"
            ))
            .bind(event_id.0)
            .bind(&draft.first_name)
            .bind(&draft.last_name)
            .bind(&draft.email)
            .bind(AttendeeStatus::Registered.as_str())
            .fetch_one(&mut *tx)
            .await
            .context("failed to insert attendee")?;
            attendees.push(attendee_from_row(&row)?);
        }

        tx.commit().await?;
        info!(%event_id, attendees = attendees.len(), "created event");

        Ok(Event {
            id: event_id,
            name: name.to_string(),
            date,
            attendees,
        })
    }

    /// Deletes the event's attendees, then the event. Returns `false` when the
    /// event did not exist.
    pub async fn delete_event(&self, event_id: EventId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let attendees = sqlx::query("DELETE FROM attendees WHERE event_id = ?")
            .bind(event_id.0)
            .execute(&mut *tx)
            .await
            .context("failed to delete attendees")?
            .rows_affected();
        let events = sqlx::query("DELETE FROM events WHERE id = ?")
            .bind(event_id.0)
            .execute(&mut *tx)
            .await
            .context("failed to delete event")?
            .rows_affected();

        tx.commit().await?;
        info!(%event_id, attendees, deleted = events > 0, "deleted event");
        Ok(events > 0)
    }

    /// Moves one attendee to `status`, deriving `check_in_time` from the row's
    /// current state and `now`.
    pub async fn update_attendee_status(
        &self,
        attendee_id: AttendeeId,
        status: AttendeeStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Attendee>> {
        let mut tx = self.pool.begin().await?;

        let Some(row) = sqlx::query(&format!(
            "SELECT {ATTENDEE_COLUMNS} FROM attendees WHERE id = ?"
        ))
        .bind(attendee_id.0)
        .fetch_optional(&mut *tx)
        .await?
        else {
            return Ok(None);
        };
        let next = apply_status(&attendee_from_row(&row)?, status, now);

        let row = sqlx::query(&format!(
            "UPDATE attendees SET status = ?, check_in_time = ? WHERE id = ?
             RETURNING {ATTENDEE_COLUMNS}"
        ))
        .bind(next.status.as_str())
        .bind(next.check_in_time)
        .bind(attendee_id.0)
        .fetch_one(&mut *tx)
        .await
        .context("failed to update attendee")?;

        tx.commit().await?;
        let updated = attendee_from_row(&row)?;
        info!(
            %attendee_id,
            event_id = %updated.event_id,
            status = %updated.status,
            "updated attendee status"
        );
        Ok(Some(updated))
    }
}

fn event_from_row(row: &SqliteRow) -> Result<Event> {
    Ok(Event {
        id: EventId(row.try_get("id")?),
        name: row.try_get("name")?,
        date: row.try_get("date")?,
        attendees: Vec::new(),
    })
}

fn attendee_from_row(row: &SqliteRow) -> Result<Attendee> {
    let status: String = row.try_get("status")?;
    Ok(Attendee {
        id: AttendeeId(row.try_get("id")?),
        event_id: EventId(row.try_get("event_id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        status: status
            .parse()
            .map_err(|err| anyhow!("corrupt attendee row: {err}"))?,
        check_in_time: row.try_get("check_in_time")?,
    })
}

fn is_in_memory(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

/// File path of a file-backed SQLite URL, without query parameters.
fn sqlite_file_path(database_url: &str) -> Option<&Path> {
    if is_in_memory(database_url) {
        return None;
    }
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().filter(|path| !path.is_empty())?;
    Some(Path::new(path))
}

fn create_database_dir(database_url: &str) -> Result<()> {
    let Some(dir) = sqlite_file_path(database_url).and_then(Path::parent) else {
        return Ok(());
    };
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create database directory {}", dir.display()))?;
    debug!(dir = %dir.display(), "created database directory");
    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
