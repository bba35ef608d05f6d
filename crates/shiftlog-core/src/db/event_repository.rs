//! Punch event store
//!
//! The event log is append-only: nothing here updates or deletes a row.
//! Sequence validity is not enforced at this layer; the reconciler
//! reports violations instead.

use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{CompanyId, EventId, Geolocation, TimeEvent, UserId};

use super::row;

const EVENT_COLUMNS: &str =
    "id, user_id, company_id, kind, recorded_at, latitude, longitude, note, created_via, created_at";

/// Trait for append-only punch event storage (async)
#[allow(async_fn_in_trait)]
pub trait EventRepository {
    /// Append one event
    async fn append(&self, event: &TimeEvent) -> Result<()>;

    /// Append several events as one atomic unit
    async fn append_all(&self, events: &[TimeEvent]) -> Result<()>;

    /// Get an event by id
    async fn get(&self, id: &EventId) -> Result<Option<TimeEvent>>;

    /// One user's events with `from <= recorded_at <= to`, ordered by
    /// timestamp ascending, ties broken by id (insertion order)
    async fn events_in_range(
        &self,
        user_id: &UserId,
        company_id: &CompanyId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeEvent>>;

    /// Users of a company with at least one event in the range
    async fn users_with_events(
        &self,
        company_id: &CompanyId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UserId>>;
}

/// libSQL implementation of `EventRepository`
pub struct LibSqlEventRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlEventRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Plain INSERT without transaction control; callers own the
    /// enclosing transaction when there is one
    pub(super) async fn insert_row(&self, event: &TimeEvent) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO time_events
                 (id, user_id, company_id, kind, recorded_at, latitude, longitude, note, created_via, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    event.id.as_str(),
                    event.user_id.as_str(),
                    event.company_id.as_str(),
                    event.kind.as_str(),
                    row::ms(event.recorded_at),
                    row::opt_real(event.location.map(|loc| loc.latitude)),
                    row::opt_real(event.location.map(|loc| loc.longitude)),
                    row::opt_text(event.note.as_deref()),
                    event.created_via.as_str(),
                    row::ms(event.created_at),
                ],
            )
            .await?;
        Ok(())
    }

    fn parse_event(row: &libsql::Row) -> Result<TimeEvent> {
        let latitude = row::get_opt_real(row, 5, "latitude")?;
        let longitude = row::get_opt_real(row, 6, "longitude")?;
        let location = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => Some(Geolocation {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Ok(TimeEvent {
            id: row::parse(&row.get::<String>(0)?, "id")?,
            user_id: row::parse(&row.get::<String>(1)?, "user_id")?,
            company_id: row::parse(&row.get::<String>(2)?, "company_id")?,
            kind: row::parse(&row.get::<String>(3)?, "kind")?,
            recorded_at: row::instant(row.get::<i64>(4)?, "recorded_at")?,
            location,
            note: row::get_opt_text(row, 7, "note")?,
            created_via: row::parse(&row.get::<String>(8)?, "created_via")?,
            created_at: row::instant(row.get::<i64>(9)?, "created_at")?,
        })
    }
}

impl EventRepository for LibSqlEventRepository<'_> {
    async fn append(&self, event: &TimeEvent) -> Result<()> {
        self.insert_row(event).await
    }

    async fn append_all(&self, events: &[TimeEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        self.conn.execute("BEGIN IMMEDIATE", ()).await?;
        for event in events {
            if let Err(error) = self.insert_row(event).await {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                return Err(error);
            }
        }
        self.conn.execute("COMMIT", ()).await?;
        Ok(())
    }

    async fn get(&self, id: &EventId) -> Result<Option<TimeEvent>> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {EVENT_COLUMNS} FROM time_events WHERE id = ?"),
                params![id.as_str()],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_event(&row)?)),
            None => Ok(None),
        }
    }

    async fn events_in_range(
        &self,
        user_id: &UserId,
        company_id: &CompanyId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TimeEvent>> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {EVENT_COLUMNS} FROM time_events
                     WHERE company_id = ? AND user_id = ? AND recorded_at BETWEEN ? AND ?
                     ORDER BY recorded_at ASC, id ASC"
                ),
                params![
                    company_id.as_str(),
                    user_id.as_str(),
                    row::ms(from),
                    row::ms(to)
                ],
            )
            .await?;

        let mut events = Vec::new();
        while let Some(row) = rows.next().await? {
            events.push(Self::parse_event(&row)?);
        }
        Ok(events)
    }

    async fn users_with_events(
        &self,
        company_id: &CompanyId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UserId>> {
        let mut rows = self
            .conn
            .query(
                "SELECT DISTINCT user_id FROM time_events
                 WHERE company_id = ? AND recorded_at BETWEEN ? AND ?
                 ORDER BY user_id ASC",
                params![company_id.as_str(), row::ms(from), row::ms(to)],
            )
            .await?;

        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(row::parse(&row.get::<String>(0)?, "user_id")?);
        }
        Ok(users)
    }
}
