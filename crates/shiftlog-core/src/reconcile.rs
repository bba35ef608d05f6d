//! Session reconciler
//!
//! Folds one user's ordered punch events for one calendar day into the
//! derived session state. The fold is pure and total: anomalous events
//! are reported, never dropped silently or "fixed", and folding always
//! continues from the state that existed before the bad event, so one
//! stray punch cannot poison the rest of the day.
//!
//! `SessionDay` is recomputed on demand and never persisted; the event
//! log stays the single source of truth.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::EventRepository;
use crate::error::Result;
use crate::models::{Company, DayWindow, EventId, EventKind, TimeEvent, UserId};
use crate::retry::RetryPolicy;

/// Session state at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Off,
    Working,
    OnBreak,
}

impl SessionStatus {
    /// Whether a session or break is still open
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// An event that does not fit the session state machine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// The offending event
    pub event_id: EventId,
    pub kind: EventKind,
    pub recorded_at: DateTime<Utc>,
    /// Session state the event arrived in; folding continued from here
    pub state: SessionStatus,
}

/// Reconciled view of one user's calendar day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionDay {
    pub status: SessionStatus,
    /// Seconds spent working; excludes break time
    pub worked_seconds: i64,
    /// Seconds spent on break
    pub break_seconds: i64,
    /// When the still-open session began, if Working or OnBreak
    pub open_since: Option<DateTime<Utc>>,
    pub anomalies: Vec<Anomaly>,
}

impl SessionDay {
    /// An empty day: no events, nothing open
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            status: SessionStatus::Off,
            worked_seconds: 0,
            break_seconds: 0,
            open_since: None,
            anomalies: Vec::new(),
        }
    }
}

/// Fold an ordered event sequence into the day's session state.
///
/// `events` must already be filtered to one user and one company-local
/// calendar day and sorted ascending by timestamp, ties broken by id
/// (the store's range query returns exactly this order). Open intervals
/// accrue duration against `as_of`: "now" when reconstructing today, the
/// end-of-day cutoff when reconstructing a past day.
#[must_use]
pub fn reconstruct(events: &[TimeEvent], as_of: DateTime<Utc>) -> SessionDay {
    let mut status = SessionStatus::Off;
    let mut worked_seconds = 0;
    let mut break_seconds = 0;
    let mut open_since = None;
    let mut segment_start: Option<DateTime<Utc>> = None;
    let mut anomalies = Vec::new();

    for event in events {
        match (status, event.kind) {
            (SessionStatus::Off, EventKind::ClockIn) => {
                status = SessionStatus::Working;
                open_since = Some(event.recorded_at);
                segment_start = Some(event.recorded_at);
            }
            (SessionStatus::Working, EventKind::BreakStart) => {
                worked_seconds += elapsed_seconds(segment_start, event.recorded_at);
                status = SessionStatus::OnBreak;
                segment_start = Some(event.recorded_at);
            }
            (SessionStatus::OnBreak, EventKind::BreakEnd) => {
                break_seconds += elapsed_seconds(segment_start, event.recorded_at);
                status = SessionStatus::Working;
                segment_start = Some(event.recorded_at);
            }
            (SessionStatus::Working, EventKind::ClockOut) => {
                worked_seconds += elapsed_seconds(segment_start, event.recorded_at);
                status = SessionStatus::Off;
                open_since = None;
                segment_start = None;
            }
            _ => {
                anomalies.push(Anomaly {
                    event_id: event.id,
                    kind: event.kind,
                    recorded_at: event.recorded_at,
                    state: status,
                });
            }
        }
    }

    // An unterminated interval counts up to the reconstruction instant
    match status {
        SessionStatus::Working => worked_seconds += elapsed_seconds(segment_start, as_of),
        SessionStatus::OnBreak => break_seconds += elapsed_seconds(segment_start, as_of),
        SessionStatus::Off => {}
    }

    SessionDay {
        status,
        worked_seconds,
        break_seconds,
        open_since,
        anomalies,
    }
}

fn elapsed_seconds(from: Option<DateTime<Utc>>, to: DateTime<Utc>) -> i64 {
    from.map_or(0, |start| (to - start).num_seconds().max(0))
}

/// Fetch and reconstruct the company-local day containing `now`.
///
/// The result may be stale under concurrent writes; callers that just
/// issued a mutation re-fetch rather than trusting a cached view.
pub async fn current_status<E: EventRepository>(
    events: &E,
    retry: &RetryPolicy,
    company: &Company,
    user_id: &UserId,
    now: DateTime<Utc>,
) -> Result<SessionDay> {
    let window = DayWindow::containing(now, company.utc_offset());
    let day_events = retry
        .run(|| events.events_in_range(user_id, &company.id, window.start(), now))
        .await?;
    Ok(reconstruct(&day_events, now))
}
