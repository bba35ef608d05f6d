//! Punch event model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CompanyId, EventId, UserId};

/// Note attached to events the end-of-day closer synthesizes
pub const AUTO_CLOSE_NOTE: &str = "automatically closed at end of day";

/// The four punch actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ClockIn,
    ClockOut,
    BreakStart,
    BreakEnd,
}

impl EventKind {
    /// Stable string form used in storage and CLI arguments
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClockIn => "clock_in",
            Self::ClockOut => "clock_out",
            Self::BreakStart => "break_start",
            Self::BreakEnd => "break_end",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clock_in" => Ok(Self::ClockIn),
            "clock_out" => Ok(Self::ClockOut),
            "break_start" => Ok(Self::BreakStart),
            "break_end" => Ok(Self::BreakEnd),
            other => Err(format!("unknown event kind: {other}")),
        }
    }
}

/// Provenance of an event; the audit trail keeps synthetic and
/// correction events distinguishable from real punches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatedVia {
    /// A user punched in/out themselves
    Manual,
    /// Synthesized by the end-of-day closer
    SystemAutoClose,
    /// Inserted by an approved edit request
    EditApproved,
}

impl CreatedVia {
    /// Stable string form used in storage
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::SystemAutoClose => "system_auto_close",
            Self::EditApproved => "edit_approved",
        }
    }
}

impl FromStr for CreatedVia {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Self::Manual),
            "system_auto_close" => Ok(Self::SystemAutoClose),
            "edit_approved" => Ok(Self::EditApproved),
            other => Err(format!("unknown event provenance: {other}")),
        }
    }
}

/// Where a punch was recorded from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// One punch record
///
/// Events are append-only. The store never enforces sequence validity;
/// the reconciler detects and reports violations instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEvent {
    /// Unique identifier
    pub id: EventId,
    pub user_id: UserId,
    pub company_id: CompanyId,
    pub kind: EventKind,
    /// The instant the punch applies to (UTC)
    pub recorded_at: DateTime<Utc>,
    pub location: Option<Geolocation>,
    pub note: Option<String>,
    pub created_via: CreatedVia,
    /// When the row was appended (UTC); differs from `recorded_at` for
    /// synthetic and correction events
    pub created_at: DateTime<Utc>,
}

impl TimeEvent {
    /// Create a manually punched event recorded at `recorded_at`
    #[must_use]
    pub fn manual(
        user_id: UserId,
        company_id: CompanyId,
        kind: EventKind,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EventId::new(),
            user_id,
            company_id,
            kind,
            recorded_at,
            location: None,
            note: None,
            created_via: CreatedVia::Manual,
            created_at: Utc::now(),
        }
    }

    /// Create a synthetic event for the end-of-day closer
    #[must_use]
    pub fn auto_close(
        user_id: UserId,
        company_id: CompanyId,
        kind: EventKind,
        cutoff: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EventId::new(),
            user_id,
            company_id,
            kind,
            recorded_at: cutoff,
            location: None,
            note: Some(AUTO_CLOSE_NOTE.to_string()),
            created_via: CreatedVia::SystemAutoClose,
            created_at: Utc::now(),
        }
    }

    /// Attach a location
    #[must_use]
    pub const fn with_location(mut self, location: Geolocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Attach a free-form note
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
