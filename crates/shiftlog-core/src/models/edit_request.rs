//! Edit request model
//!
//! An edit request is the only sanctioned path for retroactively altering
//! the event log. Approval appends a correction event; the original row is
//! always retained for audit.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CompanyId, EventId, RequestId, UserId};
use super::time_event::EventKind;

/// Lifecycle state of an edit request; terminal states are immutable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    /// Stable string form used in storage and CLI arguments
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether the request can still be decided
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown request status: {other}")),
        }
    }
}

/// A proposed correction to the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditRequest {
    /// Unique identifier
    pub id: RequestId,
    /// The employee asking for the correction
    pub user_id: UserId,
    pub company_id: CompanyId,
    /// Event being corrected; `None` means "add a missing entry"
    pub target_event_id: Option<EventId>,
    pub proposed_kind: EventKind,
    /// Proposed instant for the corrected/added entry (UTC)
    pub proposed_at: DateTime<Utc>,
    pub reason: String,
    pub status: RequestStatus,
    pub reviewer_id: Option<UserId>,
    pub review_comments: Option<String>,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl EditRequest {
    /// Create a new pending request
    #[must_use]
    pub fn new(
        user_id: UserId,
        company_id: CompanyId,
        target_event_id: Option<EventId>,
        proposed_kind: EventKind,
        proposed_at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: RequestId::new(),
            user_id,
            company_id,
            target_event_id,
            proposed_kind,
            proposed_at,
            reason: reason.into(),
            status: RequestStatus::Pending,
            reviewer_id: None,
            review_comments: None,
            created_at: Utc::now(),
            decided_at: None,
        }
    }

    /// The terminal copy of this request for the given decision.
    ///
    /// Only the decision fields change; the proposal itself is immutable.
    #[must_use]
    pub fn decided(
        &self,
        reviewer_id: UserId,
        approve: bool,
        comments: Option<String>,
        decided_at: DateTime<Utc>,
    ) -> Self {
        Self {
            status: if approve {
                RequestStatus::Approved
            } else {
                RequestStatus::Rejected
            },
            reviewer_id: Some(reviewer_id),
            review_comments: comments,
            decided_at: Some(decided_at),
            ..self.clone()
        }
    }
}
