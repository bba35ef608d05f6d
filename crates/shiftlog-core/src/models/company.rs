//! Company (tenant) and membership role models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::ids::CompanyId;

/// Role a user holds within one company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Manager,
    Admin,
    Owner,
}

impl Role {
    /// Stable string form used in storage and CLI arguments
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// Whether this role may decide edit requests and receives
    /// end-of-day closure summaries
    #[must_use]
    pub const fn can_approve(self) -> bool {
        matches!(self, Self::Manager | Self::Admin | Self::Owner)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employee" => Ok(Self::Employee),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A tenant
///
/// Calendar days and the auto-close cutoff are interpreted in the
/// company's local time, modeled as a fixed UTC offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    /// Offset of company-local time from UTC, in minutes
    pub utc_offset_minutes: i32,
    /// Company-local hour of the auto-close cutoff
    pub auto_close_hour: u32,
    /// Company-local minute of the auto-close cutoff
    pub auto_close_minute: u32,
    pub created_at: DateTime<Utc>,
}

impl Company {
    /// Create a company with the conventional 23:59 local cutoff
    #[must_use]
    pub fn new(name: impl Into<String>, utc_offset_minutes: i32) -> Self {
        Self {
            id: CompanyId::new(),
            name: name.into(),
            utc_offset_minutes,
            auto_close_hour: 23,
            auto_close_minute: 59,
            created_at: Utc::now(),
        }
    }

    /// The company's local offset from UTC
    ///
    /// Falls back to UTC if the stored offset is out of range (more than
    /// a day in either direction).
    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .unwrap_or_else(|| FixedOffset::east_opt(0).expect("zero offset is valid"))
    }
}
