use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use shiftlog_core::EventKind;

#[derive(Parser)]
#[command(name = "shiftlog")]
#[command(about = "Track attendance punches and reconcile daily work sessions")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a company
    Init {
        /// Company display name
        #[arg(long)]
        name: String,
        /// Minutes the company clock runs ahead of UTC
        #[arg(long, default_value = "0", value_name = "MINUTES", allow_hyphen_values = true)]
        utc_offset: i32,
        /// Company-local auto-close cutoff
        #[arg(long, default_value = "23:59", value_name = "HH:MM")]
        cutoff: String,
    },
    /// Manage company memberships
    Member {
        #[command(subcommand)]
        command: MemberCommands,
    },
    /// Record a punch event
    Punch {
        /// Punch action
        #[arg(value_enum)]
        kind: PunchKind,
        /// User id
        #[arg(long, value_name = "USER_ID")]
        user: String,
        /// Company id
        #[arg(long, value_name = "COMPANY_ID")]
        company: String,
        /// Punch instant, RFC 3339 or company-local "YYYY-MM-DD HH:MM"
        /// (defaults to now)
        #[arg(long, value_name = "WHEN")]
        at: Option<String>,
        /// Optional note
        #[arg(long)]
        note: Option<String>,
        /// Latitude of the punch location
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Longitude of the punch location
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// Show a user's current session state
    Status {
        /// User id
        #[arg(long, value_name = "USER_ID")]
        user: String,
        /// Company id
        #[arg(long, value_name = "COMPANY_ID")]
        company: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the reconstructed session for one calendar day
    Day {
        /// User id
        #[arg(long, value_name = "USER_ID")]
        user: String,
        /// Company id
        #[arg(long, value_name = "COMPANY_ID")]
        company: String,
        /// Company-local calendar day
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Close unterminated sessions for a day
    CloseDay {
        /// Target calendar day (defaults to today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
        /// Close a single company instead of sweeping all of them
        #[arg(long, value_name = "COMPANY_ID")]
        company: Option<String>,
        /// Explicit cutoff instant, RFC 3339 (defaults to the company's
        /// configured local cutoff)
        #[arg(long, value_name = "WHEN", requires = "company")]
        cutoff: Option<String>,
    },
    /// Submit, decide, and list edit requests
    Request {
        #[command(subcommand)]
        command: RequestCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum MemberCommands {
    /// Add a user to a company, or change an existing member's role
    Add {
        /// User id (a new one is generated when omitted)
        #[arg(long, value_name = "USER_ID")]
        user: Option<String>,
        /// Company id
        #[arg(long, value_name = "COMPANY_ID")]
        company: String,
        /// Membership role
        #[arg(long, value_enum)]
        role: RoleArg,
        /// Display name
        #[arg(long, default_value = "")]
        name: String,
    },
}

#[derive(Subcommand)]
pub enum RequestCommands {
    /// Submit a correction to the event log
    Submit {
        /// User id
        #[arg(long, value_name = "USER_ID")]
        user: String,
        /// Company id
        #[arg(long, value_name = "COMPANY_ID")]
        company: String,
        /// Event to correct (omit to add a missing entry)
        #[arg(long, value_name = "EVENT_ID")]
        target: Option<String>,
        /// Proposed punch kind
        #[arg(long, value_enum)]
        kind: PunchKind,
        /// Proposed instant, RFC 3339 or company-local "YYYY-MM-DD HH:MM"
        #[arg(long, value_name = "WHEN")]
        at: String,
        /// Why the correction is needed
        #[arg(long)]
        reason: String,
    },
    /// Approve or reject a pending request
    Decide {
        /// Request id
        #[arg(long, value_name = "REQUEST_ID")]
        id: String,
        /// Reviewer user id
        #[arg(long, value_name = "USER_ID")]
        reviewer: String,
        /// Approve the request
        #[arg(long, conflicts_with = "reject")]
        approve: bool,
        /// Reject the request
        #[arg(long)]
        reject: bool,
        /// Review comments
        #[arg(long)]
        comments: Option<String>,
    },
    /// List a company's requests
    List {
        /// Company id
        #[arg(long, value_name = "COMPANY_ID")]
        company: String,
        /// Filter by status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        /// Number of requests to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum PunchKind {
    In,
    Out,
    BreakStart,
    BreakEnd,
}

impl PunchKind {
    /// The event kind this argument stands for
    #[must_use]
    pub const fn event_kind(self) -> EventKind {
        match self {
            Self::In => EventKind::ClockIn,
            Self::Out => EventKind::ClockOut,
            Self::BreakStart => EventKind::BreakStart,
            Self::BreakEnd => EventKind::BreakEnd,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum RoleArg {
    Employee,
    Manager,
    Admin,
    Owner,
}

impl RoleArg {
    #[must_use]
    pub const fn role(self) -> shiftlog_core::models::Role {
        match self {
            Self::Employee => shiftlog_core::models::Role::Employee,
            Self::Manager => shiftlog_core::models::Role::Manager,
            Self::Admin => shiftlog_core::models::Role::Admin,
            Self::Owner => shiftlog_core::models::Role::Owner,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Approved,
    Rejected,
}

impl StatusArg {
    #[must_use]
    pub const fn status(self) -> shiftlog_core::models::RequestStatus {
        match self {
            Self::Pending => shiftlog_core::models::RequestStatus::Pending,
            Self::Approved => shiftlog_core::models::RequestStatus::Approved,
            Self::Rejected => shiftlog_core::models::RequestStatus::Rejected,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
