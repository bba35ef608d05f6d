//! CLI error surface

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] shiftlog_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid identifier: {0}")]
    InvalidId(String),
    #[error("Invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
    #[error("Invalid time (expected HH:MM): {0}")]
    InvalidTime(String),
    #[error("Invalid instant (expected RFC 3339 or \"YYYY-MM-DD HH:MM\"): {0}")]
    InvalidInstant(String),
    #[error("Company not found: {0}")]
    CompanyNotFound(String),
    #[error("Exactly one of --approve or --reject is required")]
    MissingDecision,
}
