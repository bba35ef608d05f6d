//! Helpers shared by the CLI commands

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use shiftlog_core::db::{Database, Directory, LibSqlDirectory};
use shiftlog_core::models::Company;

use crate::error::CliError;

/// Resolve the database path: `--db-path` flag, then `SHIFTLOG_DB_PATH`,
/// then the platform data directory
pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("SHIFTLOG_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shiftlog")
        .join("shiftlog.db")
}

/// Open (and migrate) the database at `path`
pub async fn open_database(path: &Path) -> Result<Database, CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(Database::open(path).await?)
}

/// Parse an id argument into its typed form
pub fn parse_id<T>(raw: &str) -> Result<T, CliError>
where
    T: FromStr,
{
    raw.trim()
        .parse()
        .map_err(|_| CliError::InvalidId(raw.to_string()))
}

/// Parse a `YYYY-MM-DD` date argument
pub fn parse_date(raw: &str) -> Result<NaiveDate, CliError> {
    raw.trim()
        .parse()
        .map_err(|_| CliError::InvalidDate(raw.to_string()))
}

/// Parse an `HH:MM` wall-clock time argument
pub fn parse_wall_clock(raw: &str) -> Result<(u32, u32), CliError> {
    let invalid = || CliError::InvalidTime(raw.to_string());

    let (hour, minute) = raw.trim().split_once(':').ok_or_else(invalid)?;
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

/// Parse an instant argument: RFC 3339, or `"YYYY-MM-DD HH:MM"` read on
/// the company-local clock
pub fn parse_instant(raw: &str, offset: FixedOffset) -> Result<DateTime<Utc>, CliError> {
    let trimmed = raw.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }

    let local = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M")
        .map_err(|_| CliError::InvalidInstant(raw.to_string()))?;
    offset
        .from_local_datetime(&local)
        .single()
        .map(|instant| instant.with_timezone(&Utc))
        .ok_or_else(|| CliError::InvalidInstant(raw.to_string()))
}

/// Look up a company or fail with a CLI-friendly error
pub async fn require_company(db: &Database, raw_id: &str) -> Result<Company, CliError> {
    let company_id = parse_id(raw_id)?;
    let directory = LibSqlDirectory::new(db.connection());
    directory
        .company(&company_id)
        .await?
        .ok_or_else(|| CliError::CompanyNotFound(raw_id.to_string()))
}

/// Render a second count as `3h12m`
#[must_use]
pub fn format_hm(total_seconds: i64) -> String {
    let total_minutes = total_seconds.max(0) / 60;
    format!("{}h{:02}m", total_minutes / 60, total_minutes % 60)
}
