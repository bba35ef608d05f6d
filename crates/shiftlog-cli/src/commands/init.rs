//! `shiftlog init` - register a company

use std::path::Path;

use shiftlog_core::db::LibSqlDirectory;
use shiftlog_core::models::Company;

use crate::error::CliError;

use super::common::{open_database, parse_wall_clock};

pub async fn run_init(
    name: &str,
    utc_offset: i32,
    cutoff: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let (hour, minute) = parse_wall_clock(cutoff)?;

    let mut company = Company::new(name, utc_offset);
    company.auto_close_hour = hour;
    company.auto_close_minute = minute;

    let db = open_database(db_path).await?;
    let directory = LibSqlDirectory::new(db.connection());
    directory.insert_company(&company).await?;

    println!("{}", company.id);
    Ok(())
}
