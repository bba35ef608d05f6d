//! `shiftlog member` - membership management

use std::path::Path;

use shiftlog_core::db::LibSqlDirectory;
use shiftlog_core::models::UserId;

use crate::cli::RoleArg;
use crate::error::CliError;

use super::common::{open_database, parse_id, require_company};

pub async fn run_member_add(
    user: Option<&str>,
    company: &str,
    role: RoleArg,
    name: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let company = require_company(&db, company).await?;

    let user_id = match user {
        Some(raw) => parse_id(raw)?,
        None => UserId::new(),
    };

    let directory = LibSqlDirectory::new(db.connection());
    directory
        .upsert_membership(&user_id, &company.id, role.role(), name)
        .await?;

    println!("{user_id}");
    Ok(())
}
