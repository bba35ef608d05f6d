//! `shiftlog request` - edit request submission and review

use std::path::Path;

use serde::Serialize;
use shiftlog_core::db::{
    LibSqlDirectory, LibSqlEventRepository, LibSqlRequestRepository, RequestRepository,
};
use shiftlog_core::models::EditRequest;
use shiftlog_core::notify::TracingSink;
use shiftlog_core::requests::EditRequestProcessor;

use crate::cli::{PunchKind, StatusArg};
use crate::error::CliError;

use super::common::{open_database, parse_id, parse_instant, require_company};

#[allow(clippy::too_many_arguments)]
pub async fn run_request_submit(
    user: &str,
    company: &str,
    target: Option<&str>,
    kind: PunchKind,
    at: &str,
    reason: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let company_row = require_company(&db, company).await?;
    let user_id = parse_id(user)?;
    let target_event_id = target.map(parse_id).transpose()?;
    let proposed_at = parse_instant(at, company_row.utc_offset())?;

    let requests = LibSqlRequestRepository::new(db.connection());
    let events = LibSqlEventRepository::new(db.connection());
    let directory = LibSqlDirectory::new(db.connection());
    let sink = TracingSink;
    let processor = EditRequestProcessor::new(&requests, &events, &directory, &sink);

    let request = processor
        .submit(
            user_id,
            company_row.id,
            target_event_id,
            kind.event_kind(),
            proposed_at,
            reason,
        )
        .await?;

    println!("{}", request.id);
    Ok(())
}

pub async fn run_request_decide(
    id: &str,
    reviewer: &str,
    approve: bool,
    reject: bool,
    comments: Option<String>,
    db_path: &Path,
) -> Result<(), CliError> {
    if approve == reject {
        return Err(CliError::MissingDecision);
    }

    let db = open_database(db_path).await?;
    let request_id = parse_id(id)?;
    let reviewer_id = parse_id(reviewer)?;

    let requests = LibSqlRequestRepository::new(db.connection());
    let events = LibSqlEventRepository::new(db.connection());
    let directory = LibSqlDirectory::new(db.connection());
    let sink = TracingSink;
    let processor = EditRequestProcessor::new(&requests, &events, &directory, &sink);

    let decided = processor
        .decide(&request_id, reviewer_id, approve, comments)
        .await?;

    println!("{} {}", decided.id, decided.status);
    Ok(())
}

#[derive(Debug, Serialize)]
struct RequestListItem {
    id: String,
    user_id: String,
    target_event_id: Option<String>,
    proposed_kind: String,
    proposed_at: String,
    reason: String,
    status: String,
    reviewer_id: Option<String>,
    created_at: String,
}

pub async fn run_request_list(
    company: &str,
    status: Option<StatusArg>,
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let company_row = require_company(&db, company).await?;

    let requests = LibSqlRequestRepository::new(db.connection());
    let listed = requests
        .list_for_company(&company_row.id, status.map(StatusArg::status), limit)
        .await?;

    if as_json {
        let items = listed.iter().map(request_item).collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for request in &listed {
            println!(
                "{}  {:<8}  {} {} at {}  ({})",
                request.id,
                request.status.to_string(),
                request.user_id,
                request.proposed_kind,
                request.proposed_at.to_rfc3339(),
                request.reason
            );
        }
    }

    Ok(())
}

fn request_item(request: &EditRequest) -> RequestListItem {
    RequestListItem {
        id: request.id.to_string(),
        user_id: request.user_id.to_string(),
        target_event_id: request.target_event_id.map(|id| id.to_string()),
        proposed_kind: request.proposed_kind.to_string(),
        proposed_at: request.proposed_at.to_rfc3339(),
        reason: request.reason.clone(),
        status: request.status.to_string(),
        reviewer_id: request.reviewer_id.map(|id| id.to_string()),
        created_at: request.created_at.to_rfc3339(),
    }
}
