//! `shiftlog status` - current session state

use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use shiftlog_core::db::LibSqlEventRepository;
use shiftlog_core::reconcile::{current_status, SessionDay, SessionStatus};
use shiftlog_core::retry::RetryPolicy;

use crate::error::CliError;

use super::common::{format_hm, open_database, parse_id, require_company};

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    user: &'a str,
    company: &'a str,
    #[serde(flatten)]
    session: &'a SessionDay,
}

pub async fn run_status(
    user: &str,
    company: &str,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let company_row = require_company(&db, company).await?;
    let user_id = parse_id(user)?;

    let repo = LibSqlEventRepository::new(db.connection());
    let session = current_status(
        &repo,
        &RetryPolicy::default(),
        &company_row,
        &user_id,
        Utc::now(),
    )
    .await?;

    if as_json {
        let report = StatusReport {
            user,
            company,
            session: &session,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_session(&session);
    }

    Ok(())
}

fn print_session(session: &SessionDay) {
    let label = match session.status {
        SessionStatus::Off => "off",
        SessionStatus::Working => "working",
        SessionStatus::OnBreak => "on break",
    };
    println!("status:  {label}");
    if let Some(open_since) = session.open_since {
        println!("since:   {}", open_since.to_rfc3339());
    }
    println!("worked:  {}", format_hm(session.worked_seconds));
    println!("break:   {}", format_hm(session.break_seconds));
    if !session.anomalies.is_empty() {
        println!("anomalies:");
        for anomaly in &session.anomalies {
            println!(
                "  {} {} at {} (while {})",
                anomaly.event_id,
                anomaly.kind,
                anomaly.recorded_at.to_rfc3339(),
                match anomaly.state {
                    SessionStatus::Off => "off",
                    SessionStatus::Working => "working",
                    SessionStatus::OnBreak => "on break",
                }
            );
        }
    }
}
