//! `shiftlog day` - reconstructed session for one calendar day

use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use shiftlog_core::db::{EventRepository, LibSqlEventRepository};
use shiftlog_core::models::{DayWindow, TimeEvent};
use shiftlog_core::reconcile::{reconstruct, SessionDay};

use crate::error::CliError;

use super::common::{format_hm, open_database, parse_date, parse_id, require_company};

#[derive(Debug, Serialize)]
struct DayReport<'a> {
    date: String,
    #[serde(flatten)]
    session: &'a SessionDay,
    events: Vec<EventLine>,
}

#[derive(Debug, Serialize)]
struct EventLine {
    id: String,
    kind: String,
    recorded_at: String,
    created_via: String,
}

pub async fn run_day(
    user: &str,
    company: &str,
    date: &str,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let company_row = require_company(&db, company).await?;
    let user_id = parse_id(user)?;
    let day = parse_date(date)?;

    let window = DayWindow::for_day(day, company_row.utc_offset());
    let cutoff = window.cutoff(company_row.auto_close_hour, company_row.auto_close_minute);
    // A still-running day accrues against now; past days stop at the cutoff
    let as_of = Utc::now().min(cutoff);

    let repo = LibSqlEventRepository::new(db.connection());
    let events = repo
        .events_in_range(
            &user_id,
            &company_row.id,
            window.start(),
            window.last_instant(),
        )
        .await?;
    let session = reconstruct(&events, as_of);

    if as_json {
        let report = DayReport {
            date: day.to_string(),
            session: &session,
            events: events.iter().map(event_line).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for event in &events {
            println!(
                "{}  {:<12} {}  ({})",
                event.recorded_at.to_rfc3339(),
                event.kind.to_string(),
                event.id,
                event.created_via.as_str()
            );
        }
        println!(
            "{}: worked {}, break {}, {} anomalies",
            day,
            format_hm(session.worked_seconds),
            format_hm(session.break_seconds),
            session.anomalies.len()
        );
    }

    Ok(())
}

fn event_line(event: &TimeEvent) -> EventLine {
    EventLine {
        id: event.id.to_string(),
        kind: event.kind.to_string(),
        recorded_at: event.recorded_at.to_rfc3339(),
        created_via: event.created_via.as_str().to_string(),
    }
}
