//! `shiftlog close-day` - run the end-of-day closer
//!
//! Both this manual entry point and any scheduled trigger are safe to
//! run concurrently or repeatedly; the closer never double-closes.

use std::path::Path;

use chrono::Utc;
use shiftlog_core::closer::{CloseRunSummary, EndOfDayCloser};
use shiftlog_core::db::{LibSqlDirectory, LibSqlEventRepository};
use shiftlog_core::models::DayWindow;
use shiftlog_core::notify::TracingSink;

use crate::error::CliError;

use super::common::{open_database, parse_date, parse_instant, require_company};

pub async fn run_close_day(
    date: Option<&str>,
    company: Option<&str>,
    cutoff: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let repo = LibSqlEventRepository::new(db.connection());
    let directory = LibSqlDirectory::new(db.connection());
    let sink = TracingSink;
    let closer = EndOfDayCloser::new(&repo, &directory, &sink);

    let summary = match company {
        Some(raw_company) => {
            let company = require_company(&db, raw_company).await?;
            let day = match date {
                Some(raw) => parse_date(raw)?,
                None => Utc::now().with_timezone(&company.utc_offset()).date_naive(),
            };
            let window = DayWindow::for_day(day, company.utc_offset());
            let cutoff_instant = match cutoff {
                Some(raw) => parse_instant(raw, company.utc_offset())?,
                None => window.cutoff(company.auto_close_hour, company.auto_close_minute),
            };
            closer
                .close_company_day(&company, day, cutoff_instant)
                .await?
        }
        None => {
            let day = match date {
                Some(raw) => parse_date(raw)?,
                None => Utc::now().date_naive(),
            };
            closer.run_all(day).await?
        }
    };

    print_summary(&summary);
    Ok(())
}

fn print_summary(summary: &CloseRunSummary) {
    println!(
        "closed {} of {} open session(s)",
        summary.closed, summary.candidates
    );
    for (user_id, error) in &summary.errors {
        println!("failed for {user_id}: {error}");
    }
}
