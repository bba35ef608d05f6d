//! `shiftlog punch` - record a punch event

use std::path::Path;

use chrono::Utc;
use shiftlog_core::db::{EventRepository, LibSqlEventRepository};
use shiftlog_core::models::{Geolocation, TimeEvent};

use crate::cli::PunchKind;
use crate::error::CliError;

use super::common::{open_database, parse_id, parse_instant, require_company};

#[allow(clippy::too_many_arguments)]
pub async fn run_punch(
    kind: PunchKind,
    user: &str,
    company: &str,
    at: Option<&str>,
    note: Option<&str>,
    lat: Option<f64>,
    lon: Option<f64>,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    let company = require_company(&db, company).await?;
    let user_id = parse_id(user)?;

    let recorded_at = match at {
        Some(raw) => parse_instant(raw, company.utc_offset())?,
        None => Utc::now(),
    };

    let mut event = TimeEvent::manual(user_id, company.id, kind.event_kind(), recorded_at);
    if let Some(note) = note {
        event = event.with_note(note);
    }
    if let (Some(latitude), Some(longitude)) = (lat, lon) {
        event = event.with_location(Geolocation {
            latitude,
            longitude,
        });
    }

    let repo = LibSqlEventRepository::new(db.connection());
    repo.append(&event).await?;

    println!("{}", event.id);
    Ok(())
}
