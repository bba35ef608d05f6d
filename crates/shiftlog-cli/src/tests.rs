use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{FixedOffset, TimeZone, Utc};
use pretty_assertions::assert_eq;
use shiftlog_core::db::{
    Database, Directory, EventRepository, LibSqlDirectory, LibSqlEventRepository,
    LibSqlRequestRepository, RequestRepository,
};
use shiftlog_core::models::{Company, CreatedVia, EventKind, RequestStatus, Role, UserId};

use crate::cli::{PunchKind, RoleArg, StatusArg};
use crate::commands::close_day::run_close_day;
use crate::commands::common::{
    format_hm, parse_date, parse_instant, parse_wall_clock, resolve_db_path,
};
use crate::commands::member::run_member_add;
use crate::commands::punch::run_punch;
use crate::commands::request::{run_request_decide, run_request_submit};
use crate::error::CliError;

fn unique_test_db_path() -> PathBuf {
    static NEXT_TEST_DB_ID: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let sequence = NEXT_TEST_DB_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("shiftlog-cli-test-{timestamp}-{sequence}.db"))
}

fn cleanup_db_files(path: &PathBuf) {
    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
}

async fn seed_company(db_path: &PathBuf, utc_offset_minutes: i32) -> Company {
    let db = Database::open(db_path).await.unwrap();
    let directory = LibSqlDirectory::new(db.connection());
    let company = Company::new("Test Co", utc_offset_minutes);
    directory.insert_company(&company).await.unwrap();
    company
}

#[test]
fn parse_wall_clock_accepts_hh_mm() {
    assert_eq!(parse_wall_clock("23:59").unwrap(), (23, 59));
    assert_eq!(parse_wall_clock(" 08:05 ").unwrap(), (8, 5));
}

#[test]
fn parse_wall_clock_rejects_malformed_input() {
    assert!(matches!(parse_wall_clock("2359"), Err(CliError::InvalidTime(_))));
    assert!(matches!(parse_wall_clock("24:00"), Err(CliError::InvalidTime(_))));
    assert!(matches!(parse_wall_clock("12:60"), Err(CliError::InvalidTime(_))));
    assert!(matches!(parse_wall_clock("aa:bb"), Err(CliError::InvalidTime(_))));
}

#[test]
fn parse_date_round_trips() {
    assert_eq!(parse_date("2025-03-10").unwrap().to_string(), "2025-03-10");
    assert!(matches!(parse_date("10/03/2025"), Err(CliError::InvalidDate(_))));
}

#[test]
fn parse_instant_accepts_rfc3339() {
    let offset = FixedOffset::east_opt(0).unwrap();
    let instant = parse_instant("2025-03-10T08:00:00+02:00", offset).unwrap();
    assert_eq!(instant, Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap());
}

#[test]
fn parse_instant_reads_local_form_on_company_clock() {
    let offset = FixedOffset::east_opt(2 * 3600).unwrap();
    let instant = parse_instant("2025-03-10 08:00", offset).unwrap();
    // 08:00 at UTC+2 is 06:00 UTC
    assert_eq!(instant, Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap());
}

#[test]
fn parse_instant_rejects_garbage() {
    let offset = FixedOffset::east_opt(0).unwrap();
    assert!(matches!(
        parse_instant("yesterday-ish", offset),
        Err(CliError::InvalidInstant(_))
    ));
}

#[test]
fn format_hm_renders_hours_and_minutes() {
    assert_eq!(format_hm(0), "0h00m");
    assert_eq!(format_hm(59), "0h00m");
    assert_eq!(format_hm(3 * 3600 + 12 * 60), "3h12m");
    assert_eq!(format_hm(-5), "0h00m");
}

#[test]
fn resolve_db_path_prefers_explicit_flag() {
    let explicit = PathBuf::from("/tmp/custom.db");
    assert_eq!(resolve_db_path(Some(explicit.clone())), explicit);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_punch_records_manual_event() {
    let db_path = unique_test_db_path();
    let company = seed_company(&db_path, 120).await;
    let user = UserId::new();

    run_punch(
        PunchKind::In,
        &user.to_string(),
        &company.id.to_string(),
        Some("2025-03-10 08:00"),
        Some("front door"),
        None,
        None,
        &db_path,
    )
    .await
    .unwrap();

    let db = Database::open(&db_path).await.unwrap();
    let repo = LibSqlEventRepository::new(db.connection());
    let events = repo
        .events_in_range(
            &user,
            &company.id,
            Utc.with_ymd_and_hms(2025, 3, 9, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::ClockIn);
    assert_eq!(events[0].created_via, CreatedVia::Manual);
    assert_eq!(events[0].note.as_deref(), Some("front door"));
    // Company clock is UTC+2, so the stored instant is 06:00 UTC
    assert_eq!(
        events[0].recorded_at,
        Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap()
    );

    cleanup_db_files(&db_path);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_punch_rejects_unknown_company() {
    let db_path = unique_test_db_path();
    let _ = seed_company(&db_path, 0).await;

    let error = run_punch(
        PunchKind::In,
        &UserId::new().to_string(),
        "not-a-company",
        None,
        None,
        None,
        None,
        &db_path,
    )
    .await
    .unwrap_err();
    assert!(matches!(error, CliError::InvalidId(_)));

    cleanup_db_files(&db_path);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_close_day_is_idempotent_from_the_cli() {
    let db_path = unique_test_db_path();
    let company = seed_company(&db_path, 0).await;
    let user = UserId::new();

    run_punch(
        PunchKind::In,
        &user.to_string(),
        &company.id.to_string(),
        Some("2025-03-10 09:00"),
        None,
        None,
        None,
        &db_path,
    )
    .await
    .unwrap();

    run_close_day(
        Some("2025-03-10"),
        Some(&company.id.to_string()),
        None,
        &db_path,
    )
    .await
    .unwrap();
    run_close_day(
        Some("2025-03-10"),
        Some(&company.id.to_string()),
        None,
        &db_path,
    )
    .await
    .unwrap();

    let db = Database::open(&db_path).await.unwrap();
    let repo = LibSqlEventRepository::new(db.connection());
    let events = repo
        .events_in_range(
            &user,
            &company.id,
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(events.len(), 2, "second close-day run must add nothing");
    assert_eq!(events[1].kind, EventKind::ClockOut);
    assert_eq!(events[1].created_via, CreatedVia::SystemAutoClose);

    cleanup_db_files(&db_path);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_request_flow_submits_and_approves() {
    let db_path = unique_test_db_path();
    let company = seed_company(&db_path, 0).await;
    let employee = UserId::new();

    run_member_add(
        None,
        &company.id.to_string(),
        RoleArg::Manager,
        "Alex",
        &db_path,
    )
    .await
    .unwrap();

    // run_member_add prints the generated id; recover it from the directory
    let db = Database::open(&db_path).await.unwrap();
    let directory = LibSqlDirectory::new(db.connection());
    let managers = directory.managers_of(&company.id).await.unwrap();
    assert_eq!(managers.len(), 1);
    let manager = managers[0];
    drop(db);

    run_request_submit(
        &employee.to_string(),
        &company.id.to_string(),
        None,
        PunchKind::In,
        "2025-03-10 08:00",
        "forgot to punch in",
        &db_path,
    )
    .await
    .unwrap();

    let db = Database::open(&db_path).await.unwrap();
    let requests = LibSqlRequestRepository::new(db.connection());
    let pending = requests
        .list_for_company(&company.id, Some(RequestStatus::Pending), 10)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
    let request_id = pending[0].id;
    drop(db);

    run_request_decide(
        &request_id.to_string(),
        &manager.to_string(),
        true,
        false,
        Some("confirmed".into()),
        &db_path,
    )
    .await
    .unwrap();

    let db = Database::open(&db_path).await.unwrap();
    let requests = LibSqlRequestRepository::new(db.connection());
    let stored = requests.get(&request_id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Approved);

    let repo = LibSqlEventRepository::new(db.connection());
    let events = repo
        .events_in_range(
            &employee,
            &company.id,
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].created_via, CreatedVia::EditApproved);

    cleanup_db_files(&db_path);
}

#[tokio::test(flavor = "multi_thread")]
async fn run_request_decide_requires_exactly_one_flag() {
    let db_path = unique_test_db_path();

    let neither = run_request_decide(
        &shiftlog_core::RequestId::new().to_string(),
        &UserId::new().to_string(),
        false,
        false,
        None,
        &db_path,
    )
    .await
    .unwrap_err();
    assert!(matches!(neither, CliError::MissingDecision));

    cleanup_db_files(&db_path);
}

#[tokio::test(flavor = "multi_thread")]
async fn member_add_accepts_existing_user_and_updates_role() {
    let db_path = unique_test_db_path();
    let company = seed_company(&db_path, 0).await;
    let user = UserId::new();

    run_member_add(
        Some(&user.to_string()),
        &company.id.to_string(),
        RoleArg::Employee,
        "Sam",
        &db_path,
    )
    .await
    .unwrap();
    run_member_add(
        Some(&user.to_string()),
        &company.id.to_string(),
        RoleArg::Admin,
        "Sam",
        &db_path,
    )
    .await
    .unwrap();

    let db = Database::open(&db_path).await.unwrap();
    let directory = LibSqlDirectory::new(db.connection());
    let role = directory.role_of(&user, &company.id).await.unwrap();
    assert_eq!(role, Some(Role::Admin));

    cleanup_db_files(&db_path);
}

#[test]
fn status_arg_maps_to_request_status() {
    assert_eq!(StatusArg::Pending.status(), RequestStatus::Pending);
    assert_eq!(StatusArg::Approved.status(), RequestStatus::Approved);
    assert_eq!(StatusArg::Rejected.status(), RequestStatus::Rejected);
}

#[test]
fn punch_kind_maps_to_event_kind() {
    assert_eq!(PunchKind::In.event_kind(), EventKind::ClockIn);
    assert_eq!(PunchKind::Out.event_kind(), EventKind::ClockOut);
    assert_eq!(PunchKind::BreakStart.event_kind(), EventKind::BreakStart);
    assert_eq!(PunchKind::BreakEnd.event_kind(), EventKind::BreakEnd);
}
