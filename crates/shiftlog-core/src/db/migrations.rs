//! Database migrations

use libsql::Connection;

use crate::error::Result;

/// Current schema version
const CURRENT_VERSION: i32 = 1;

/// Run all pending migrations
pub async fn run(conn: &Connection) -> Result<()> {
    let version = get_version(conn).await?;

    if version < 1 {
        migrate_v1(conn).await?;
    }

    Ok(())
}

/// Get the current schema version
async fn get_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            (),
        )
        .await?;

    let exists: bool = if let Some(row) = rows.next().await? {
        row.get::<i32>(0)? != 0
    } else {
        false
    };

    if !exists {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: Initial schema
async fn migrate_v1(conn: &Connection) -> Result<()> {
    // libsql doesn't have execute_batch, so we run each statement separately
    // Using a transaction for atomicity

    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statements = [
        // Schema version tracking
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        // Tenants; day boundaries and the auto-close cutoff are interpreted
        // on the company-local clock
        "CREATE TABLE IF NOT EXISTS companies (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            utc_offset_minutes INTEGER NOT NULL DEFAULT 0,
            auto_close_hour INTEGER NOT NULL DEFAULT 23,
            auto_close_minute INTEGER NOT NULL DEFAULT 59,
            created_at INTEGER NOT NULL
        )",
        // Role directory
        "CREATE TABLE IF NOT EXISTS memberships (
            user_id TEXT NOT NULL,
            company_id TEXT NOT NULL,
            display_name TEXT NOT NULL DEFAULT '',
            role TEXT NOT NULL,
            PRIMARY KEY (user_id, company_id)
        )",
        // Append-only punch log; timestamps are Unix ms
        "CREATE TABLE IF NOT EXISTS time_events (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            company_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            recorded_at INTEGER NOT NULL,
            latitude REAL,
            longitude REAL,
            note TEXT,
            created_via TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_time_events_user_range
            ON time_events(company_id, user_id, recorded_at)",
        "CREATE INDEX IF NOT EXISTS idx_time_events_company_range
            ON time_events(company_id, recorded_at)",
        // Concurrent closer runs compute identical synthetic events; the
        // losing insert fails here instead of double-closing
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_time_events_auto_close_once
            ON time_events(user_id, company_id, kind, recorded_at)
            WHERE created_via = 'system_auto_close'",
        // Edit requests; terminal rows are never updated again
        "CREATE TABLE IF NOT EXISTS edit_requests (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            company_id TEXT NOT NULL,
            target_event_id TEXT,
            proposed_kind TEXT NOT NULL,
            proposed_at INTEGER NOT NULL,
            reason TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            reviewer_id TEXT,
            review_comments TEXT,
            created_at INTEGER NOT NULL,
            decided_at INTEGER
        )",
        "CREATE INDEX IF NOT EXISTS idx_edit_requests_company_status
            ON edit_requests(company_id, status, created_at)",
        // At most one in-flight correction per target event, and one per
        // user+instant+kind triple for add-missing-entry requests
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_edit_requests_pending_target
            ON edit_requests(target_event_id)
            WHERE status = 'pending' AND target_event_id IS NOT NULL",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_edit_requests_pending_proposal
            ON edit_requests(user_id, proposed_kind, proposed_at)
            WHERE status = 'pending' AND target_event_id IS NULL",
    ];

    for statement in statements {
        if let Err(error) = conn.execute(statement, ()).await {
            let _ = conn.execute("ROLLBACK", ()).await;
            return Err(error.into());
        }
    }

    if let Err(error) = conn
        .execute(
            "INSERT OR REPLACE INTO schema_version (version) VALUES (?)",
            libsql::params![CURRENT_VERSION],
        )
        .await
    {
        let _ = conn.execute("ROLLBACK", ()).await;
        return Err(error.into());
    }

    conn.execute("COMMIT", ()).await?;
    Ok(())
}
