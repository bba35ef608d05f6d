//! Edit request store

use chrono::{DateTime, Utc};
use libsql::{params, Connection};

use crate::error::Result;
use crate::models::{
    CompanyId, EditRequest, EventId, EventKind, RequestId, RequestStatus, TimeEvent, UserId,
};

use super::event_repository::LibSqlEventRepository;
use super::row;

const REQUEST_COLUMNS: &str = "id, user_id, company_id, target_event_id, proposed_kind, \
     proposed_at, reason, status, reviewer_id, review_comments, created_at, decided_at";

/// Trait for edit request storage (async)
#[allow(async_fn_in_trait)]
pub trait RequestRepository {
    /// Insert a new pending request
    async fn insert(&self, request: &EditRequest) -> Result<()>;

    /// Get a request by id
    async fn get(&self, id: &RequestId) -> Result<Option<EditRequest>>;

    /// The pending request targeting `target`, if any
    async fn pending_for_target(&self, target: &EventId) -> Result<Option<EditRequest>>;

    /// The pending add-missing-entry request for the same
    /// user+instant+kind triple, if any
    async fn pending_duplicate(
        &self,
        user_id: &UserId,
        proposed_kind: EventKind,
        proposed_at: DateTime<Utc>,
    ) -> Result<Option<EditRequest>>;

    /// Requests of a company, newest first, optionally filtered by status
    async fn list_for_company(
        &self,
        company_id: &CompanyId,
        status: Option<RequestStatus>,
        limit: usize,
    ) -> Result<Vec<EditRequest>>;

    /// Atomically transition a Pending request to the terminal state
    /// carried by `decided`, inserting `approved_event` in the same
    /// transaction when present.
    ///
    /// Returns `false` without touching anything if the stored row is no
    /// longer Pending, so a lost race never re-decides or double-inserts.
    async fn finalize(
        &self,
        decided: &EditRequest,
        approved_event: Option<&TimeEvent>,
    ) -> Result<bool>;
}

/// libSQL implementation of `RequestRepository`
pub struct LibSqlRequestRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlRequestRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn parse_request(row: &libsql::Row) -> Result<EditRequest> {
        let target_event_id = match row::get_opt_text(row, 3, "target_event_id")? {
            Some(raw) => Some(row::parse(&raw, "target_event_id")?),
            None => None,
        };
        let reviewer_id = match row::get_opt_text(row, 8, "reviewer_id")? {
            Some(raw) => Some(row::parse(&raw, "reviewer_id")?),
            None => None,
        };

        Ok(EditRequest {
            id: row::parse(&row.get::<String>(0)?, "id")?,
            user_id: row::parse(&row.get::<String>(1)?, "user_id")?,
            company_id: row::parse(&row.get::<String>(2)?, "company_id")?,
            target_event_id,
            proposed_kind: row::parse(&row.get::<String>(4)?, "proposed_kind")?,
            proposed_at: row::instant(row.get::<i64>(5)?, "proposed_at")?,
            reason: row.get::<String>(6)?,
            status: row::parse(&row.get::<String>(7)?, "status")?,
            reviewer_id,
            review_comments: row::get_opt_text(row, 9, "review_comments")?,
            created_at: row::instant(row.get::<i64>(10)?, "created_at")?,
            decided_at: row::get_opt_instant(row, 11, "decided_at")?,
        })
    }

    async fn query_one(
        &self,
        sql: &str,
        query_params: impl libsql::params::IntoParams,
    ) -> Result<Option<EditRequest>> {
        let mut rows = self.conn.query(sql, query_params).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::parse_request(&row)?)),
            None => Ok(None),
        }
    }
}

impl RequestRepository for LibSqlRequestRepository<'_> {
    async fn insert(&self, request: &EditRequest) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO edit_requests
                 (id, user_id, company_id, target_event_id, proposed_kind, proposed_at,
                  reason, status, reviewer_id, review_comments, created_at, decided_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    request.id.as_str(),
                    request.user_id.as_str(),
                    request.company_id.as_str(),
                    row::opt_text(request.target_event_id.map(|id| id.as_str()).as_deref()),
                    request.proposed_kind.as_str(),
                    row::ms(request.proposed_at),
                    request.reason.as_str(),
                    request.status.as_str(),
                    row::opt_text(request.reviewer_id.map(|id| id.as_str()).as_deref()),
                    row::opt_text(request.review_comments.as_deref()),
                    row::ms(request.created_at),
                    row::opt_ms(request.decided_at),
                ],
            )
            .await?;
        Ok(())
    }

    async fn get(&self, id: &RequestId) -> Result<Option<EditRequest>> {
        self.query_one(
            &format!("SELECT {REQUEST_COLUMNS} FROM edit_requests WHERE id = ?"),
            params![id.as_str()],
        )
        .await
    }

    async fn pending_for_target(&self, target: &EventId) -> Result<Option<EditRequest>> {
        self.query_one(
            &format!(
                "SELECT {REQUEST_COLUMNS} FROM edit_requests
                 WHERE target_event_id = ? AND status = 'pending'"
            ),
            params![target.as_str()],
        )
        .await
    }

    async fn pending_duplicate(
        &self,
        user_id: &UserId,
        proposed_kind: EventKind,
        proposed_at: DateTime<Utc>,
    ) -> Result<Option<EditRequest>> {
        self.query_one(
            &format!(
                "SELECT {REQUEST_COLUMNS} FROM edit_requests
                 WHERE user_id = ? AND proposed_kind = ? AND proposed_at = ?
                   AND status = 'pending' AND target_event_id IS NULL"
            ),
            params![
                user_id.as_str(),
                proposed_kind.as_str(),
                row::ms(proposed_at)
            ],
        )
        .await
    }

    async fn list_for_company(
        &self,
        company_id: &CompanyId,
        status: Option<RequestStatus>,
        limit: usize,
    ) -> Result<Vec<EditRequest>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows = match status {
            Some(status) => {
                self.conn
                    .query(
                        &format!(
                            "SELECT {REQUEST_COLUMNS} FROM edit_requests
                             WHERE company_id = ? AND status = ?
                             ORDER BY created_at DESC, id DESC LIMIT ?"
                        ),
                        params![company_id.as_str(), status.as_str(), limit],
                    )
                    .await?
            }
            None => {
                self.conn
                    .query(
                        &format!(
                            "SELECT {REQUEST_COLUMNS} FROM edit_requests
                             WHERE company_id = ?
                             ORDER BY created_at DESC, id DESC LIMIT ?"
                        ),
                        params![company_id.as_str(), limit],
                    )
                    .await?
            }
        };

        let mut requests = Vec::new();
        while let Some(row) = rows.next().await? {
            requests.push(Self::parse_request(&row)?);
        }
        Ok(requests)
    }

    async fn finalize(
        &self,
        decided: &EditRequest,
        approved_event: Option<&TimeEvent>,
    ) -> Result<bool> {
        self.conn.execute("BEGIN IMMEDIATE", ()).await?;

        let affected = match self
            .conn
            .execute(
                "UPDATE edit_requests
                 SET status = ?, reviewer_id = ?, review_comments = ?, decided_at = ?
                 WHERE id = ? AND status = 'pending'",
                params![
                    decided.status.as_str(),
                    row::opt_text(decided.reviewer_id.map(|id| id.as_str()).as_deref()),
                    row::opt_text(decided.review_comments.as_deref()),
                    row::opt_ms(decided.decided_at),
                    decided.id.as_str(),
                ],
            )
            .await
        {
            Ok(affected) => affected,
            Err(error) => {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                return Err(error.into());
            }
        };

        if affected == 0 {
            let _ = self.conn.execute("ROLLBACK", ()).await;
            return Ok(false);
        }

        if let Some(event) = approved_event {
            let events = LibSqlEventRepository::new(self.conn);
            if let Err(error) = events.insert_row(event).await {
                let _ = self.conn.execute("ROLLBACK", ()).await;
                return Err(error);
            }
        }

        self.conn.execute("COMMIT", ()).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::{Database, EventRepository};
    use crate::models::CreatedVia;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn request(user: UserId, company: CompanyId, target: Option<EventId>) -> EditRequest {
        EditRequest::new(
            user,
            company,
            target,
            EventKind::ClockOut,
            at(18, 0),
            "left early, forgot to punch",
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_and_get_roundtrip() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlRequestRepository::new(db.connection());

        let submitted = request(UserId::new(), CompanyId::new(), Some(EventId::new()));
        repo.insert(&submitted).await.unwrap();

        let fetched = repo.get(&submitted.id).await.unwrap().unwrap();
        assert_eq!(fetched, submitted);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pending_lookups() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlRequestRepository::new(db.connection());
        let user = UserId::new();
        let company = CompanyId::new();
        let target = EventId::new();

        let targeted = request(user, company, Some(target));
        let missing_entry = request(user, company, None);
        repo.insert(&targeted).await.unwrap();
        repo.insert(&missing_entry).await.unwrap();

        assert_eq!(
            repo.pending_for_target(&target).await.unwrap().unwrap().id,
            targeted.id
        );
        assert_eq!(
            repo.pending_duplicate(&user, EventKind::ClockOut, at(18, 0))
                .await
                .unwrap()
                .unwrap()
                .id,
            missing_entry.id
        );
        assert!(repo
            .pending_duplicate(&user, EventKind::ClockIn, at(18, 0))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_finalize_approves_once() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlRequestRepository::new(db.connection());
        let user = UserId::new();
        let company = CompanyId::new();

        let submitted = request(user, company, None);
        repo.insert(&submitted).await.unwrap();

        let reviewer = UserId::new();
        let decided = submitted.decided(reviewer, true, Some("ok".into()), at(19, 0));
        let event = TimeEvent {
            created_via: CreatedVia::EditApproved,
            ..TimeEvent::manual(user, company, EventKind::ClockOut, at(18, 0))
        };

        assert!(repo.finalize(&decided, Some(&event)).await.unwrap());
        // Second finalize loses: the row is no longer pending
        assert!(!repo.finalize(&decided, Some(&event)).await.unwrap());

        let stored = repo.get(&submitted.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Approved);
        assert_eq!(stored.reviewer_id, Some(reviewer));

        let events = LibSqlEventRepository::new(db.connection());
        let stored_events = events
            .events_in_range(&user, &company, at(0, 0), at(23, 59))
            .await
            .unwrap();
        assert_eq!(stored_events.len(), 1, "approval inserted exactly one event");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_filters_by_status() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = LibSqlRequestRepository::new(db.connection());
        let company = CompanyId::new();

        let open = request(UserId::new(), company, None);
        repo.insert(&open).await.unwrap();

        let closed = request(UserId::new(), company, Some(EventId::new()));
        repo.insert(&closed).await.unwrap();
        let decided = closed.decided(UserId::new(), false, None, at(19, 0));
        assert!(repo.finalize(&decided, None).await.unwrap());

        let pending = repo
            .list_for_company(&company, Some(RequestStatus::Pending), 10)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, open.id);

        let all = repo.list_for_company(&company, None, 10).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}
