//! Edit request processing
//!
//! The only sanctioned path for retroactively altering the event log.
//! A correction is proposed by an employee, gated by a reviewer with an
//! approving role, and applied as a new `edit_approved` event; the
//! original event is never overwritten, so the full history stays
//! auditable. Derived session state is recomputed on the next read,
//! nothing is cached here.

use chrono::{DateTime, Utc};

use crate::db::{Directory, EventRepository, RequestRepository};
use crate::error::{Error, Result};
use crate::models::{
    CompanyId, CreatedVia, EditRequest, EventId, EventKind, RequestId, Role, TimeEvent, UserId,
};
use crate::notify::{NotificationCategory, NotificationSink};

/// Approval-gated processor for event log corrections
pub struct EditRequestProcessor<'a, R, E, D, N> {
    requests: &'a R,
    events: &'a E,
    directory: &'a D,
    sink: &'a N,
}

impl<'a, R, E, D, N> EditRequestProcessor<'a, R, E, D, N>
where
    R: RequestRepository,
    E: EventRepository,
    D: Directory,
    N: NotificationSink,
{
    pub const fn new(requests: &'a R, events: &'a E, directory: &'a D, sink: &'a N) -> Self {
        Self {
            requests,
            events,
            directory,
            sink,
        }
    }

    /// Submit a correction: either against an existing event, or with no
    /// target to add a missing entry.
    ///
    /// At most one request may be pending per target (or, for missing
    /// entries, per user+instant+kind triple); a duplicate submission is
    /// rejected outright and nothing is written.
    pub async fn submit(
        &self,
        user_id: UserId,
        company_id: CompanyId,
        target_event_id: Option<EventId>,
        proposed_kind: EventKind,
        proposed_at: DateTime<Utc>,
        reason: &str,
    ) -> Result<EditRequest> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(Error::Validation("a reason is required".into()));
        }

        if let Some(target) = target_event_id {
            let event = self
                .events
                .get(&target)
                .await?
                .ok_or_else(|| Error::NotFound(format!("target event {target}")))?;
            if event.user_id != user_id || event.company_id != company_id {
                return Err(Error::Validation(
                    "target event belongs to a different user".into(),
                ));
            }
            if self.requests.pending_for_target(&target).await?.is_some() {
                return Err(Error::Validation(
                    "another correction is already pending for this event".into(),
                ));
            }
        } else if self
            .requests
            .pending_duplicate(&user_id, proposed_kind, proposed_at)
            .await?
            .is_some()
        {
            return Err(Error::Validation(
                "an identical correction is already pending".into(),
            ));
        }

        let request = EditRequest::new(
            user_id,
            company_id,
            target_event_id,
            proposed_kind,
            proposed_at,
            reason,
        );
        match self.requests.insert(&request).await {
            Ok(()) => {}
            // The schema's partial unique indexes catch a concurrent
            // duplicate our pre-check missed
            Err(error) if error.is_unique_violation() => {
                return Err(Error::Validation(
                    "another correction is already pending for this event".into(),
                ));
            }
            Err(error) => return Err(error),
        }

        tracing::info!(request = %request.id, user = %user_id, "edit request submitted");
        self.notify_reviewers(&request).await;
        Ok(request)
    }

    /// Decide a pending request.
    ///
    /// Approval inserts a new event carrying the proposed values and
    /// marks the request in one atomic unit: if the insert fails, the
    /// request stays Pending and the whole decision can be retried.
    /// Rejection touches only the request row.
    pub async fn decide(
        &self,
        request_id: &RequestId,
        reviewer_id: UserId,
        approve: bool,
        comments: Option<String>,
    ) -> Result<EditRequest> {
        let request = self
            .requests
            .get(request_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("edit request {request_id}")))?;

        if !request.status.is_pending() {
            return Err(Error::Validation(format!(
                "request is already {}",
                request.status
            )));
        }

        let reviewer_role = self
            .directory
            .role_of(&reviewer_id, &request.company_id)
            .await?;
        if !reviewer_role.is_some_and(Role::can_approve) {
            return Err(Error::Validation(
                "reviewer is not allowed to decide edit requests".into(),
            ));
        }

        let decided = request.decided(reviewer_id, approve, comments, Utc::now());
        let approved_event = approve.then(|| correction_event(&request));

        if !self
            .requests
            .finalize(&decided, approved_event.as_ref())
            .await?
        {
            // A concurrent reviewer got there first
            return Err(Error::Validation("request is already decided".into()));
        }

        tracing::info!(
            request = %decided.id,
            reviewer = %reviewer_id,
            status = %decided.status,
            "edit request decided"
        );
        self.notify_requester(&decided).await;
        Ok(decided)
    }

    async fn notify_reviewers(&self, request: &EditRequest) {
        let reviewers = match self.directory.managers_of(&request.company_id).await {
            Ok(reviewers) => reviewers,
            Err(error) => {
                tracing::warn!(request = %request.id, %error, "could not resolve reviewers");
                return;
            }
        };

        let summary = format!(
            "a correction ({} at {}) awaits review",
            request.proposed_kind, request.proposed_at
        );
        for reviewer in reviewers {
            if let Err(error) = self
                .sink
                .notify(&reviewer, NotificationCategory::EditRequest, &summary)
                .await
            {
                tracing::warn!(recipient = %reviewer, %error, "edit request notification failed");
            }
        }
    }

    async fn notify_requester(&self, decided: &EditRequest) {
        let summary = format!("your correction was {}", decided.status);
        if let Err(error) = self
            .sink
            .notify(
                &decided.user_id,
                NotificationCategory::EditRequest,
                &summary,
            )
            .await
        {
            tracing::warn!(recipient = %decided.user_id, %error, "decision notification failed");
        }
    }
}

/// The event an approval appends; the original event, if any, stays in
/// the log untouched
fn correction_event(request: &EditRequest) -> TimeEvent {
    TimeEvent {
        id: EventId::new(),
        user_id: request.user_id,
        company_id: request.company_id,
        kind: request.proposed_kind,
        recorded_at: request.proposed_at,
        location: None,
        note: Some(request.reason.clone()),
        created_via: CreatedVia::EditApproved,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::{Database, LibSqlDirectory, LibSqlEventRepository, LibSqlRequestRepository};
    use crate::models::{Company, RequestStatus, Role};
    use crate::notify::RecordingSink;
    use crate::reconcile::reconstruct;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    struct Fixture {
        db: Database,
        company: Company,
        employee: UserId,
        manager: UserId,
        sink: RecordingSink,
    }

    async fn fixture() -> Fixture {
        let db = Database::open_in_memory().await.unwrap();
        let directory = LibSqlDirectory::new(db.connection());

        let company = Company::new("Acme", 0);
        directory.insert_company(&company).await.unwrap();

        let employee = UserId::new();
        let manager = UserId::new();
        directory
            .upsert_membership(&employee, &company.id, Role::Employee, "Sam")
            .await
            .unwrap();
        directory
            .upsert_membership(&manager, &company.id, Role::Manager, "Alex")
            .await
            .unwrap();

        Fixture {
            db,
            company,
            employee,
            manager,
            sink: RecordingSink::new(),
        }
    }

    // Not every test touches the repositories directly
    macro_rules! processor {
        ($fixture:expr, $requests:ident, $events:ident, $processor:ident) => {
            #[allow(unused_variables)]
            let $requests = LibSqlRequestRepository::new($fixture.db.connection());
            #[allow(unused_variables)]
            let $events = LibSqlEventRepository::new($fixture.db.connection());
            let directory = LibSqlDirectory::new($fixture.db.connection());
            let $processor =
                EditRequestProcessor::new(&$requests, &$events, &directory, &$fixture.sink);
        };
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_submit_rejects_second_pending_for_same_target() {
        let fixture = fixture().await;
        processor!(fixture, requests, events, processor);

        let original = TimeEvent::manual(
            fixture.employee,
            fixture.company.id,
            EventKind::ClockOut,
            at(17, 0),
        );
        events.append(&original).await.unwrap();

        processor
            .submit(
                fixture.employee,
                fixture.company.id,
                Some(original.id),
                EventKind::ClockOut,
                at(18, 0),
                "stayed for the release",
            )
            .await
            .unwrap();

        let duplicate = processor
            .submit(
                fixture.employee,
                fixture.company.id,
                Some(original.id),
                EventKind::ClockOut,
                at(18, 30),
                "actually even later",
            )
            .await;
        assert!(matches!(duplicate, Err(Error::Validation(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_submit_rejects_duplicate_missing_entry() {
        let fixture = fixture().await;
        processor!(fixture, requests, events, processor);

        processor
            .submit(
                fixture.employee,
                fixture.company.id,
                None,
                EventKind::ClockIn,
                at(8, 0),
                "forgot to punch in",
            )
            .await
            .unwrap();

        let duplicate = processor
            .submit(
                fixture.employee,
                fixture.company.id,
                None,
                EventKind::ClockIn,
                at(8, 0),
                "submitting again",
            )
            .await;
        assert!(matches!(duplicate, Err(Error::Validation(_))));

        // A different instant is a different correction
        processor
            .submit(
                fixture.employee,
                fixture.company.id,
                None,
                EventKind::ClockIn,
                at(8, 15),
                "second guess",
            )
            .await
            .unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_submit_validates_target() {
        let fixture = fixture().await;
        processor!(fixture, requests, events, processor);

        let missing = processor
            .submit(
                fixture.employee,
                fixture.company.id,
                Some(EventId::new()),
                EventKind::ClockOut,
                at(18, 0),
                "fix it",
            )
            .await;
        assert!(matches!(missing, Err(Error::NotFound(_))));

        let someone_else = TimeEvent::manual(
            UserId::new(),
            fixture.company.id,
            EventKind::ClockOut,
            at(17, 0),
        );
        events.append(&someone_else).await.unwrap();

        let foreign = processor
            .submit(
                fixture.employee,
                fixture.company.id,
                Some(someone_else.id),
                EventKind::ClockOut,
                at(18, 0),
                "not mine",
            )
            .await;
        assert!(matches!(foreign, Err(Error::Validation(_))));

        let blank_reason = processor
            .submit(
                fixture.employee,
                fixture.company.id,
                None,
                EventKind::ClockIn,
                at(8, 0),
                "   ",
            )
            .await;
        assert!(matches!(blank_reason, Err(Error::Validation(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_approval_appends_and_keeps_original() {
        let fixture = fixture().await;
        processor!(fixture, requests, events, processor);

        let original = TimeEvent::manual(
            fixture.employee,
            fixture.company.id,
            EventKind::ClockOut,
            at(17, 0),
        );
        events.append(&original).await.unwrap();

        let request = processor
            .submit(
                fixture.employee,
                fixture.company.id,
                Some(original.id),
                EventKind::ClockOut,
                at(18, 0),
                "stayed for the release",
            )
            .await
            .unwrap();

        let decided = processor
            .decide(&request.id, fixture.manager, true, Some("confirmed".into()))
            .await
            .unwrap();
        assert_eq!(decided.status, RequestStatus::Approved);
        assert_eq!(decided.reviewer_id, Some(fixture.manager));
        assert!(decided.decided_at.is_some());

        let stored = events
            .events_in_range(&fixture.employee, &fixture.company.id, at(0, 0), at(23, 59))
            .await
            .unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0], original, "original event is untouched");
        assert_eq!(stored[1].kind, EventKind::ClockOut);
        assert_eq!(stored[1].recorded_at, at(18, 0));
        assert_eq!(stored[1].created_via, CreatedVia::EditApproved);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejection_touches_no_events() {
        let fixture = fixture().await;
        processor!(fixture, requests, events, processor);

        let original = TimeEvent::manual(
            fixture.employee,
            fixture.company.id,
            EventKind::ClockOut,
            at(17, 0),
        );
        events.append(&original).await.unwrap();

        let request = processor
            .submit(
                fixture.employee,
                fixture.company.id,
                Some(original.id),
                EventKind::ClockOut,
                at(18, 0),
                "stayed for the release",
            )
            .await
            .unwrap();

        let before = events
            .events_in_range(&fixture.employee, &fixture.company.id, at(0, 0), at(23, 59))
            .await
            .unwrap();

        let decided = processor
            .decide(
                &request.id,
                fixture.manager,
                false,
                Some("badge log disagrees".into()),
            )
            .await
            .unwrap();
        assert_eq!(decided.status, RequestStatus::Rejected);

        let after = events
            .events_in_range(&fixture.employee, &fixture.company.id, at(0, 0), at(23, 59))
            .await
            .unwrap();
        assert_eq!(before, after, "rejection must not alter the event log");

        let stored = requests.get(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Rejected);
        assert_eq!(stored.review_comments.as_deref(), Some("badge log disagrees"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_terminal_requests_cannot_be_redecided() {
        let fixture = fixture().await;
        processor!(fixture, requests, events, processor);

        let request = processor
            .submit(
                fixture.employee,
                fixture.company.id,
                None,
                EventKind::ClockIn,
                at(8, 0),
                "forgot to punch in",
            )
            .await
            .unwrap();

        processor
            .decide(&request.id, fixture.manager, false, None)
            .await
            .unwrap();

        let again = processor
            .decide(&request.id, fixture.manager, true, None)
            .await;
        assert!(matches!(again, Err(Error::Validation(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_decide_requires_approving_role() {
        let fixture = fixture().await;
        processor!(fixture, requests, events, processor);

        let request = processor
            .submit(
                fixture.employee,
                fixture.company.id,
                None,
                EventKind::ClockIn,
                at(8, 0),
                "forgot to punch in",
            )
            .await
            .unwrap();

        let by_employee = processor
            .decide(&request.id, fixture.employee, true, None)
            .await;
        assert!(matches!(by_employee, Err(Error::Validation(_))));

        let by_stranger = processor.decide(&request.id, UserId::new(), true, None).await;
        assert!(matches!(by_stranger, Err(Error::Validation(_))));

        // Still pending afterwards
        let stored = requests.get(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Pending);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_approved_missing_entry_changes_next_reconstruction() {
        let fixture = fixture().await;
        processor!(fixture, requests, events, processor);

        events
            .append(&TimeEvent::manual(
                fixture.employee,
                fixture.company.id,
                EventKind::ClockOut,
                at(17, 0),
            ))
            .await
            .unwrap();

        // Clock-out without clock-in reads as an anomalous empty day
        let before = events
            .events_in_range(&fixture.employee, &fixture.company.id, at(0, 0), at(23, 59))
            .await
            .unwrap();
        let session_before = reconstruct(&before, at(23, 59));
        assert_eq!(session_before.worked_seconds, 0);
        assert_eq!(session_before.anomalies.len(), 1);

        let request = processor
            .submit(
                fixture.employee,
                fixture.company.id,
                None,
                EventKind::ClockIn,
                at(9, 0),
                "forgot to punch in",
            )
            .await
            .unwrap();
        processor
            .decide(&request.id, fixture.manager, true, None)
            .await
            .unwrap();

        // The next read sees a consistent 8-hour day
        let after = events
            .events_in_range(&fixture.employee, &fixture.company.id, at(0, 0), at(23, 59))
            .await
            .unwrap();
        let session_after = reconstruct(&after, at(23, 59));
        assert_eq!(session_after.worked_seconds, 8 * 3600);
        assert!(session_after.anomalies.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_lifecycle_notifications_are_sent() {
        let fixture = fixture().await;
        processor!(fixture, requests, events, processor);

        let request = processor
            .submit(
                fixture.employee,
                fixture.company.id,
                None,
                EventKind::ClockIn,
                at(8, 0),
                "forgot to punch in",
            )
            .await
            .unwrap();
        processor
            .decide(&request.id, fixture.manager, true, None)
            .await
            .unwrap();

        let sent = fixture.sink.sent();
        assert_eq!(sent.len(), 2);
        // Submission alerts the reviewer, the decision alerts the requester
        assert_eq!(sent[0].recipient, fixture.manager);
        assert_eq!(sent[1].recipient, fixture.employee);
        assert!(sent[1].summary.contains("approved"));
    }
}
