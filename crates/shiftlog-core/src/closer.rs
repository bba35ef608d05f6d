//! End-of-day closer
//!
//! Guarantees every user-day eventually reaches a terminal Off state even
//! when nobody clocked out, without ever double-closing. The job only
//! adds compensating events, never deletes; a scheduled trigger and a
//! manual "run now" may overlap freely because each user's closure unit
//! re-checks the store immediately before inserting.

use chrono::{DateTime, NaiveDate, Utc};

use crate::db::{Directory, EventRepository};
use crate::error::Result;
use crate::models::{Company, CompanyId, DayWindow, EventKind, TimeEvent, UserId};
use crate::notify::{NotificationCategory, NotificationSink};
use crate::reconcile::{reconstruct, SessionStatus};

/// Outcome of one closer run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloseRunSummary {
    /// User-days terminated by this run
    pub closed: usize,
    /// Users whose day was still open when their closure unit ran
    /// (closed + failed); users another run already closed don't count
    pub candidates: usize,
    /// Per-user failures; these never abort the rest of the batch
    pub errors: Vec<(UserId, String)>,
}

impl CloseRunSummary {
    fn merge(&mut self, other: Self) {
        self.closed += other.closed;
        self.candidates += other.candidates;
        self.errors.extend(other.errors);
    }
}

/// Batch job closing unterminated sessions at a cutoff instant
pub struct EndOfDayCloser<'a, E, D, N> {
    events: &'a E,
    directory: &'a D,
    sink: &'a N,
}

impl<'a, E, D, N> EndOfDayCloser<'a, E, D, N>
where
    E: EventRepository,
    D: Directory,
    N: NotificationSink,
{
    pub const fn new(events: &'a E, directory: &'a D, sink: &'a N) -> Self {
        Self {
            events,
            directory,
            sink,
        }
    }

    /// Close `day` for every company, using each company's configured
    /// local cutoff. A company whose batch cannot start is logged and
    /// skipped; the sweep itself only fails when the company list is
    /// unreachable.
    pub async fn run_all(&self, day: NaiveDate) -> Result<CloseRunSummary> {
        let mut summary = CloseRunSummary::default();

        for company in self.directory.list_companies().await? {
            let window = DayWindow::for_day(day, company.utc_offset());
            let cutoff = window.cutoff(company.auto_close_hour, company.auto_close_minute);

            match self.close_company_day(&company, day, cutoff).await {
                Ok(company_summary) => summary.merge(company_summary),
                Err(error) => {
                    tracing::warn!(company = %company.id, %error, "skipping company, closer batch could not start");
                }
            }
        }

        Ok(summary)
    }

    /// Close one company's `day` at `cutoff`.
    ///
    /// Fails only when the candidate enumeration itself fails; per-user
    /// errors are collected in the summary.
    pub async fn close_company_day(
        &self,
        company: &Company,
        day: NaiveDate,
        cutoff: DateTime<Utc>,
    ) -> Result<CloseRunSummary> {
        let window = DayWindow::for_day(day, company.utc_offset());
        let users = self
            .events
            .users_with_events(&company.id, window.start(), cutoff)
            .await?;

        let mut summary = CloseRunSummary::default();
        for user_id in users {
            match self.close_user_day(&company.id, &user_id, &window, cutoff).await {
                Ok(true) => {
                    summary.candidates += 1;
                    summary.closed += 1;
                }
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(user = %user_id, company = %company.id, %error, "failed to auto-close session");
                    summary.candidates += 1;
                    summary.errors.push((user_id, error.to_string()));
                }
            }
        }

        if summary.closed > 0 {
            tracing::info!(
                company = %company.id,
                closed = summary.closed,
                candidates = summary.candidates,
                "auto-closed unterminated sessions"
            );
            self.notify_managers(company, summary.closed).await;
        }

        Ok(summary)
    }

    /// Close one user's day if it is still open at `cutoff`.
    ///
    /// Returns whether anything was inserted. The fetch happens right
    /// before the insert decision: a real clock-out racing in between
    /// our caller's enumeration and this check, or a concurrent closer
    /// run that already won, both turn this into a no-op.
    async fn close_user_day(
        &self,
        company_id: &CompanyId,
        user_id: &UserId,
        window: &DayWindow,
        cutoff: DateTime<Utc>,
    ) -> Result<bool> {
        let events = self
            .events
            .events_in_range(user_id, company_id, window.start(), cutoff)
            .await?;
        let session = reconstruct(&events, cutoff);

        let mut synthetic = Vec::new();
        if session.status == SessionStatus::OnBreak {
            // The break must close before the session does
            synthetic.push(TimeEvent::auto_close(
                *user_id,
                *company_id,
                EventKind::BreakEnd,
                cutoff,
            ));
        }
        if session.status.is_open() {
            synthetic.push(TimeEvent::auto_close(
                *user_id,
                *company_id,
                EventKind::ClockOut,
                cutoff,
            ));
        }

        if synthetic.is_empty() {
            return Ok(false);
        }

        // Identical synthetic events are unique-constrained in the store;
        // losing that race means another run already closed this user
        match self.events.append_all(&synthetic).await {
            Ok(()) => Ok(true),
            Err(error) if error.is_unique_violation() => Ok(false),
            Err(error) => Err(error),
        }
    }

    /// One aggregated summary per manager; never one per employee
    async fn notify_managers(&self, company: &Company, closed: usize) {
        let managers = match self.directory.managers_of(&company.id).await {
            Ok(managers) => managers,
            Err(error) => {
                tracing::warn!(company = %company.id, %error, "could not resolve managers for closure summary");
                return;
            }
        };

        let summary = format!(
            "{closed} unterminated session(s) were automatically closed for {}",
            company.name
        );
        for manager in managers {
            if let Err(error) = self
                .sink
                .notify(&manager, NotificationCategory::AutoClose, &summary)
                .await
            {
                tracing::warn!(recipient = %manager, %error, "closure summary delivery failed");
            }
        }
    }
}
