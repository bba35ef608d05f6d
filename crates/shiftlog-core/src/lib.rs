//! shiftlog-core - Core library for shiftlog
//!
//! This crate contains the shared models, event store layer, and the
//! attendance reconciliation logic: the pure session reconciler, the
//! idempotent end-of-day closer, and the approval-gated edit request
//! processor.

pub mod closer;
pub mod db;
pub mod error;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod requests;
pub mod retry;

pub use closer::{CloseRunSummary, EndOfDayCloser};
pub use error::{Error, Result};
pub use models::{Company, CompanyId, EditRequest, EventId, EventKind, RequestId, TimeEvent, UserId};
pub use reconcile::{reconstruct, SessionDay, SessionStatus};
pub use requests::EditRequestProcessor;
