//! Data models for shiftlog

mod company;
mod day_window;
mod edit_request;
mod ids;
mod time_event;

pub use company::{Company, Role};
pub use day_window::DayWindow;
pub use edit_request::{EditRequest, RequestStatus};
pub use ids::{CompanyId, EventId, RequestId, UserId};
pub use time_event::{CreatedVia, EventKind, Geolocation, TimeEvent, AUTO_CLOSE_NOTE};
