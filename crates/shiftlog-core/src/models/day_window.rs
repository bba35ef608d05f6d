//! Company-local calendar day expressed as UTC instants
//!
//! Events are stored as UTC instants but grouped into days by the
//! company's local clock. A `DayWindow` pins down that mapping once so
//! the reconciler, closer, and CLI all agree on day boundaries.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// One company-local calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    day: NaiveDate,
    offset: FixedOffset,
}

impl DayWindow {
    /// The window for `day` in a company whose clock runs at `offset`
    #[must_use]
    pub const fn for_day(day: NaiveDate, offset: FixedOffset) -> Self {
        Self { day, offset }
    }

    /// The window containing `instant` on the company's local clock
    #[must_use]
    pub fn containing(instant: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            day: instant.with_timezone(&offset).date_naive(),
            offset,
        }
    }

    /// The calendar day this window covers
    #[must_use]
    pub const fn day(&self) -> NaiveDate {
        self.day
    }

    /// First instant of the day (local midnight), as UTC
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.at_local(NaiveTime::MIN)
    }

    /// First instant of the following day, as UTC
    #[must_use]
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        self.start() + Duration::days(1)
    }

    /// Last representable instant of the day at millisecond storage
    /// resolution; use as the inclusive upper bound of range queries
    #[must_use]
    pub fn last_instant(&self) -> DateTime<Utc> {
        self.end_exclusive() - Duration::milliseconds(1)
    }

    /// The instant of a company-local wall-clock time within this day.
    ///
    /// Out-of-range hour/minute values fall back to 23:59.
    #[must_use]
    pub fn cutoff(&self, hour: u32, minute: u32) -> DateTime<Utc> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .unwrap_or_else(|| NaiveTime::from_hms_opt(23, 59, 0).expect("23:59 is valid"));
        self.at_local(time)
    }

    fn at_local(&self, time: NaiveTime) -> DateTime<Utc> {
        self.offset
            .from_local_datetime(&self.day.and_time(time))
            .single()
            .expect("fixed offsets have no DST gaps")
            .with_timezone(&Utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offset(minutes: i32) -> FixedOffset {
        FixedOffset::east_opt(minutes * 60).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_utc_window_matches_calendar_day() {
        let window = DayWindow::for_day(date("2025-03-10"), offset(0));
        assert_eq!(window.start().to_rfc3339(), "2025-03-10T00:00:00+00:00");
        assert_eq!(
            window.end_exclusive().to_rfc3339(),
            "2025-03-11T00:00:00+00:00"
        );
    }

    #[test]
    fn test_positive_offset_shifts_start_earlier_in_utc() {
        // UTC+2: local midnight is 22:00 UTC the previous day
        let window = DayWindow::for_day(date("2025-03-10"), offset(120));
        assert_eq!(window.start().to_rfc3339(), "2025-03-09T22:00:00+00:00");
    }

    #[test]
    fn test_cutoff_2359_local() {
        let window = DayWindow::for_day(date("2025-03-10"), offset(120));
        assert_eq!(window.cutoff(23, 59).to_rfc3339(), "2025-03-10T21:59:00+00:00");
    }

    #[test]
    fn test_cutoff_out_of_range_falls_back() {
        let window = DayWindow::for_day(date("2025-03-10"), offset(0));
        assert_eq!(window.cutoff(99, 99), window.cutoff(23, 59));
    }

    #[test]
    fn test_containing_uses_local_date() {
        // 23:30 UTC on the 9th is already the 10th at UTC+2
        let instant: DateTime<Utc> = "2025-03-09T23:30:00Z".parse().unwrap();
        let window = DayWindow::containing(instant, offset(120));
        assert_eq!(window.day(), date("2025-03-10"));
    }

    #[test]
    fn test_last_instant_precedes_next_day() {
        let window = DayWindow::for_day(date("2025-03-10"), offset(0));
        assert!(window.last_instant() < window.end_exclusive());
        assert_eq!(
            window.last_instant() + Duration::milliseconds(1),
            window.end_exclusive()
        );
    }
}
