//! Date range for filtering and expanding events.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};

use crate::constants::{CONFLICT_WINDOW_DAYS, DEFAULT_VIEW_DAYS};
use crate::error::{FamcalError, FamcalResult};
use crate::event::{Event, EventInstance};
use crate::recurrence::{ExpansionLimits, expand_range};

/// Half-open window `[start, end)` of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        DateRange { start, end }
    }

    /// Whole days from `first` through `last`, both included.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        DateRange {
            start: first.and_time(NaiveTime::MIN),
            end: next_midnight(last),
        }
    }

    /// Parse command-line style bounds (YYYY-MM-DD, `to` inclusive).
    /// - `from` defaults to `today`
    /// - `to` defaults to DEFAULT_VIEW_DAYS after `from`
    pub fn from_args(from: Option<&str>, to: Option<&str>, today: NaiveDate) -> FamcalResult<Self> {
        let first = match from {
            Some(s) => parse_date(s)?,
            None => today,
        };

        let last = match to {
            Some(s) => parse_date(s)?,
            None => first.checked_add_days(Days::new(DEFAULT_VIEW_DAYS)).ok_or_else(|| {
                FamcalError::InvalidDate(format!("{first} is too close to the end of the calendar"))
            })?,
        };

        if last < first {
            return Err(FamcalError::InvalidDate(format!(
                "'to' ({last}) is before 'from' ({first})"
            )));
        }

        Ok(DateRange::days(first, last))
    }

    /// Window of existing events worth checking against a candidate starting at
    /// `start`: from the start of the previous day through the end of the next.
    /// Clamped at the ends of the calendar.
    pub fn conflict_window(start: NaiveDateTime) -> Self {
        let day = start.date();
        DateRange::days(
            day.checked_sub_days(Days::new(CONFLICT_WINDOW_DAYS))
                .unwrap_or(NaiveDate::MIN),
            day.checked_add_days(Days::new(CONFLICT_WINDOW_DAYS))
                .unwrap_or(NaiveDate::MAX),
        )
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at < self.end
    }

    /// Every event instance starting inside this range, series expanded.
    pub fn expand(&self, events: &[Event], limits: ExpansionLimits) -> Vec<EventInstance> {
        expand_range(events, self.start, self.end, limits)
    }

    /// Concrete events starting inside this range, with recurring series
    /// replaced by their occurrences. Occurrences keep the series id.
    pub fn events_in(&self, events: &[Event], limits: ExpansionLimits) -> Vec<Event> {
        self.expand(events, limits)
            .into_iter()
            .map(|instance| instance.event)
            .collect()
    }
}

/// Midnight after `day`, or the last representable instant for the final day.
fn next_midnight(day: NaiveDate) -> NaiveDateTime {
    day.succ_opt()
        .map_or(NaiveDateTime::MAX, |next| next.and_time(NaiveTime::MIN))
}

/// Parse YYYY-MM-DD.
pub fn parse_date(s: &str) -> FamcalResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        FamcalError::InvalidDate(format!("Invalid date format '{}'. Expected YYYY-MM-DD", s))
    })
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a local date-time (`2025-03-20T15:00`, `2025-03-20 15:00`, ...).
/// A bare date means midnight.
pub fn parse_datetime(s: &str) -> FamcalResult<NaiveDateTime> {
    let s = s.trim();

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .or_else(|| parse_date(s).ok().map(|d| d.and_time(NaiveTime::MIN)))
        .ok_or_else(|| {
            FamcalError::InvalidDate(format!(
                "Invalid date/time '{}'. Expected YYYY-MM-DDTHH:MM or YYYY-MM-DD",
                s
            ))
        })
}
