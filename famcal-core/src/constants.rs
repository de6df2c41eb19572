//! Shared defaults for expansion and conflict checks.

use chrono::TimeDelta;

/// Hard cap on the number of occurrences generated for a single series.
pub const DEFAULT_MAX_OCCURRENCES: u32 = 365;

/// How far past the anchor an open-ended series is expanded.
pub const DEFAULT_HORIZON_YEARS: u32 = 2;

/// Effective duration of an event that has no end time.
pub const DEFAULT_EVENT_DURATION: TimeDelta = TimeDelta::hours(1);

/// Days shown by a calendar view when no end date is given.
pub const DEFAULT_VIEW_DAYS: u64 = 7;

/// Days loaded on each side of a candidate event when checking for conflicts.
pub const CONFLICT_WINDOW_DAYS: u64 = 1;

/// Upper bounds accepted for rules coming off the wire.
pub const MAX_RULE_INTERVAL: u32 = 99;
pub const MAX_RULE_COUNT: u32 = 365;
