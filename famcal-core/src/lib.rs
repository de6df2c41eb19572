//! Core types for the famcal organizer's calendar engine.
//!
//! This crate holds the two pieces of calendar logic that the organizer's
//! request handlers lean on:
//! - `recurrence` expands recurring events into concrete instances
//! - `conflict` finds existing events that clash with a proposed one
//!
//! Everything here is a pure function over caller-owned data. Loading events
//! from storage is the caller's job.

pub mod conflict;
pub mod constants;
pub mod date_range;
pub mod error;
pub mod event;
pub mod recurrence;

// Re-export the everyday types at crate root for convenience
pub use conflict::{Conflict, ConflictCandidate, ConflictDetector, ConflictReport, find_conflicts};
pub use date_range::DateRange;
pub use error::{FamcalError, FamcalResult, RuleError};
pub use event::{Event, EventInstance, Occurrence, Participant, parse_events};
pub use recurrence::{
    EndCondition, ExpansionLimits, RecurrenceRule, Weekday, WeekdaySet, expand_range,
    generate_occurrences,
};
