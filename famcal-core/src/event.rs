//! Event types as the calendar engine sees them.
//!
//! The organizer's storage layer owns events; these types are the read-only
//! view it hands over. Field names follow the JSON the organizer already
//! speaks (`startTime`, `allDay`, ...).

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{FamcalError, FamcalResult};
use crate::recurrence::RecurrenceRule;

/// A calendar event. Recurring series are represented by their anchor event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Stable across every occurrence of a series
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "startTime")]
    pub start: NaiveDateTime,
    #[serde(rename = "endTime", default)]
    pub end: Option<NaiveDateTime>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Present only on the anchor of a recurring series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
}

/// A family member attending an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub member_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Participant {
    pub fn new(member_id: impl Into<String>) -> Self {
        Participant {
            member_id: member_id.into(),
            name: None,
        }
    }

    pub fn named(member_id: impl Into<String>, name: impl Into<String>) -> Self {
        Participant {
            member_id: member_id.into(),
            name: Some(name.into()),
        }
    }
}

impl Event {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn participant_ids(&self) -> impl Iterator<Item = &str> {
        self.participants.iter().map(|p| p.member_id.as_str())
    }

    /// Display name for a participant, if this event knows it.
    pub fn participant_name(&self, member_id: &str) -> Option<&str> {
        self.participants
            .iter()
            .find(|p| p.member_id == member_id)
            .and_then(|p| p.name.as_deref())
    }

    /// Length of the event, when it has an explicit end.
    pub fn duration(&self) -> Option<TimeDelta> {
        self.end.map(|end| end - self.start)
    }

    /// End time used for overlap checks: the explicit end, or `start + fallback`.
    pub fn effective_end(&self, fallback: TimeDelta) -> NaiveDateTime {
        effective_end(self.start, self.end, fallback)
    }
}

/// Parse a JSON array of events as exported by the organizer.
pub fn parse_events(json: &str) -> FamcalResult<Vec<Event>> {
    serde_json::from_str(json).map_err(|e| FamcalError::Serialization(e.to_string()))
}

pub(crate) fn effective_end(
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
    fallback: TimeDelta,
) -> NaiveDateTime {
    end.unwrap_or_else(|| start.checked_add_signed(fallback).unwrap_or(NaiveDateTime::MAX))
}

/// Tags an instance generated from a recurring series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    pub original_event_id: String,
    pub occurrence_date: NaiveDateTime,
}

/// A concrete event on the calendar: either a one-off event or one
/// occurrence of a series with its own start/end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventInstance {
    #[serde(flatten)]
    pub event: Event,
    #[serde(flatten)]
    pub occurrence: Option<Occurrence>,
}

impl EventInstance {
    pub fn single(event: Event) -> Self {
        EventInstance {
            event,
            occurrence: None,
        }
    }

    /// Build the instance of `anchor` that starts at `at`, keeping the anchor's
    /// duration. An end past the representable range is left open.
    pub fn occurrence_of(anchor: &Event, at: NaiveDateTime) -> Self {
        let mut event = anchor.clone();
        event.start = at;
        event.end = anchor.duration().and_then(|d| at.checked_add_signed(d));

        EventInstance {
            event,
            occurrence: Some(Occurrence {
                original_event_id: anchor.id.clone(),
                occurrence_date: at,
            }),
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.event.start
    }

    pub fn is_occurrence(&self) -> bool {
        self.occurrence.is_some()
    }
}
