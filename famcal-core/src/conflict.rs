//! Scheduling conflict detection.
//!
//! A conflict is an existing event that overlaps a proposed one in time and
//! shares at least one participant with it. Time overlap alone is not enough.

use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

use crate::constants::DEFAULT_EVENT_DURATION;
use crate::event::{Event, effective_end};

/// The event being created or edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictCandidate {
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub all_day: bool,
    pub participant_ids: Vec<String>,
}

impl ConflictCandidate {
    pub fn new(start: NaiveDateTime, end: Option<NaiveDateTime>) -> Self {
        ConflictCandidate {
            start,
            end,
            all_day: false,
            participant_ids: Vec::new(),
        }
    }

    pub fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    pub fn with_participants<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.participant_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Check an already stored event against the others, e.g. when it is edited.
    pub fn from_event(event: &Event) -> Self {
        ConflictCandidate {
            start: event.start,
            end: event.end,
            all_day: event.all_day,
            participant_ids: event.participant_ids().map(String::from).collect(),
        }
    }
}

/// An existing event that clashes with the candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict<'a> {
    pub event: &'a Event,
    /// Shared member ids, in the candidate's order; never empty
    pub conflicting_members: Vec<&'a str>,
}

/// Finds conflicts using a configurable fallback duration for open-ended events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictDetector {
    pub default_duration: TimeDelta,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        ConflictDetector {
            default_duration: DEFAULT_EVENT_DURATION,
        }
    }
}

impl ConflictDetector {
    pub fn new(default_duration: TimeDelta) -> Self {
        ConflictDetector { default_duration }
    }

    /// Return the events in `existing` that overlap `candidate` in time and
    /// share participants with it, in input order.
    ///
    /// The event whose id equals `exclude_event_id` is skipped, so an event
    /// being edited doesn't conflict with its stored self.
    pub fn find<'a>(
        &self,
        candidate: &ConflictCandidate,
        existing: &'a [Event],
        exclude_event_id: Option<&str>,
    ) -> Vec<Conflict<'a>> {
        let conflicts: Vec<_> = existing
            .iter()
            .filter(|event| exclude_event_id != Some(event.id.as_str()))
            .filter(|event| self.overlaps(candidate, event))
            .filter_map(|event| {
                let members = shared_members(candidate, event);
                if members.is_empty() {
                    tracing::trace!(event_id = %event.id, "overlap without shared participants");
                    return None;
                }
                Some(Conflict {
                    event,
                    conflicting_members: members,
                })
            })
            .collect();

        tracing::debug!(
            checked = existing.len(),
            conflicts = conflicts.len(),
            start = %candidate.start,
            "checked for conflicts"
        );

        conflicts
    }

    /// All-day on either side compares calendar days; otherwise half-open
    /// intervals, so back-to-back events don't overlap.
    fn overlaps(&self, candidate: &ConflictCandidate, event: &Event) -> bool {
        if candidate.all_day || event.all_day {
            return candidate.start.date() == event.start.date();
        }

        let candidate_end = effective_end(candidate.start, candidate.end, self.default_duration);
        let event_end = event.effective_end(self.default_duration);

        candidate.start < event_end && event.start < candidate_end
    }
}

/// Member ids present on both sides, in candidate order, without repeats.
fn shared_members<'a>(candidate: &ConflictCandidate, event: &'a Event) -> Vec<&'a str> {
    let mut members: Vec<&'a str> = Vec::new();

    for id in &candidate.participant_ids {
        let Some(member) = event.participant_ids().find(|member| *member == id.as_str()) else {
            continue;
        };
        if !members.contains(&member) {
            members.push(member);
        }
    }

    members
}

/// Find conflicts with the default one-hour duration for open-ended events.
pub fn find_conflicts<'a>(
    candidate: &ConflictCandidate,
    existing: &'a [Event],
    exclude_event_id: Option<&str>,
) -> Vec<Conflict<'a>> {
    ConflictDetector::default().find(candidate, existing, exclude_event_id)
}

const UNKNOWN_MEMBER: &str = "Unknown";

/// Conflict summary handed to the UI as a warning list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictReport {
    pub has_conflicts: bool,
    pub conflicts: Vec<ConflictEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictEntry {
    pub event_id: String,
    pub event_title: String,
    pub event_start_time: NaiveDateTime,
    pub event_end_time: Option<NaiveDateTime>,
    pub event_all_day: bool,
    pub conflicting_members: Vec<ConflictMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictMember {
    pub id: String,
    pub name: String,
}

impl ConflictReport {
    pub fn new(conflicts: &[Conflict<'_>]) -> Self {
        let conflicts: Vec<ConflictEntry> = conflicts.iter().map(ConflictEntry::from).collect();
        ConflictReport {
            has_conflicts: !conflicts.is_empty(),
            conflicts,
        }
    }
}

impl From<&Conflict<'_>> for ConflictEntry {
    fn from(conflict: &Conflict<'_>) -> Self {
        let event = conflict.event;
        let conflicting_members = conflict
            .conflicting_members
            .iter()
            .map(|id| ConflictMember {
                id: id.to_string(),
                name: event.participant_name(id).unwrap_or(UNKNOWN_MEMBER).to_string(),
            })
            .collect();

        ConflictEntry {
            event_id: event.id.clone(),
            event_title: event.title.clone(),
            event_start_time: event.start,
            event_end_time: event.end,
            event_all_day: event.all_day,
            conflicting_members,
        }
    }
}
