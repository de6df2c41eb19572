//! TUI rendering traits for famcal types.
//!
//! Extension traits that add colored terminal rendering to famcal-core types
//! using owo_colors.

use chrono::{NaiveDate, NaiveDateTime};
use famcal_core::{Conflict, EventInstance};
use owo_colors::OwoColorize;

const UNKNOWN_MEMBER: &str = "Unknown";

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for EventInstance {
    fn render(&self) -> String {
        let time = if self.event.all_day {
            format!("{:>7}", "all-day")
        } else {
            format!("{:>7}", self.event.start.format("%H:%M"))
        };

        let mut line = format!("  {} {}", time, self.event.title);
        if self.is_occurrence() {
            line.push_str(&format!(" {}", "(repeats)".dimmed()));
        }
        if !self.event.participants.is_empty() {
            let who = participant_names(self);
            line.push_str(&format!(" {}", format!("[{who}]").dimmed()));
        }
        line
    }
}

fn participant_names(instance: &EventInstance) -> String {
    instance
        .event
        .participants
        .iter()
        .map(|p| p.name.as_deref().unwrap_or(&p.member_id))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Render for Conflict<'_> {
    /// e.g. `"Swimming" (09:30) - Anna, Ben`
    fn render(&self) -> String {
        let plain = conflict_message(self);
        format!("{} {}", "!".yellow(), plain.yellow())
    }
}

/// Uncolored one-line description of a conflict.
pub fn conflict_message(conflict: &Conflict<'_>) -> String {
    let event = conflict.event;

    let time = if event.all_day {
        "all-day".to_string()
    } else {
        event.start.format("%H:%M").to_string()
    };

    let names = conflict
        .conflicting_members
        .iter()
        .map(|id| event.participant_name(id).unwrap_or(UNKNOWN_MEMBER))
        .collect::<Vec<_>>()
        .join(", ");

    format!("\"{}\" ({}) - {}", event.title, time, names)
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn format_date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

pub fn format_datetime(at: NaiveDateTime) -> String {
    at.format("%a %Y-%m-%d %H:%M").to_string()
}

/// Simple pluralization helper
pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}
