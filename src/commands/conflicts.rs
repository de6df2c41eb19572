use anyhow::Result;
use clap::Args;
use famcal_core::date_range::parse_datetime;
use famcal_core::{
    Conflict, ConflictCandidate, ConflictDetector, ConflictReport, DateRange, Event,
    ExpansionLimits,
};
use owo_colors::OwoColorize;

use crate::render::{Render, pluralize};

#[derive(Args, Debug)]
pub struct ConflictArgs {
    /// Start of the proposed event (e.g. "2025-03-01T09:00")
    #[arg(short, long)]
    pub start: String,

    /// End of the proposed event
    #[arg(short, long)]
    pub end: Option<String>,

    #[arg(long)]
    pub all_day: bool,

    /// Member id attending the proposed event (repeatable)
    #[arg(short, long = "participant")]
    pub participants: Vec<String>,

    /// Id of the event being edited, so it isn't reported against itself
    #[arg(long)]
    pub exclude: Option<String>,

    /// Print the JSON conflict report
    #[arg(long)]
    pub json: bool,
}

impl ConflictArgs {
    pub fn candidate(&self) -> Result<ConflictCandidate> {
        let start = parse_datetime(&self.start)?;
        let end = self.end.as_deref().map(parse_datetime).transpose()?;

        if let Some(end) = end
            && end < start
        {
            anyhow::bail!("End ({}) is before start ({})", end, start);
        }

        Ok(ConflictCandidate::new(start, end)
            .all_day(self.all_day)
            .with_participants(self.participants.iter().cloned()))
    }
}

/// Events worth checking against `candidate`: everything starting between the
/// previous and the next day, with recurring series expanded.
pub fn candidate_pool(
    events: &[Event],
    candidate: &ConflictCandidate,
    limits: ExpansionLimits,
) -> Vec<Event> {
    DateRange::conflict_window(candidate.start).events_in(events, limits)
}

pub fn run(
    events: &[Event],
    args: ConflictArgs,
    detector: ConflictDetector,
    limits: ExpansionLimits,
) -> Result<()> {
    let candidate = args.candidate()?;

    let pool = if candidate.participant_ids.is_empty() {
        Vec::new()
    } else {
        candidate_pool(events, &candidate, limits)
    };
    let conflicts: Vec<Conflict<'_>> = detector.find(&candidate, &pool, args.exclude.as_deref());

    if args.json {
        let report = ConflictReport::new(&conflicts);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if conflicts.is_empty() {
        println!("{}", "No conflicts".green());
        return Ok(());
    }

    let label = format!(
        "{} {}",
        conflicts.len(),
        pluralize("conflict", conflicts.len())
    );
    println!("{}", label.yellow().bold());
    for conflict in &conflicts {
        println!("  {}", conflict.render());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use famcal_core::{Participant, RecurrenceRule};

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn args(start: &str, end: Option<&str>, participants: &[&str]) -> ConflictArgs {
        ConflictArgs {
            start: start.into(),
            end: end.map(String::from),
            all_day: false,
            participants: participants.iter().map(|p| p.to_string()).collect(),
            exclude: None,
            json: false,
        }
    }

    #[test]
    fn test_candidate_from_args() {
        let candidate = args("2025-03-01T09:00", Some("2025-03-01T10:00"), &["A", "B"])
            .candidate()
            .unwrap();
        assert_eq!(candidate.start, at(1, 9, 0));
        assert_eq!(candidate.end, Some(at(1, 10, 0)));
        assert_eq!(candidate.participant_ids, vec!["A", "B"]);
    }

    #[test]
    fn test_candidate_rejects_end_before_start() {
        assert!(
            args("2025-03-01T09:00", Some("2025-03-01T08:00"), &["A"])
                .candidate()
                .is_err()
        );
    }

    #[test]
    fn test_recurring_series_conflicts_through_its_occurrence() {
        let mut lesson = Event {
            id: "piano".into(),
            title: "Piano".into(),
            start: at(3, 9, 0),
            end: Some(at(3, 10, 0)),
            all_day: false,
            participants: vec![Participant::new("A")],
            recurrence: None,
        };
        lesson.recurrence = Some(RecurrenceRule::weekly(1));
        let far_away = Event {
            id: "trip".into(),
            title: "Trip".into(),
            start: at(20, 9, 0),
            end: None,
            all_day: false,
            participants: vec![Participant::new("A")],
            recurrence: None,
        };
        let events = vec![lesson, far_away];

        // 2025-03-10 is the second weekly occurrence
        let candidate = args("2025-03-10T09:30", None, &["A"]).candidate().unwrap();
        let pool = candidate_pool(&events, &candidate, ExpansionLimits::default());
        let conflicts = ConflictDetector::default().find(&candidate, &pool, None);

        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].event.id, "piano");
        assert_eq!(conflicts[0].event.start, at(10, 9, 0));

        let excluded = ConflictDetector::default().find(&candidate, &pool, Some("piano"));
        assert!(excluded.is_empty());
    }
}
