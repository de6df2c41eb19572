use anyhow::Result;
use chrono::NaiveDate;
use famcal_core::{DateRange, Event, EventInstance, ExpansionLimits};
use owo_colors::OwoColorize;

use crate::render::{Render, format_date_label};

pub fn run(
    events: &[Event],
    range: DateRange,
    limits: ExpansionLimits,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let instances = range.expand(events, limits);

    if json {
        println!("{}", serde_json::to_string_pretty(&instances)?);
        return Ok(());
    }

    if instances.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    for (i, (date, day)) in group_by_day(&instances).into_iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", format_date_label(date, today).bold());
        for instance in day {
            println!("{}", instance.render());
        }
    }

    Ok(())
}

/// Split start-sorted instances into runs that share a calendar day.
fn group_by_day(instances: &[EventInstance]) -> Vec<(NaiveDate, &[EventInstance])> {
    instances
        .chunk_by(|a, b| a.start().date() == b.start().date())
        .map(|day| (day[0].start().date(), day))
        .collect()
}
