use anyhow::Result;
use clap::Args;
use famcal_core::date_range::{parse_date, parse_datetime};
use famcal_core::recurrence::{Frequency, RecurrenceSpec};
use famcal_core::{ExpansionLimits, FamcalError, RecurrenceRule, generate_occurrences};
use owo_colors::OwoColorize;

use crate::render::{format_datetime, pluralize};

#[derive(Args, Debug)]
pub struct OccurrencesArgs {
    /// First occurrence (e.g. "2025-01-06T17:00")
    #[arg(short, long)]
    pub start: String,

    /// daily, weekly, monthly or yearly
    #[arg(short, long)]
    pub freq: Frequency,

    #[arg(short, long, default_value_t = 1)]
    pub interval: u32,

    /// Weekdays for weekly rules (e.g. "MO,WE")
    #[arg(long, value_delimiter = ',')]
    pub days: Vec<String>,

    /// Day of month for monthly rules
    #[arg(long)]
    pub day_of_month: Option<u32>,

    /// Last day an occurrence may fall on (YYYY-MM-DD)
    #[arg(long, conflicts_with = "count")]
    pub until: Option<String>,

    /// Total number of occurrences
    #[arg(long)]
    pub count: Option<u32>,

    /// Override the configured occurrence cap
    #[arg(long)]
    pub max: Option<u32>,

    /// Print JSON instead of a list
    #[arg(long)]
    pub json: bool,
}

impl OccurrencesArgs {
    pub fn rule(&self) -> Result<RecurrenceRule> {
        let end_date = self.until.as_deref().map(parse_date).transpose()?;

        let spec = RecurrenceSpec {
            frequency: self.freq,
            interval: self.interval,
            days_of_week: self.days.clone(),
            day_of_month: self.day_of_month,
            end_date,
            count: self.count,
        };

        Ok(RecurrenceRule::try_from(spec).map_err(FamcalError::InvalidRule)?)
    }
}

pub fn run(args: OccurrencesArgs, limits: ExpansionLimits) -> Result<()> {
    let start = parse_datetime(&args.start)?;
    let rule = args.rule()?;
    let limits = match args.max {
        Some(max) => limits.with_max_occurrences(max),
        None => limits,
    };

    let occurrences = generate_occurrences(start, &rule, limits);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
        return Ok(());
    }

    println!(
        "{} {}",
        rule.to_string().bold(),
        format!(
            "({} {})",
            occurrences.len(),
            pluralize("occurrence", occurrences.len())
        )
        .dimmed()
    );
    for at in &occurrences {
        println!("  {}", format_datetime(*at));
    }

    Ok(())
}
