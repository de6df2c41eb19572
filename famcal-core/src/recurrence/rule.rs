//! Recurrence rules.
//!
//! `RecurrenceRule` is what the expander works with. `RecurrenceSpec` is the
//! flat record the organizer stores (`frequency`, `interval`, `daysOfWeek`,
//! ...); rules are (de)serialized through it so that JSON stays flat while
//! frequency-specific fields stay attached to their frequency.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_RULE_COUNT, MAX_RULE_INTERVAL};
use crate::error::RuleError;

/// How a recurring series repeats. Every variant is anchored at the series'
/// first event; `interval` is the step in units of the frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RecurrenceSpec", into = "RecurrenceSpec")]
pub enum RecurrenceRule {
    Daily {
        interval: u32,
        end: EndCondition,
    },
    /// An empty `days` set repeats on the anchor's weekday.
    Weekly {
        interval: u32,
        days: WeekdaySet,
        end: EndCondition,
    },
    /// `None` repeats on the anchor's day of month.
    Monthly {
        interval: u32,
        day_of_month: Option<u32>,
        end: EndCondition,
    },
    Yearly {
        interval: u32,
        end: EndCondition,
    },
}

/// When a series stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EndCondition {
    /// Open ended, bounded only by the expansion horizon
    #[default]
    Never,
    /// Last day (inclusive) on which an occurrence may fall
    Until(NaiveDate),
    /// Total number of occurrences, anchor included
    Count(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl FromStr for Frequency {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "YEARLY" => Ok(Frequency::Yearly),
            _ => Err(RuleError::UnknownFrequency(s.to_string())),
        }
    }
}

impl RecurrenceRule {
    pub fn daily(interval: u32) -> Self {
        RecurrenceRule::Daily {
            interval,
            end: EndCondition::Never,
        }
    }

    pub fn weekly(interval: u32) -> Self {
        RecurrenceRule::Weekly {
            interval,
            days: WeekdaySet::EMPTY,
            end: EndCondition::Never,
        }
    }

    pub fn weekly_on(interval: u32, days: impl IntoIterator<Item = Weekday>) -> Self {
        RecurrenceRule::Weekly {
            interval,
            days: days.into_iter().collect(),
            end: EndCondition::Never,
        }
    }

    pub fn monthly(interval: u32) -> Self {
        RecurrenceRule::Monthly {
            interval,
            day_of_month: None,
            end: EndCondition::Never,
        }
    }

    pub fn monthly_on_day(interval: u32, day_of_month: u32) -> Self {
        RecurrenceRule::Monthly {
            interval,
            day_of_month: Some(day_of_month),
            end: EndCondition::Never,
        }
    }

    pub fn yearly(interval: u32) -> Self {
        RecurrenceRule::Yearly {
            interval,
            end: EndCondition::Never,
        }
    }

    /// Replace the end condition.
    pub fn ending(mut self, condition: EndCondition) -> Self {
        match &mut self {
            RecurrenceRule::Daily { end, .. }
            | RecurrenceRule::Weekly { end, .. }
            | RecurrenceRule::Monthly { end, .. }
            | RecurrenceRule::Yearly { end, .. } => *end = condition,
        }
        self
    }

    pub fn until(self, last_day: NaiveDate) -> Self {
        self.ending(EndCondition::Until(last_day))
    }

    pub fn count(self, occurrences: u32) -> Self {
        self.ending(EndCondition::Count(occurrences))
    }

    pub fn frequency(&self) -> Frequency {
        match self {
            RecurrenceRule::Daily { .. } => Frequency::Daily,
            RecurrenceRule::Weekly { .. } => Frequency::Weekly,
            RecurrenceRule::Monthly { .. } => Frequency::Monthly,
            RecurrenceRule::Yearly { .. } => Frequency::Yearly,
        }
    }

    /// Step size. A zero interval is treated as 1 so expansion always advances.
    pub fn interval(&self) -> u32 {
        let interval = match self {
            RecurrenceRule::Daily { interval, .. }
            | RecurrenceRule::Weekly { interval, .. }
            | RecurrenceRule::Monthly { interval, .. }
            | RecurrenceRule::Yearly { interval, .. } => *interval,
        };
        interval.max(1)
    }

    pub fn end(&self) -> EndCondition {
        match self {
            RecurrenceRule::Daily { end, .. }
            | RecurrenceRule::Weekly { end, .. }
            | RecurrenceRule::Monthly { end, .. }
            | RecurrenceRule::Yearly { end, .. } => *end,
        }
    }
}

impl fmt::Display for RecurrenceRule {
    /// Human-readable summary, e.g. "Every 2 weeks on Mon, Wed".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.interval();
        let (unit, every_one) = match self.frequency() {
            Frequency::Daily => ("day", "Daily"),
            Frequency::Weekly => ("week", "Weekly"),
            Frequency::Monthly => ("month", "Monthly"),
            Frequency::Yearly => ("year", "Yearly"),
        };

        if n == 1 {
            write!(f, "{every_one}")?;
        } else {
            write!(f, "Every {n} {unit}s")?;
        }

        match self {
            RecurrenceRule::Weekly { days, .. } if !days.is_empty() => {
                let names: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                write!(f, " on {}", names.join(", "))?;
            }
            RecurrenceRule::Monthly {
                day_of_month: Some(day),
                ..
            } => write!(f, " on day {day}")?,
            _ => {}
        }

        match self.end() {
            EndCondition::Never => Ok(()),
            EndCondition::Until(date) => write!(f, " until {}", date.format("%Y-%m-%d")),
            EndCondition::Count(1) => write!(f, ", once"),
            EndCondition::Count(count) => write!(f, ", {count} times"),
        }
    }
}

/// A set of weekdays, stored as a bitmask indexed from Monday.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Days in Monday-first order.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        WEEK.into_iter().filter(|day| self.contains(*day))
    }

    /// Two-letter codes (`MO`, `WE`, ...) in Monday-first order.
    pub fn codes(&self) -> Vec<&'static str> {
        self.iter().map(weekday_code).collect()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Debug for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromStr for WeekdaySet {
    type Err = RuleError;

    /// Parse a comma-separated list of codes such as `MO,WE`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(parse_weekday_code)
            .collect()
    }
}

/// Parse an iCalendar weekday code (`MO`..`SU`), case-insensitively.
pub fn parse_weekday_code(code: &str) -> Result<Weekday, RuleError> {
    match code.to_ascii_uppercase().as_str() {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        _ => Err(RuleError::UnknownWeekday(code.to_string())),
    }
}

pub fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn default_interval() -> u32 {
    1
}

/// Flat recurrence record as stored alongside an event.
///
/// Fields that don't apply to `frequency` are ignored on conversion. When
/// both `end_date` and `count` are present, `end_date` wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceSpec {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl TryFrom<RecurrenceSpec> for RecurrenceRule {
    type Error = RuleError;

    fn try_from(spec: RecurrenceSpec) -> Result<Self, Self::Error> {
        let interval = match spec.interval {
            0 => return Err(RuleError::ZeroInterval),
            n if n > MAX_RULE_INTERVAL => return Err(RuleError::IntervalTooLarge(n)),
            n => n,
        };

        let end = match (spec.end_date, spec.count) {
            (Some(date), _) => EndCondition::Until(date),
            (None, Some(count)) if (1..=MAX_RULE_COUNT).contains(&count) => {
                EndCondition::Count(count)
            }
            (None, Some(count)) => return Err(RuleError::CountOutOfRange(count)),
            (None, None) => EndCondition::Never,
        };

        let rule = match spec.frequency {
            Frequency::Daily => RecurrenceRule::Daily { interval, end },
            Frequency::Weekly => {
                let days = spec
                    .days_of_week
                    .iter()
                    .map(|code| parse_weekday_code(code))
                    .collect::<Result<WeekdaySet, _>>()?;
                RecurrenceRule::Weekly {
                    interval,
                    days,
                    end,
                }
            }
            Frequency::Monthly => {
                match spec.day_of_month {
                    Some(day) if !(1..=31).contains(&day) => {
                        return Err(RuleError::DayOfMonthOutOfRange(day));
                    }
                    _ => {}
                }
                RecurrenceRule::Monthly {
                    interval,
                    day_of_month: spec.day_of_month,
                    end,
                }
            }
            Frequency::Yearly => RecurrenceRule::Yearly { interval, end },
        };

        Ok(rule)
    }
}

impl From<RecurrenceRule> for RecurrenceSpec {
    fn from(rule: RecurrenceRule) -> Self {
        let (end_date, count) = match rule.end() {
            EndCondition::Never => (None, None),
            EndCondition::Until(date) => (Some(date), None),
            EndCondition::Count(n) => (None, Some(n)),
        };

        let (days_of_week, day_of_month) = match &rule {
            RecurrenceRule::Weekly { days, .. } => {
                (days.codes().into_iter().map(String::from).collect(), None)
            }
            RecurrenceRule::Monthly { day_of_month, .. } => (Vec::new(), *day_of_month),
            _ => (Vec::new(), None),
        };

        RecurrenceSpec {
            frequency: rule.frequency(),
            interval: rule.interval(),
            days_of_week,
            day_of_month,
            end_date,
            count,
        }
    }
}
