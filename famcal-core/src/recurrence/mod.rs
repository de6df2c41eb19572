//! Recurrence expansion for recurring events.
//!
//! Turns a series anchor plus its rule into concrete occurrence times, and a
//! mixed list of one-off and recurring events into the instances that fall
//! inside a calendar window.

mod rule;

pub use chrono::Weekday;
pub use rule::{
    EndCondition, Frequency, RecurrenceRule, RecurrenceSpec, WeekdaySet, parse_weekday_code,
    weekday_code,
};

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime};

use crate::constants::{DEFAULT_HORIZON_YEARS, DEFAULT_MAX_OCCURRENCES};
use crate::event::{Event, EventInstance};

/// Safety bounds applied to every expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionLimits {
    /// Most occurrences generated for one series, anchor included
    pub max_occurrences: u32,
    /// How far past the anchor an open-ended series is expanded
    pub horizon_years: u32,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        ExpansionLimits {
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            horizon_years: DEFAULT_HORIZON_YEARS,
        }
    }
}

impl ExpansionLimits {
    pub fn with_max_occurrences(self, max_occurrences: u32) -> Self {
        ExpansionLimits {
            max_occurrences,
            ..self
        }
    }
}

/// Where a series stops in time.
#[derive(Debug, Clone, Copy)]
enum Bound {
    /// No occurrence may fall on a later day
    LastDay(NaiveDate),
    /// No occurrence may start later
    Latest(NaiveDateTime),
    Unbounded,
}

impl Bound {
    fn excludes(&self, candidate: NaiveDateTime) -> bool {
        match self {
            Bound::LastDay(day) => candidate.date() > *day,
            Bound::Latest(latest) => candidate > *latest,
            Bound::Unbounded => false,
        }
    }
}

/// Lazily generated occurrence times of one series, in increasing order.
///
/// The anchor is always the first item. Iteration ends at the rule's end
/// condition, at `max_occurrences`, or (for open-ended rules) at the horizon.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    anchor: NaiveDateTime,
    rule: &'a RecurrenceRule,
    bound: Bound,
    remaining: u32,
    /// Number of frequency steps taken from the anchor
    step: u32,
    current: Option<NaiveDateTime>,
}

impl<'a> Occurrences<'a> {
    /// The horizon only bounds `EndCondition::Never`. A `Count(n)` series runs
    /// to `n` occurrences (capped by `max_occurrences`) even when that reaches
    /// past `horizon_years`, unlike an expander that applies the horizon to
    /// every rule without an end date.
    pub fn new(anchor: NaiveDateTime, rule: &'a RecurrenceRule, limits: ExpansionLimits) -> Self {
        let (bound, cap) = match rule.end() {
            EndCondition::Until(day) => (Bound::LastDay(day), limits.max_occurrences),
            EndCondition::Count(count) => (Bound::Unbounded, count.min(limits.max_occurrences)),
            EndCondition::Never => {
                let horizon = anchor
                    .checked_add_months(Months::new(limits.horizon_years.saturating_mul(12)))
                    .map_or(Bound::Unbounded, Bound::Latest);
                (horizon, limits.max_occurrences)
            }
        };

        Occurrences {
            anchor,
            rule,
            bound,
            // The anchor itself is never capped away
            remaining: cap.max(1),
            step: 0,
            current: None,
        }
    }

    /// Next candidate after `current`, before bound checks.
    fn advance(&mut self, current: NaiveDateTime) -> Option<NaiveDateTime> {
        let rule = self.rule;
        let interval = rule.interval();

        match rule {
            RecurrenceRule::Daily { .. } => current.checked_add_days(Days::new(interval.into())),
            RecurrenceRule::Weekly { days, .. } if days.is_empty() => {
                current.checked_add_days(Days::new(u64::from(interval) * 7))
            }
            RecurrenceRule::Weekly { days, .. } => self.next_listed_weekday(current, *days),
            RecurrenceRule::Monthly { day_of_month, .. } => {
                self.step = self.step.checked_add(1)?;
                let day = day_of_month.unwrap_or_else(|| self.anchor.day());
                let months = i64::from(self.step) * i64::from(interval);
                let date = shift_months(self.anchor.date(), months, day)?;
                Some(date.and_time(self.anchor.time()))
            }
            RecurrenceRule::Yearly { .. } => {
                self.step = self.step.checked_add(1)?;
                let months = i64::from(self.step) * i64::from(interval) * 12;
                let date = shift_months(self.anchor.date(), months, self.anchor.day())?;
                Some(date.and_time(self.anchor.time()))
            }
        }
    }

    /// Walk forward one day at a time to the next day whose weekday is in
    /// `days` and whose week is an `interval` multiple from the anchor's week.
    fn next_listed_weekday(
        &self,
        current: NaiveDateTime,
        days: WeekdaySet,
    ) -> Option<NaiveDateTime> {
        let interval = i64::from(self.rule.interval());
        let anchor_week = week_start(self.anchor.date());
        let mut candidate = current;

        // A full cycle of `interval` weeks always contains a listed day
        for _ in 0..(7 * interval + 7) {
            candidate = candidate.checked_add_days(Days::new(1))?;
            let weeks = (week_start(candidate.date()) - anchor_week).num_days() / 7;
            if days.contains(candidate.weekday()) && weeks % interval == 0 {
                return Some(candidate);
            }
        }

        None
    }
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let next = match self.current {
            None => self.anchor,
            Some(current) => {
                let candidate = self.advance(current).filter(|c| !self.bound.excludes(*c));
                match candidate {
                    Some(candidate) => candidate,
                    None => {
                        self.remaining = 0;
                        return None;
                    }
                }
            }
        };

        self.remaining -= 1;
        self.current = Some(next);
        Some(next)
    }
}

/// Monday of the week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.weekday().num_days_from_monday()))
}

/// Move `date` by `months` calendar months and pin it to `day`, clamped to
/// the last day of the target month.
fn shift_months(date: NaiveDate, months: i64, day: u32) -> Option<NaiveDate> {
    let index = i64::from(date.year()) * 12 + i64::from(date.month0()) + months;
    let year = i32::try_from(index.div_euclid(12)).ok()?;
    let month = u32::try_from(index.rem_euclid(12)).ok()? + 1;

    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?.day();
    NaiveDate::from_ymd_opt(year, month, day.clamp(1, last))
}

/// Generate the occurrence times of a series anchored at `anchor`.
///
/// The anchor is always included. Dates are strictly increasing and carry the
/// anchor's time of day.
pub fn generate_occurrences(
    anchor: NaiveDateTime,
    rule: &RecurrenceRule,
    limits: ExpansionLimits,
) -> Vec<NaiveDateTime> {
    let occurrences: Vec<_> = Occurrences::new(anchor, rule, limits).collect();
    tracing::trace!(%anchor, rule = %rule, count = occurrences.len(), "generated occurrences");
    occurrences
}

/// Materialize every event instance that starts in `[range_start, range_end)`.
///
/// One-off events are passed through unchanged; recurring events are expanded
/// into tagged occurrences that keep the anchor's duration. The result is
/// sorted by start time.
pub fn expand_range(
    events: &[Event],
    range_start: NaiveDateTime,
    range_end: NaiveDateTime,
    limits: ExpansionLimits,
) -> Vec<EventInstance> {
    let mut instances = Vec::new();

    for event in events {
        let Some(rule) = &event.recurrence else {
            if range_start <= event.start && event.start < range_end {
                instances.push(EventInstance::single(event.clone()));
            }
            continue;
        };

        let before = instances.len();
        instances.extend(
            Occurrences::new(event.start, rule, limits)
                .skip_while(|at| *at < range_start)
                .take_while(|at| *at < range_end)
                .map(|at| EventInstance::occurrence_of(event, at)),
        );

        tracing::trace!(
            event_id = %event.id,
            rule = %rule,
            instances = instances.len() - before,
            "expanded recurring event"
        );
    }

    instances.sort_by_key(EventInstance::start);

    tracing::debug!(
        events = events.len(),
        instances = instances.len(),
        %range_start,
        %range_end,
        "expanded events in range"
    );

    instances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Participant;
    use chrono::TimeDelta;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> NaiveDateTime {
        at(y, m, d, 0, 0)
    }

    fn dates(occurrences: &[NaiveDateTime]) -> Vec<NaiveDate> {
        occurrences.iter().map(|o| o.date()).collect()
    }

    fn generate(anchor: NaiveDateTime, rule: &RecurrenceRule) -> Vec<NaiveDateTime> {
        generate_occurrences(anchor, rule, ExpansionLimits::default())
    }

    fn event(id: &str, start: NaiveDateTime, end: Option<NaiveDateTime>) -> Event {
        Event {
            id: id.into(),
            title: id.to_uppercase(),
            start,
            end,
            all_day: false,
            participants: vec![Participant::new("anna")],
            recurrence: None,
        }
    }

    // --- generate_occurrences ---

    #[test]
    fn test_daily_steps_by_interval() {
        let anchor = at(2025, 1, 1, 7, 30);
        let occurrences = generate(anchor, &RecurrenceRule::daily(3).count(10));

        assert_eq!(occurrences.len(), 10);
        assert_eq!(occurrences[0], anchor);
        for pair in occurrences.windows(2) {
            assert_eq!(pair[1] - pair[0], TimeDelta::days(3));
        }
    }

    #[test]
    fn test_weekly_on_listed_days_until_end_date() {
        let rule = RecurrenceRule::weekly_on(1, [Weekday::Mon, Weekday::Wed]).until(date(2025, 1, 20));
        let occurrences = generate(midnight(2025, 1, 6), &rule);

        assert_eq!(
            dates(&occurrences),
            vec![
                date(2025, 1, 6),
                date(2025, 1, 8),
                date(2025, 1, 13),
                date(2025, 1, 15),
                date(2025, 1, 20),
            ]
        );
    }

    #[test]
    fn test_end_date_is_inclusive_regardless_of_time_of_day() {
        let rule = RecurrenceRule::daily(1).until(date(2025, 1, 3));
        let occurrences = generate(at(2025, 1, 1, 18, 0), &rule);
        assert_eq!(occurrences.last(), Some(&at(2025, 1, 3, 18, 0)));
        assert_eq!(occurrences.len(), 3);
    }

    #[test]
    fn test_end_date_on_anchor_yields_only_anchor() {
        let anchor = at(2025, 4, 2, 10, 0);
        for rule in [
            RecurrenceRule::daily(1),
            RecurrenceRule::weekly(1),
            RecurrenceRule::weekly_on(1, [Weekday::Wed, Weekday::Thu]),
            RecurrenceRule::monthly(1),
            RecurrenceRule::yearly(1),
        ] {
            let rule = rule.until(anchor.date());
            assert_eq!(generate(anchor, &rule), vec![anchor], "{rule}");
        }
    }

    #[test]
    fn test_count_is_exact() {
        let anchor = midnight(2025, 1, 1);
        assert_eq!(generate(anchor, &RecurrenceRule::weekly(1).count(7)).len(), 7);
        assert_eq!(generate(anchor, &RecurrenceRule::yearly(1).count(5)).len(), 5);
        assert_eq!(generate(anchor, &RecurrenceRule::daily(1).count(1)), vec![anchor]);
    }

    #[test]
    fn test_max_occurrences_caps_count() {
        let limits = ExpansionLimits::default().with_max_occurrences(4);
        let rule = RecurrenceRule::daily(1).count(10);
        let occurrences = generate_occurrences(midnight(2025, 1, 1), &rule, limits);
        assert_eq!(occurrences.len(), 4);
    }

    #[test]
    fn test_zero_max_still_includes_anchor() {
        let limits = ExpansionLimits::default().with_max_occurrences(0);
        let anchor = midnight(2025, 1, 1);
        let occurrences = generate_occurrences(anchor, &RecurrenceRule::daily(1), limits);
        assert_eq!(occurrences, vec![anchor]);
    }

    #[test]
    fn test_open_ended_rule_stops_at_horizon() {
        // 2025-01-01 + 2 years = 2027-01-01; the 105th weekly step lands on 2027-01-06
        let occurrences = generate(midnight(2025, 1, 1), &RecurrenceRule::weekly(1));
        assert_eq!(occurrences.len(), 105);
        assert_eq!(occurrences.last().unwrap().date(), date(2026, 12, 30));
    }

    #[test]
    fn test_open_ended_daily_rule_hits_safety_cap() {
        let occurrences = generate(midnight(2025, 1, 1), &RecurrenceRule::daily(1));
        assert_eq!(occurrences.len(), DEFAULT_MAX_OCCURRENCES as usize);
    }

    #[test]
    fn test_horizon_is_overridable() {
        let limits = ExpansionLimits {
            max_occurrences: 1000,
            horizon_years: 5,
        };
        let occurrences = generate_occurrences(midnight(2025, 1, 1), &RecurrenceRule::yearly(1), limits);
        assert_eq!(occurrences.len(), 6);
    }

    #[test]
    fn test_monthly_day_of_month_clamps_to_last_day() {
        let rule = RecurrenceRule::monthly_on_day(1, 31).count(5);
        let occurrences = generate(midnight(2025, 1, 31), &rule);
        assert_eq!(
            dates(&occurrences),
            vec![
                date(2025, 1, 31),
                date(2025, 2, 28),
                date(2025, 3, 31),
                date(2025, 4, 30),
                date(2025, 5, 31),
            ]
        );
    }

    #[test]
    fn test_monthly_keeps_anchor_day_without_drift() {
        let rule = RecurrenceRule::monthly(1).count(3);
        let occurrences = generate(midnight(2024, 1, 31), &rule);
        assert_eq!(
            dates(&occurrences),
            vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)]
        );
    }

    #[test]
    fn test_monthly_pins_later_occurrences_to_day_of_month() {
        let rule = RecurrenceRule::monthly_on_day(2, 15).count(3);
        let occurrences = generate(at(2025, 1, 10, 16, 0), &rule);
        assert_eq!(
            occurrences,
            vec![at(2025, 1, 10, 16, 0), at(2025, 3, 15, 16, 0), at(2025, 5, 15, 16, 0)]
        );
    }

    #[test]
    fn test_monthly_crosses_year_boundary() {
        let rule = RecurrenceRule::monthly(5).count(3);
        let occurrences = generate(midnight(2025, 11, 5), &rule);
        assert_eq!(
            dates(&occurrences),
            vec![date(2025, 11, 5), date(2026, 4, 5), date(2026, 9, 5)]
        );
    }

    #[test]
    fn test_yearly_leap_day_clamps() {
        let rule = RecurrenceRule::yearly(1).count(5);
        let occurrences = generate(midnight(2024, 2, 29), &rule);
        assert_eq!(
            dates(&occurrences),
            vec![
                date(2024, 2, 29),
                date(2025, 2, 28),
                date(2026, 2, 28),
                date(2027, 2, 28),
                date(2028, 2, 29),
            ]
        );
    }

    #[test]
    fn test_weekly_listed_days_respect_interval() {
        let rule = RecurrenceRule::weekly_on(2, [Weekday::Mon, Weekday::Wed]).count(6);
        let occurrences = generate(midnight(2025, 1, 6), &rule);
        assert_eq!(
            dates(&occurrences),
            vec![
                date(2025, 1, 6),
                date(2025, 1, 8),
                date(2025, 1, 20),
                date(2025, 1, 22),
                date(2025, 2, 3),
                date(2025, 2, 5),
            ]
        );
    }

    #[test]
    fn test_anchor_off_listed_days_is_still_first() {
        // 2025-01-07 is a Tuesday
        let rule = RecurrenceRule::weekly_on(1, [Weekday::Mon]).count(3);
        let occurrences = generate(at(2025, 1, 7, 8, 15), &rule);
        assert_eq!(
            occurrences,
            vec![at(2025, 1, 7, 8, 15), at(2025, 1, 13, 8, 15), at(2025, 1, 20, 8, 15)]
        );
    }

    #[test]
    fn test_weekly_without_days_keeps_anchor_weekday() {
        let rule = RecurrenceRule::weekly(2).count(3);
        let occurrences = generate(midnight(2025, 1, 2), &rule);
        assert!(occurrences.iter().all(|o| o.weekday() == Weekday::Thu));
        assert_eq!(occurrences[2].date(), date(2025, 1, 30));
    }

    #[test]
    fn test_zero_interval_still_advances() {
        let rule = RecurrenceRule::Daily {
            interval: 0,
            end: EndCondition::Count(3),
        };
        let occurrences = generate(midnight(2025, 1, 1), &rule);
        assert_eq!(
            dates(&occurrences),
            vec![date(2025, 1, 1), date(2025, 1, 2), date(2025, 1, 3)]
        );
    }

    #[test]
    fn test_occurrences_are_strictly_increasing() {
        let anchor = at(2025, 1, 31, 9, 0);
        for rule in [
            RecurrenceRule::daily(2),
            RecurrenceRule::weekly_on(3, [Weekday::Sun, Weekday::Fri, Weekday::Tue]),
            RecurrenceRule::monthly_on_day(1, 30),
            RecurrenceRule::monthly(1),
            RecurrenceRule::yearly(1),
        ] {
            let occurrences = generate(anchor, &rule);
            assert!(occurrences.windows(2).all(|p| p[0] < p[1]), "{rule}");
        }
    }

    // --- expand_range ---

    #[test]
    fn test_expand_passes_single_events_in_range() {
        let events = vec![
            event("before", at(2025, 2, 28, 23, 0), None),
            event("start", midnight(2025, 3, 1), None),
            event("inside", at(2025, 3, 5, 12, 0), Some(at(2025, 3, 5, 13, 0))),
            event("end", midnight(2025, 3, 8), None),
        ];

        let instances = expand_range(
            &events,
            midnight(2025, 3, 1),
            midnight(2025, 3, 8),
            ExpansionLimits::default(),
        );

        let ids: Vec<_> = instances.iter().map(|i| i.event.id.as_str()).collect();
        assert_eq!(ids, vec!["start", "inside"]);
        assert!(instances.iter().all(|i| !i.is_occurrence()));
        assert_eq!(instances[1].event, events[2]);
    }

    #[test]
    fn test_expand_recurring_and_sort() {
        let mut swim = event("swim", at(2025, 1, 6, 17, 0), Some(at(2025, 1, 6, 18, 30)));
        swim.recurrence = Some(RecurrenceRule::weekly(1));
        let dentist = event("dentist", at(2025, 1, 15, 9, 0), None);

        let instances = expand_range(
            &[swim, dentist],
            midnight(2025, 1, 10),
            midnight(2025, 1, 24),
            ExpansionLimits::default(),
        );

        let starts: Vec<_> = instances.iter().map(EventInstance::start).collect();
        assert_eq!(
            starts,
            vec![at(2025, 1, 13, 17, 0), at(2025, 1, 15, 9, 0), at(2025, 1, 20, 17, 0)]
        );

        let first = &instances[0];
        assert_eq!(first.event.end, Some(at(2025, 1, 13, 18, 30)));
        let occurrence = first.occurrence.as_ref().unwrap();
        assert_eq!(occurrence.original_event_id, "swim");
        assert_eq!(occurrence.occurrence_date, at(2025, 1, 13, 17, 0));
        assert!(!instances[1].is_occurrence());
    }

    #[test]
    fn test_expand_occurrence_without_end_has_no_end() {
        let mut standup = event("standup", at(2025, 1, 1, 9, 0), None);
        standup.recurrence = Some(RecurrenceRule::daily(1));

        let instances = expand_range(
            &[standup],
            midnight(2025, 1, 2),
            midnight(2025, 1, 4),
            ExpansionLimits::default(),
        );
        assert_eq!(instances.len(), 2);
        assert!(instances.iter().all(|i| i.event.end.is_none()));
    }

    #[test]
    fn test_expand_stays_inside_window() {
        let mut series = Vec::new();
        for (n, rule) in [
            RecurrenceRule::daily(1),
            RecurrenceRule::weekly_on(1, [Weekday::Mon, Weekday::Sat]),
            RecurrenceRule::monthly_on_day(1, 31),
            RecurrenceRule::yearly(1),
        ]
        .into_iter()
        .enumerate()
        {
            let mut e = event(&format!("series-{n}"), at(2024, 12, 31, 23, 59), None);
            e.recurrence = Some(rule);
            series.push(e);
        }

        let (start, end) = (midnight(2025, 2, 1), midnight(2025, 3, 1));
        let instances = expand_range(&series, start, end, ExpansionLimits::default());

        assert!(!instances.is_empty());
        assert!(instances.iter().all(|i| start <= i.start() && i.start() < end));
        assert!(instances.windows(2).all(|p| p[0].start() <= p[1].start()));
    }

    #[test]
    fn test_expand_series_ending_before_window_yields_nothing() {
        let mut series = event("camp", midnight(2025, 7, 1), None);
        series.recurrence = Some(RecurrenceRule::daily(1).count(5));

        let instances = expand_range(
            &[series],
            midnight(2025, 8, 1),
            midnight(2025, 9, 1),
            ExpansionLimits::default(),
        );
        assert!(instances.is_empty());
    }

    #[test]
    fn test_expand_series_with_huge_duration() {
        let far_end = NaiveDate::from_ymd_opt(262142, 1, 1).unwrap().and_time(chrono::NaiveTime::MIN);
        let mut series = event("epoch", midnight(2025, 1, 1), Some(far_end));
        series.recurrence = Some(RecurrenceRule::yearly(1));

        let instances = expand_range(
            &[series],
            midnight(2025, 1, 1),
            midnight(2027, 1, 1),
            ExpansionLimits::default(),
        );

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].event.end, Some(far_end));
        assert_eq!(instances[1].start(), midnight(2026, 1, 1));
        assert_eq!(instances[1].event.end, None);
    }
}
