// src/window.rs
//! Window calculator: run mode + reference date → half-open `[start, end)`.
//!
//! - Backfill: exactly the reference day, whatever the weekday.
//! - Daily-live: yesterday; on Mondays Friday 00:00 → Monday 00:00 so the weekend
//!   lands in Monday's row. Labels carry the run date.

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};

use crate::error::InvalidDateError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    DailyLive,
    BackfillDay,
    BackfillRange,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
    label_date: NaiveDate,
    label_week: String,
    label_month: String,
    label_year: String,
}

impl TimeWindow {
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        label_date: NaiveDate,
    ) -> Result<Self, InvalidDateError> {
        if start >= end {
            return Err(InvalidDateError::OutOfRange { date: label_date.to_string() });
        }
        let iso = label_date.iso_week();
        Ok(Self {
            start,
            end,
            label_date,
            label_week: format!("{}-{:02}", iso.year(), iso.week()),
            label_month: label_date.format("%Y-%m").to_string(),
            label_year: label_date.format("%Y").to_string(),
        })
    }

    /// All of history. Used for full-sweep totals.
    pub fn unbounded(label_date: NaiveDate) -> Self {
        let iso = label_date.iso_week();
        Self {
            start: NaiveDateTime::MIN,
            end: NaiveDateTime::MAX,
            label_date,
            label_week: format!("{}-{:02}", iso.year(), iso.week()),
            label_month: label_date.format("%Y-%m").to_string(),
            label_year: label_date.format("%Y").to_string(),
        }
    }

    pub fn start(&self) -> NaiveDateTime { self.start }
    pub fn end(&self) -> NaiveDateTime { self.end }
    pub fn label_date(&self) -> NaiveDate { self.label_date }
    pub fn label_week(&self) -> &str { &self.label_week }
    pub fn label_month(&self) -> &str { &self.label_month }
    pub fn label_year(&self) -> &str { &self.label_year }

    #[inline]
    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts < self.end
    }

    /// Strictly before the window. A page made only of these ends a backward scan.
    #[inline]
    pub fn is_before(&self, ts: NaiveDateTime) -> bool {
        ts < self.start
    }

    pub fn length(&self) -> TimeDelta {
        self.end - self.start
    }
}

pub fn midnight(d: NaiveDate) -> NaiveDateTime {
    d.and_time(NaiveTime::MIN)
}

fn shift(d: NaiveDate, back: u64) -> Result<NaiveDate, InvalidDateError> {
    d.checked_sub_days(Days::new(back))
        .ok_or_else(|| InvalidDateError::OutOfRange { date: d.to_string() })
}

fn next_day(d: NaiveDate) -> Result<NaiveDate, InvalidDateError> {
    d.checked_add_days(Days::new(1))
        .ok_or_else(|| InvalidDateError::OutOfRange { date: d.to_string() })
}

/// Window for `reference` under `mode`.
pub fn compute(mode: RunMode, reference: NaiveDate) -> Result<TimeWindow, InvalidDateError> {
    match mode {
        RunMode::BackfillDay | RunMode::BackfillRange => {
            TimeWindow::new(midnight(reference), midnight(next_day(reference)?), reference)
        }
        RunMode::DailyLive => {
            let back = if reference.weekday() == Weekday::Mon { 3 } else { 1 };
            TimeWindow::new(midnight(shift(reference, back)?), midnight(reference), reference)
        }
    }
}

/// `[now - days, now)`, labelled with `now`'s date. Full-sweep "last week" figures.
pub fn trailing(now: NaiveDateTime, days: i64) -> Result<TimeWindow, InvalidDateError> {
    let start = TimeDelta::try_days(days)
        .and_then(|d| now.checked_sub_signed(d))
        .ok_or_else(|| InvalidDateError::OutOfRange { date: now.to_string() })?;
    TimeWindow::new(start, now, now.date())
}

/// Strict `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Result<NaiveDate, InvalidDateError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| InvalidDateError::Malformed { input: s!(s) })
}

/// Every day from `a` to `b` inclusive, ascending. Reversed bounds are swapped.
pub fn days_inclusive(a: NaiveDate, b: NaiveDate) -> Vec<NaiveDate> {
    let (lo, hi) = if b < a { (b, a) } else { (a, b) };
    lo.iter_days().take_while(|d| *d <= hi).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate { parse_date(s).unwrap() }
    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn tuesday_daily_is_yesterday() {
        let w = compute(RunMode::DailyLive, d("2025-08-19")).unwrap();
        assert_eq!(w.start(), dt("2025-08-18 00:00"));
        assert_eq!(w.end(), dt("2025-08-19 00:00"));
        assert_eq!(w.length(), TimeDelta::hours(24));
    }

    #[test]
    fn monday_daily_spans_the_weekend() {
        let w = compute(RunMode::DailyLive, d("2025-08-18")).unwrap();
        assert_eq!(w.start(), dt("2025-08-15 00:00"));
        assert_eq!(w.end(), dt("2025-08-18 00:00"));
        assert_eq!(w.length(), TimeDelta::hours(72));
    }

    #[test]
    fn monday_window_is_three_times_any_other_weekday() {
        // 2025-08-18 is a Monday; walk two full weeks.
        let monday = compute(RunMode::DailyLive, d("2025-08-18")).unwrap().length();
        for day in days_inclusive(d("2025-08-19"), d("2025-08-31")) {
            let w = compute(RunMode::DailyLive, day).unwrap();
            if day.weekday() == Weekday::Mon {
                assert_eq!(w.length(), monday);
            } else {
                assert_eq!(w.length() * 3, monday, "{day}");
            }
        }
    }

    #[test]
    fn backfill_is_exact_day_even_on_monday() {
        for day in days_inclusive(d("2025-08-11"), d("2025-08-17")) {
            for mode in [RunMode::BackfillDay, RunMode::BackfillRange] {
                let w = compute(mode, day).unwrap();
                assert_eq!(w.start(), midnight(day));
                assert_eq!(w.end(), midnight(day.succ_opt().unwrap()));
            }
        }
    }

    #[test]
    fn labels() {
        let w = compute(RunMode::BackfillDay, d("2025-01-06")).unwrap();
        assert_eq!(w.label_week(), "2025-02");
        assert_eq!(w.label_month(), "2025-01");
        assert_eq!(w.label_year(), "2025");

        // ISO week-year differs from calendar year here.
        let w = compute(RunMode::BackfillDay, d("2024-12-30")).unwrap();
        assert_eq!(w.label_week(), "2025-01");
        assert_eq!(w.label_year(), "2024");
    }

    #[test]
    fn half_open_bounds() {
        let w = compute(RunMode::BackfillDay, d("2025-08-18")).unwrap();
        assert!(w.contains(dt("2025-08-18 00:00")));
        assert!(w.contains(dt("2025-08-18 23:59")));
        assert!(!w.contains(dt("2025-08-19 00:00")));
        assert!(w.is_before(dt("2025-08-17 23:59")));
    }

    #[test]
    fn bad_input() {
        assert!(matches!(parse_date("2025-02-30"), Err(InvalidDateError::Malformed { .. })));
        assert!(parse_date("18/08/2025").is_err());
        assert!(compute(RunMode::DailyLive, NaiveDate::MIN).is_err());
        assert!(compute(RunMode::BackfillDay, NaiveDate::MAX).is_err());
    }

    #[test]
    fn range_is_ascending_and_inclusive() {
        let days = days_inclusive(d("2025-01-08"), d("2025-01-06"));
        assert_eq!(days, vec![d("2025-01-06"), d("2025-01-07"), d("2025-01-08")]);
    }

    #[test]
    fn trailing_week() {
        let w = trailing(dt("2025-08-19 10:00"), 7).unwrap();
        assert_eq!(w.start(), dt("2025-08-12 10:00"));
        assert_eq!(w.length(), TimeDelta::days(7));
    }
}
