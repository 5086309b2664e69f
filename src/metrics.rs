// src/metrics.rs
use chrono::NaiveDate;

use crate::ticket::TicketRecord;
use crate::window::TimeWindow;

/// Counts for one agency on one date.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AgencyMetrics {
    pub agency: String,
    pub date: NaiveDate,
    pub open_count: i64,
    pub closed_count: i64,
    pub open_last_window: i64,
    pub closed_last_window: i64,
    pub bug_tag_count: i64,
    pub priority_tag_count: i64,
}

impl AgencyMetrics {
    pub fn total(&self) -> i64 {
        self.open_count + self.closed_count
    }

    pub fn last_window_total(&self) -> i64 {
        self.open_last_window + self.closed_last_window
    }
}

fn len(v: &[TicketRecord]) -> i64 {
    i64::try_from(v.len()).unwrap_or(i64::MAX)
}

fn inside(v: &[TicketRecord], window: &TimeWindow) -> i64 {
    v.iter().filter(|r| window.contains(r.timestamp)).count() as i64
}

/// Combine one agency's scans.
///
/// Totals are the scan sizes; last-window figures count records inside `window`.
/// Tag sums come from the open tickets only.
pub fn aggregate(
    agency: &str,
    date: NaiveDate,
    open: &[TicketRecord],
    closed: &[TicketRecord],
    window: &TimeWindow,
) -> AgencyMetrics {
    AgencyMetrics {
        agency: s!(agency),
        date,
        open_count: len(open),
        closed_count: len(closed),
        open_last_window: inside(open, window),
        closed_last_window: inside(closed, window),
        bug_tag_count: open.iter().map(|r| r.bug_tags as i64).sum(),
        priority_tag_count: open.iter().map(|r| r.priority_tags as i64).sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagCounter;
    use crate::ticket::PageRow;
    use crate::window::{RunMode, compute, parse_date, trailing};
    use chrono::NaiveDateTime;

    fn rec(ts: &str, subject: &str) -> TicketRecord {
        let ts = NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap();
        TagCounter::default().record("Acme", PageRow::new("1", ts, subject, ""))
    }

    #[test]
    fn daily_window_totals_match_window_figures() {
        let w = compute(RunMode::DailyLive, parse_date("2025-08-19").unwrap()).unwrap();
        let open = vec![
            rec("2025-08-18 09:00", "DS1234 and DS1234 duplicate, also DS5678"),
            rec("2025-07-01 09:00", "P3 printer"),
        ];
        let closed = vec![rec("2025-08-18 14:00", "x"), rec("2025-08-18 23:59", "y")];
        let m = aggregate("Acme", w.label_date(), &open, &closed, &w);
        assert_eq!(m.open_count, 2);
        assert_eq!(m.closed_count, 2);
        assert_eq!(m.open_last_window, 1);
        assert_eq!(m.closed_last_window, 2);
        assert_eq!(m.bug_tag_count, 3);
        assert_eq!(m.priority_tag_count, 1);
        assert_eq!(m.total(), 4);
        assert_eq!(m.last_window_total(), 3);
    }

    #[test]
    fn sweep_uses_trailing_sub_window() {
        let now = NaiveDateTime::parse_from_str("2025-08-19 12:00", "%Y-%m-%d %H:%M").unwrap();
        let w = trailing(now, 7).unwrap();
        let closed = vec![
            rec("2024-01-01 00:00", ""),
            rec("2025-08-13 00:00", ""),
            rec("2025-08-19 11:00", ""),
        ];
        let m = aggregate("Acme", now.date(), &[], &closed, &w);
        assert_eq!(m.closed_count, 3);
        assert_eq!(m.closed_last_window, 2);
        assert_eq!(m.open_count, 0);
    }
}
