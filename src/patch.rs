// src/patch.rs
//! Zero-value patch: a zero closed count is replaced by the closed count of the
//! row `stride` rows earlier in the daily store, when that value is positive.
//!
//! `stride` counts rows, not days. The store holds one row per agency per day,
//! so with a fixed agency list it is "agencies × days back".

use tracing::info;

use crate::metrics::AgencyMetrics;

/// Result of a historical lookup. A miss is not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup {
    Found(i64),
    NotFound,
}

/// Read-only access to earlier closed counts.
pub trait HistoricalClosed {
    fn historical_closed(&self, agency: &str, stride: usize) -> Lookup;
}

impl<F> HistoricalClosed for F
where
    F: Fn(&str, usize) -> Lookup,
{
    fn historical_closed(&self, agency: &str, stride: usize) -> Lookup {
        self(agency, stride)
    }
}

/// Patch `metrics.closed_count` in place. Returns `true` if it was replaced.
///
/// The lookup is only consulted when the count is zero.
pub fn resolve<H: HistoricalClosed + ?Sized>(metrics: &mut AgencyMetrics, lookup: &H, stride: usize) -> bool {
    if metrics.closed_count != 0 {
        return false;
    }
    match lookup.historical_closed(&metrics.agency, stride) {
        Lookup::Found(v) if v > 0 => {
            info!(agency = %metrics.agency, value = v, stride, "Patch: closed 0 → {v}");
            metrics.closed_count = v;
            true
        }
        Lookup::Found(v) => {
            info!(agency = %metrics.agency, value = v, stride, "Patch: historical value not positive; keeping 0");
            false
        }
        Lookup::NotFound => {
            info!(agency = %metrics.agency, stride, "Patch: no historical row; keeping 0");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::cell::Cell;

    fn metrics(closed: i64) -> AgencyMetrics {
        AgencyMetrics {
            agency: s!("Acme"),
            date: NaiveDate::from_ymd_opt(2025, 8, 19).unwrap(),
            open_count: 7,
            closed_count: closed,
            open_last_window: 1,
            closed_last_window: 0,
            bug_tag_count: 2,
            priority_tag_count: 1,
        }
    }

    #[test]
    fn zero_takes_positive_history() {
        let mut m = metrics(0);
        assert!(resolve(&mut m, &|_: &str, _: usize| Lookup::Found(5), 22));
        assert_eq!(m.closed_count, 5);
        // Nothing else moves.
        assert_eq!(m, AgencyMetrics { closed_count: 5, ..metrics(0) });
    }

    #[test]
    fn zero_stays_zero_without_history() {
        let mut m = metrics(0);
        assert!(!resolve(&mut m, &|_: &str, _: usize| Lookup::Found(0), 22));
        assert_eq!(m.closed_count, 0);
        assert!(!resolve(&mut m, &|_: &str, _: usize| Lookup::NotFound, 22));
        assert_eq!(m.closed_count, 0);
    }

    #[test]
    fn nonzero_never_consults_history() {
        let calls = Cell::new(0);
        let lookup = |_: &str, _: usize| {
            calls.set(calls.get() + 1);
            Lookup::Found(99)
        };
        let mut m = metrics(4);
        assert!(!resolve(&mut m, &lookup, 22));
        assert_eq!(m.closed_count, 4);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn stride_and_agency_are_forwarded() {
        let mut m = metrics(0);
        let lookup = |agency: &str, stride: usize| {
            assert_eq!((agency, stride), ("Acme", 3));
            Lookup::Found(1)
        };
        resolve(&mut m, &lookup, 3);
        assert_eq!(m.closed_count, 1);
    }
}
