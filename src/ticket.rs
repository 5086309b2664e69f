// src/ticket.rs
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::error::ScanReadError;
use crate::window::midnight;

/// One row of a ticket list page, as the page shows it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRow {
    pub id: String,
    pub timestamp: NaiveDateTime,
    pub subject: String,
    pub category: String,
}

impl PageRow {
    pub fn new(id: &str, timestamp: NaiveDateTime, subject: &str, category: &str) -> Self {
        Self { id: s!(id), timestamp, subject: s!(subject), category: s!(category) }
    }

    /// Text the tag counter looks at: subject, or category when the subject is blank.
    pub fn tag_text(&self) -> &str {
        if self.subject.trim().is_empty() { &self.category } else { &self.subject }
    }
}

/// A page row tagged with its agency and tag counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketRecord {
    pub id: String,
    pub agency: String,
    pub timestamp: NaiveDateTime,
    pub subject: String,
    pub category: String,
    pub bug_tags: usize,
    pub priority_tags: usize,
}

impl TicketRecord {
    pub fn tag_text(&self) -> &str {
        if self.subject.trim().is_empty() { &self.category } else { &self.subject }
    }
}

/* ---------------- Date cells ---------------- */

// Month-first, like the helpdesk renders them.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%b %d %Y %H:%M",
    "%b %d, %Y %H:%M",
    "%a %b %d %Y %H:%M",
    "%a, %b %d %Y %H:%M",
    "%a, %b %d, %Y %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%a %b %d %Y",
    "%a, %b %d %Y",
    "%a, %b %d, %Y",
    "%d %b %Y",
];

// "Jul 5 2024" buried in noise.
static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z]{3,})\.?\s+(\d{1,2}),?\s+(\d{4})").unwrap()
});

/// Parse a ticket list date cell. Date-only cells map to 00:00.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = crate::core::sanitize::normalize_ws(raw);
    if s.is_empty() {
        return None;
    }
    for f in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&s, f) {
            return Some(dt);
        }
    }
    for f in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&s, f) {
            return Some(midnight(d));
        }
    }
    let caps = MONTH_DAY_YEAR.captures(&s)?;
    let month: String = caps[1].chars().take(3).collect();
    let text = format!("{month} {} {}", &caps[2], &caps[3]);
    NaiveDate::parse_from_str(&text, "%b %d %Y").ok().map(midnight)
}

/// Like `parse_timestamp`, but an unreadable cell is a read error for ticket `id`.
pub fn require_timestamp(id: &str, raw: &str) -> Result<NaiveDateTime, ScanReadError> {
    parse_timestamp(raw).ok_or_else(|| ScanReadError::BadDate { id: s!(id), raw: s!(raw.trim()) })
}

/// `DD/MM/YYYY`, the sheet's date column.
pub fn sheet_date(d: NaiveDate) -> String {
    d.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn common_cells() {
        assert_eq!(parse_timestamp("2025-08-18 14:00:00"), Some(dt("2025-08-18 14:00")));
        assert_eq!(parse_timestamp("08/18/2025 23:59"), Some(dt("2025-08-18 23:59")));
        assert_eq!(parse_timestamp("08/18/2025"), Some(dt("2025-08-18 00:00")));
        assert_eq!(parse_timestamp("Mon, Aug 18 2025 09:15"), Some(dt("2025-08-18 09:15")));
        assert_eq!(parse_timestamp(" Aug  18,\n 2025 "), Some(dt("2025-08-18 00:00")));
    }

    #[test]
    fn fuzzy_fallback() {
        assert_eq!(parse_timestamp("opened July 5 2024 (GMT+2)"), Some(dt("2024-07-05 00:00")));
    }

    #[test]
    fn unreadable() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert!(matches!(
            require_timestamp("77", "??"),
            Err(ScanReadError::BadDate { id, .. }) if id == "77"
        ));
    }

    #[test]
    fn tag_text_falls_back_to_category() {
        let r = PageRow::new("1", dt("2025-01-01 00:00"), "  ", "DS-12 crash");
        assert_eq!(r.tag_text(), "DS-12 crash");
        assert_eq!(sheet_date(NaiveDate::from_ymd_opt(2025, 8, 5).unwrap()), "05/08/2025");
    }
}
