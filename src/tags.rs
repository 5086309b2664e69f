// src/tags.rs
//! Bug / priority tag occurrences in ticket text.
//!
//! Bug tags are `<PREFIX><digits>` with optional whitespace or `-` in between
//! (`DS1234`, `ds-77`, `DS 5`). Priority tags are `P3` (`P 3` tolerated).
//! Both are word-anchored and case-insensitive, and counted per occurrence.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::ticket::{PageRow, TicketRecord};

static PRIORITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bP\s*3\b").unwrap());

#[derive(Clone, Debug)]
pub struct TagCounter {
    bug: Regex,
}

impl Default for TagCounter {
    fn default() -> Self {
        Self::new(crate::config::consts::BUG_PREFIXES)
    }
}

impl TagCounter {
    /// Prefixes are matched literally. An empty list falls back to the default `DS`.
    pub fn new<S: AsRef<str>>(prefixes: &[S]) -> Self {
        let alts: Vec<String> = prefixes
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect();
        let alts = if alts.is_empty() { s!("DS") } else { alts.join("|") };
        // Escaped literals only; the pattern always compiles.
        let bug = Regex::new(&format!(r"(?i)\b(?:{alts})\s*-?\s*(\d+)")).unwrap();
        Self { bug }
    }

    pub fn bug_count(&self, text: &str) -> usize {
        self.bug.find_iter(text).count()
    }

    pub fn priority_count(&self, text: &str) -> usize {
        PRIORITY.find_iter(text).count()
    }

    /// `(bug, priority)` occurrences.
    pub fn count(&self, text: &str) -> (usize, usize) {
        (self.bug_count(text), self.priority_count(text))
    }

    /// Tag a page row for `agency`.
    pub fn record(&self, agency: &str, row: PageRow) -> TicketRecord {
        let (bug_tags, priority_tags) = self.count(row.tag_text());
        TicketRecord {
            id: row.id,
            agency: s!(agency),
            timestamp: row.timestamp,
            subject: row.subject,
            category: row.category,
            bug_tags,
            priority_tags,
        }
    }

    /// Distinct bug numbers with at least `min_digits` digits, leading zeros dropped.
    /// Used by the cross-agency index, where `DS-0123` and `ds123` are the same bug.
    pub fn bug_numbers(&self, text: &str, min_digits: usize) -> Vec<u64> {
        let mut out: Vec<u64> = self
            .bug
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .filter(|m| m.as_str().len() >= min_digits)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Per-bug accumulator for the cross-agency report.
#[derive(Default, Debug)]
pub struct BugIndex {
    entries: BTreeMap<u64, BugEntry>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct BugEntry {
    pub subject: String,
    pub agencies: std::collections::BTreeSet<String>,
}

impl BugIndex {
    pub fn add(&mut self, number: u64, agency: &str, subject: &str) {
        let e = self.entries.entry(number).or_default();
        e.agencies.insert(s!(agency));
        if subject.chars().count() > e.subject.chars().count() {
            e.subject = s!(subject);
        }
    }

    /// Ascending by bug number.
    pub fn iter(&self) -> impl Iterator<Item = (&u64, &BugEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_occurrence() {
        let t = TagCounter::default();
        assert_eq!(t.bug_count("DS1234 and DS1234 duplicate, also DS5678"), 3);
    }

    #[test]
    fn separators_case_and_boundaries() {
        let t = TagCounter::default();
        assert_eq!(t.bug_count("ds-12 / DS 7 / Ds - 9"), 3);
        assert_eq!(t.bug_count("ADS1234 DSX12 DS"), 0);
        assert_eq!(t.priority_count("P3: login; p 3 again; P30 no; XP3 no"), 2);
        assert_eq!(t.priority_count("P3."), 1);
    }

    #[test]
    fn configured_prefixes() {
        let t = TagCounter::new(&["DS", "IS"]);
        assert_eq!(t.bug_count("IS-44 blocks DS 12"), 2);
        assert_eq!(TagCounter::new(&["IS"]).bug_count("DS12"), 0);
        assert_eq!(TagCounter::new::<&str>(&[]).bug_count("DS12"), 1);
    }

    #[test]
    fn bug_numbers_are_normalized() {
        let t = TagCounter::default();
        assert_eq!(t.bug_numbers("DS-0123, ds123, DS 45, DS9999", 3), vec![123, 9999]);
    }

    #[test]
    fn index_keeps_longest_subject() {
        let mut idx = BugIndex::default();
        assert!(idx.is_empty());
        idx.add(200, "B", "DS200 crash");
        idx.add(200, "A", "DS200 crash on save");
        idx.add(100, "A", "DS100");
        let v: Vec<_> = idx.iter().collect();
        assert_eq!(idx.len(), 2);
        assert_eq!(*v[0].0, 100);
        assert_eq!(v[1].1.subject, "DS200 crash on save");
        assert_eq!(v[1].1.agencies.iter().cloned().collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
