// src/store.rs
//! Append-only daily row store.
//!
//! One 14-column row per (agency, date), written in order. Earlier rows are
//! read back for the zero-value patch and the closed-count delta, both of which
//! address "the row `stride` rows before this one".

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::config::consts::DAILY_HEADERS;
use crate::csv::parse_rows;
use crate::error::{Error, Result};
use crate::file::{append_rows, is_missing_or_empty, write_rows_start};
use crate::metrics::AgencyMetrics;
use crate::patch::{HistoricalClosed, Lookup};
use crate::ticket::sheet_date;
use crate::window::TimeWindow;

const AGENCY_COL: usize = 1;
const CLOSED_COL: usize = 3;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Int(i64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Int(n) => write!(f, "{n}"),
        }
    }
}

/// One emitted daily row (see `DAILY_HEADERS` for column order).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub agency: String,
    pub open_count: i64,
    pub closed_count: i64,
    pub open_last_window: i64,
    pub closed_last_window: i64,
    pub bug_tag_count: i64,
    pub priority_tag_count: i64,
    pub total: i64,
    pub last_window_total: i64,
    pub delta_closed: i64,
    pub week: String,
    pub month: String,
    pub year: String,
}

impl DailyRow {
    pub fn new(m: &AgencyMetrics, window: &TimeWindow, delta_closed: i64) -> Self {
        Self {
            date: m.date,
            agency: m.agency.clone(),
            open_count: m.open_count,
            closed_count: m.closed_count,
            open_last_window: m.open_last_window,
            closed_last_window: m.closed_last_window,
            bug_tag_count: m.bug_tag_count,
            priority_tag_count: m.priority_tag_count,
            total: m.total(),
            last_window_total: m.last_window_total(),
            delta_closed,
            week: s!(window.label_week()),
            month: s!(window.label_month()),
            year: s!(window.label_year()),
        }
    }

    pub fn cells(&self) -> [Cell; 14] {
        use Cell::*;
        [
            Text(sheet_date(self.date)),
            Text(self.agency.clone()),
            Int(self.open_count),
            Int(self.closed_count),
            Int(self.open_last_window),
            Int(self.closed_last_window),
            Int(self.bug_tag_count),
            Int(self.priority_tag_count),
            Int(self.total),
            Int(self.last_window_total),
            Int(self.delta_closed),
            Text(self.week.clone()),
            Text(self.month.clone()),
            Text(self.year.clone()),
        ]
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.cells().iter().map(ToString::to_string).collect()
    }
}

/// What the patch and the delta need from a stored row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredRow {
    pub agency: String,
    /// `None` when the cell did not hold an integer.
    pub closed: Option<i64>,
}

impl From<&DailyRow> for StoredRow {
    fn from(r: &DailyRow) -> Self {
        Self { agency: r.agency.clone(), closed: Some(r.closed_count) }
    }
}

/// Destination for daily rows.
pub trait RowSink {
    /// Rows already stored, oldest first.
    fn existing(&self) -> &[StoredRow];
    fn append_rows(&mut self, rows: &[DailyRow]) -> Result<()>;
}

/* ---------------- CSV file ---------------- */

pub struct CsvStore {
    path: PathBuf,
    rows: Vec<StoredRow>,
}

impl CsvStore {
    /// Open (or plan to create) the store at `path` and load its rows.
    pub fn open(path: &Path) -> Result<Self> {
        let rows = if is_missing_or_empty(path) {
            Vec::new()
        } else {
            let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
            let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
            let mut parsed = parse_rows(text, ',');
            let header = parsed.first().filter(|h| h.first().is_some_and(|c| c.trim() == DAILY_HEADERS[0]));
            if let Some(h) = header {
                if h.len() != DAILY_HEADERS.len() {
                    return Err(Error::Store {
                        path: path.to_path_buf(),
                        message: format!("header has {} columns, expected {}", h.len(), DAILY_HEADERS.len()),
                    });
                }
                parsed.remove(0);
            } else if !parsed.is_empty() {
                warn!("Store: {} has no header row", path.display());
            }
            parsed
                .iter()
                .map(|r| StoredRow {
                    agency: r.get(AGENCY_COL).cloned().unwrap_or_default(),
                    closed: r.get(CLOSED_COL).and_then(|c| c.trim().parse().ok()),
                })
                .collect()
        };
        debug!("Store: {} rows in {}", rows.len(), path.display());
        Ok(Self { path: path.to_path_buf(), rows })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowSink for CsvStore {
    fn existing(&self) -> &[StoredRow] {
        &self.rows
    }

    fn append_rows(&mut self, rows: &[DailyRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        if is_missing_or_empty(&self.path) {
            write_rows_start(&self.path, Some(&DAILY_HEADERS[..]), ',').map_err(|e| Error::io(&self.path, e))?;
        }
        let lines: Vec<Vec<String>> = rows.iter().map(DailyRow::to_strings).collect();
        append_rows(&self.path, &lines, ',').map_err(|e| Error::io(&self.path, e))?;
        self.rows.extend(rows.iter().map(StoredRow::from));
        debug!("Store: appended {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }
}

/* ---------------- In memory ---------------- */

/// Store kept in memory. Seeded rows stand in for history.
#[derive(Default, Debug)]
pub struct MemoryStore {
    history: Vec<StoredRow>,
    pub written: Vec<DailyRow>,
    pub appends: usize,
}

impl MemoryStore {
    pub fn with_history<I: IntoIterator<Item = (String, i64)>>(rows: I) -> Self {
        Self {
            history: rows.into_iter().map(|(agency, c)| StoredRow { agency, closed: Some(c) }).collect(),
            ..Self::default()
        }
    }
}

impl RowSink for MemoryStore {
    fn existing(&self) -> &[StoredRow] {
        &self.history
    }

    fn append_rows(&mut self, rows: &[DailyRow]) -> Result<()> {
        self.history.extend(rows.iter().map(StoredRow::from));
        self.written.extend_from_slice(rows);
        self.appends += 1;
        Ok(())
    }
}

/* ---------------- Cursor ---------------- */

/// Rows about to be appended after `existing`. Positions count both.
pub struct SheetCursor<'a> {
    existing: &'a [StoredRow],
    pending: Vec<DailyRow>,
}

impl<'a> SheetCursor<'a> {
    pub fn new(existing: &'a [StoredRow]) -> Self {
        Self { existing, pending: Vec::new() }
    }

    /// Position the next row will take.
    pub fn position(&self) -> usize {
        self.existing.len() + self.pending.len()
    }

    fn closed_at(&self, idx: usize) -> Option<(&str, Option<i64>)> {
        if idx < self.existing.len() {
            let r = &self.existing[idx];
            Some((r.agency.as_str(), r.closed))
        } else {
            self.pending
                .get(idx - self.existing.len())
                .map(|r| (r.agency.as_str(), Some(r.closed_count)))
        }
    }

    /// Append a row for `metrics` (already patched), computing the closed delta.
    pub fn push(&mut self, metrics: &AgencyMetrics, window: &TimeWindow, stride: usize) -> &DailyRow {
        let delta = match self.historical_closed(&metrics.agency, stride) {
            Lookup::Found(prev) => metrics.closed_count - prev,
            Lookup::NotFound => 0,
        };
        self.pending.push(DailyRow::new(metrics, window, delta));
        &self.pending[self.pending.len() - 1]
    }

    pub fn into_rows(self) -> Vec<DailyRow> {
        self.pending
    }
}

impl HistoricalClosed for SheetCursor<'_> {
    /// The row `stride` before the next one, if it belongs to `agency`.
    fn historical_closed(&self, agency: &str, stride: usize) -> Lookup {
        let pos = self.position();
        if stride == 0 || pos < stride {
            return Lookup::NotFound;
        }
        match self.closed_at(pos - stride) {
            Some((a, Some(v))) if a == agency => Lookup::Found(v),
            _ => Lookup::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{RunMode, compute, parse_date};

    fn m(agency: &str, closed: i64) -> AgencyMetrics {
        AgencyMetrics {
            agency: s!(agency),
            date: parse_date("2025-08-18").unwrap(),
            open_count: 3,
            closed_count: closed,
            open_last_window: 1,
            closed_last_window: closed,
            bug_tag_count: 2,
            priority_tag_count: 0,
        }
    }

    fn hist(v: &[(&str, i64)]) -> Vec<StoredRow> {
        v.iter().map(|(a, c)| StoredRow { agency: s!(*a), closed: Some(*c) }).collect()
    }

    fn tmp_file(name: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("wd_store_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&p);
        p.join("datos_daily.csv")
    }

    #[test]
    fn row_layout() {
        let w = compute(RunMode::BackfillDay, parse_date("2025-08-18").unwrap()).unwrap();
        let row = DailyRow::new(&m("Acme", 4), &w, -1);
        assert_eq!(
            row.to_strings(),
            vec!["18/08/2025", "Acme", "3", "4", "1", "4", "2", "0", "7", "5", "-1", "2025-34", "2025-08", "2025"]
        );
    }

    #[test]
    fn lookup_is_rows_back_and_same_agency() {
        let existing = hist(&[("A", 5), ("B", 9)]);
        let cursor = SheetCursor::new(&existing);
        assert_eq!(cursor.historical_closed("A", 2), Lookup::Found(5));
        assert_eq!(cursor.historical_closed("B", 2), Lookup::NotFound);
        assert_eq!(cursor.historical_closed("A", 3), Lookup::NotFound);
    }

    #[test]
    fn pending_rows_count_as_history() {
        let w = compute(RunMode::BackfillDay, parse_date("2025-08-18").unwrap()).unwrap();
        let existing = hist(&[]);
        let mut cursor = SheetCursor::new(&existing);
        assert_eq!(cursor.push(&m("A", 4), &w, 2).delta_closed, 0);
        cursor.push(&m("B", 1), &w, 2);
        assert_eq!(cursor.historical_closed("A", 2), Lookup::Found(4));
        assert_eq!(cursor.push(&m("A", 6), &w, 2).delta_closed, 2);
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn csv_store_round_trip() {
        let path = tmp_file("rt");
        let w = compute(RunMode::BackfillDay, parse_date("2025-08-18").unwrap()).unwrap();

        let mut store = CsvStore::open(&path).unwrap();
        assert!(store.is_empty());
        let rows = vec![DailyRow::new(&m("Agency, One", 4), &w, 0), DailyRow::new(&m("B", 0), &w, 0)];
        store.append_rows(&rows).unwrap();
        store.append_rows(&rows[..1]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 4);
        assert!(text.starts_with("Fecha,AGENCIA,"));

        let reopened = CsvStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 3);
        assert_eq!(reopened.existing()[0], StoredRow { agency: s!("Agency, One"), closed: Some(4) });
        assert_eq!(reopened.existing()[1].closed, Some(0));
    }

    #[test]
    fn append_after_unterminated_last_line() {
        let path = tmp_file("no_eol");
        let w = compute(RunMode::BackfillDay, parse_date("2025-08-19").unwrap()).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let seeded = DailyRow::new(&m("A", 2), &w, 0).to_strings().join(",");
        fs::write(&path, format!("{}\n{}", DAILY_HEADERS.join(","), seeded)).unwrap();

        let mut store = CsvStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        store.append_rows(&[DailyRow::new(&m("A", 3), &w, 1)]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().nth(2).unwrap().starts_with("19/08/2025,A,3,3,"));

        let reopened = CsvStore::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.existing()[1], StoredRow { agency: s!("A"), closed: Some(3) });
    }

    #[test]
    fn bom_header_is_not_a_row() {
        let path = tmp_file("bom");
        let w = compute(RunMode::BackfillDay, parse_date("2025-08-19").unwrap()).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let row = DailyRow::new(&m("A", 4), &w, 0).to_strings().join(",");
        fs::write(&path, format!("\u{feff}{}\r\n{}\r\n", DAILY_HEADERS.join(","), row)).unwrap();

        let store = CsvStore::open(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.existing()[0], StoredRow { agency: s!("A"), closed: Some(4) });
    }

    #[test]
    fn foreign_header_is_refused() {
        let path = tmp_file("foreign");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "Fecha,AGENCIA,Total\n19/08/2025,A,4\n").unwrap();
        assert!(matches!(CsvStore::open(&path), Err(Error::Store { .. })));
    }
}
