// src/report.rs
//! Full-sweep reports and the open-ticket dump.
//!
//! - `agencias_wonderdesk_stats.csv`: one row per agency + `TOTAL`
//! - `tickets_wonderdesk.csv`: open tickets and closed tickets inside the trailing window
//! - `ds_cross_agencies.csv`: each bug id with the agencies that mention it
//! - `open_tickets_YYYYMMDD.csv`: open tickets, one row each

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::config::consts::{DS_CROSS_FILE, OPEN_TICKETS_PREFIX, SUMMARY_FILE, TICKETS_FILE};
use crate::config::options::ExportOptions;
use crate::error::{Error, Result};
use crate::file::write_table;
use crate::metrics::AgencyMetrics;
use crate::runner::Sweep;
use crate::tags::{BugIndex, TagCounter};
use crate::ticket::{TicketRecord, sheet_date};

pub const SUMMARY_HEADERS: [&str; 7] = [
    "Nombre Agencia", "Tickets Abiertos", "Tickets Cerrados",
    "Abiertos Última Semana", "Cerrados Última Semana", "DS", "P3",
];
pub const TICKET_HEADERS: [&str; 8] = ["Agency", "Status", "ID", "Date", "Subject", "Category", "DS", "P3"];
pub const DS_CROSS_HEADERS: [&str; 4] = ["DS", "Subject", "Agencias", "Num Agencias"];
pub const OPEN_TICKET_HEADERS: [&str; 6] = ["AGENCIA", "ID", "Fecha", "Mes", "Año", "Subject"];

/// Bug ids shorter than this are too ambiguous to cross-reference.
const DS_MIN_DIGITS: usize = 3;

fn write(path: &Path, headers: &[&str], rows: &[Vec<String>], delim: char) -> Result<PathBuf> {
    write_table(path, headers, rows, delim).map_err(|e| Error::io(path, e))?;
    info!("Report: wrote {} ({} rows)", path.display(), rows.len());
    Ok(path.to_path_buf())
}

fn yes(n: usize) -> String {
    if n > 0 { s!("YES") } else { s!() }
}

/* ---------------- Summary ---------------- */

fn summary_numbers(m: &AgencyMetrics) -> [i64; 6] {
    [
        m.open_count,
        m.closed_count,
        m.open_last_window,
        m.closed_last_window,
        m.bug_tag_count,
        m.priority_tag_count,
    ]
}

/// Per-agency rows followed by the `TOTAL` row.
pub fn summary_rows(sweep: &Sweep) -> Vec<Vec<String>> {
    let mut total = [0i64; 6];
    let mut rows: Vec<Vec<String>> = sweep
        .agencies
        .iter()
        .map(|a| {
            let nums = summary_numbers(&a.metrics);
            for (t, n) in total.iter_mut().zip(nums) {
                *t += n;
            }
            row![a.metrics.agency.clone(), nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]]
        })
        .collect();
    rows.push(row!["TOTAL", total[0], total[1], total[2], total[3], total[4], total[5]]);
    rows
}

/* ---------------- Tickets ---------------- */

fn ticket_row(t: &TicketRecord, status: &str) -> Vec<String> {
    row![
        t.agency.clone(),
        status,
        t.id.clone(),
        t.timestamp.format("%Y-%m-%d %H:%M"),
        t.subject.clone(),
        t.category.clone(),
        yes(t.bug_tags),
        yes(t.priority_tags),
    ]
}

pub fn ticket_rows(sweep: &Sweep) -> Vec<Vec<String>> {
    sweep
        .agencies
        .iter()
        .flat_map(|a| {
            let open = a.open.iter().map(|t| ticket_row(t, "Open"));
            let closed = a.closed.iter().map(|t| ticket_row(t, "Closed"));
            open.chain(closed)
        })
        .collect()
}

/* ---------------- Cross-agency bugs ---------------- */

/// Every bug id (at least three digits) seen in any swept ticket.
pub fn bug_index(sweep: &Sweep, tags: &TagCounter) -> BugIndex {
    let mut idx = BugIndex::default();
    for t in sweep.agencies.iter().flat_map(|a| a.open.iter().chain(&a.closed)) {
        let text = t.tag_text();
        for n in tags.bug_numbers(text, DS_MIN_DIGITS) {
            idx.add(n, &t.agency, text);
        }
    }
    idx
}

pub fn ds_cross_rows(idx: &BugIndex, prefix: &str) -> Vec<Vec<String>> {
    idx.iter()
        .map(|(n, e)| {
            let agencies: Vec<&str> = e.agencies.iter().map(String::as_str).collect();
            row![format!("{prefix}{n}"), e.subject.clone(), agencies.join(", "), e.agencies.len()]
        })
        .collect()
}

/// Write the three sweep reports into `export.out_dir`.
pub fn write_sweep(export: &ExportOptions, sweep: &Sweep, tags: &TagCounter, bug_prefix: &str) -> Result<Vec<PathBuf>> {
    let d = export.delim;
    let idx = bug_index(sweep, tags);
    info!("Report: {} bug ids across {} agencies", idx.len(), sweep.agencies.len());
    Ok(vec![
        write(&export.report_path(SUMMARY_FILE), &SUMMARY_HEADERS, &summary_rows(sweep), d)?,
        write(&export.report_path(TICKETS_FILE), &TICKET_HEADERS, &ticket_rows(sweep), d)?,
        write(&export.report_path(DS_CROSS_FILE), &DS_CROSS_HEADERS, &ds_cross_rows(&idx, bug_prefix), d)?,
    ])
}

/* ---------------- Open-ticket dump ---------------- */

/// Rows for tickets with both an id and a subject.
pub fn open_ticket_rows(records: &[TicketRecord]) -> Vec<Vec<String>> {
    records
        .iter()
        .filter(|t| !t.id.trim().is_empty() && !t.subject.trim().is_empty())
        .map(|t| {
            let d = t.timestamp.date();
            row![
                t.agency.clone(),
                t.id.clone(),
                sheet_date(d),
                d.format("%m"),
                d.format("%Y"),
                t.subject.clone(),
            ]
        })
        .collect()
}

pub fn open_tickets_file(date: NaiveDate) -> String {
    format!("{OPEN_TICKETS_PREFIX}_{}.csv", date.format("%Y%m%d"))
}

pub fn write_open_tickets(export: &ExportOptions, date: NaiveDate, records: &[TicketRecord]) -> Result<PathBuf> {
    let path = export.report_path(&open_tickets_file(date));
    write(&path, &OPEN_TICKET_HEADERS, &open_ticket_rows(records), export.delim)
}

/* ---------------- Console ---------------- */

/// Fixed-width summary table (header, agencies, TOTAL).
pub fn console_table(rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = SUMMARY_HEADERS.iter().map(|h| h.chars().count()).collect();
    for r in rows {
        for (w, c) in widths.iter_mut().zip(r) {
            *w = (*w).max(c.chars().count());
        }
    }
    let rule = |ch: char| -> String {
        widths.iter().map(|w| ch.to_string().repeat(w + 2)).collect::<Vec<_>>().join("+")
    };
    let line = |cells: &[String]| -> String {
        widths
            .iter()
            .zip(cells)
            .map(|(w, c)| format!(" {c:<w$} "))
            .collect::<Vec<_>>()
            .join("|")
    };

    let header: Vec<String> = SUMMARY_HEADERS.iter().map(|h| s!(*h)).collect();
    let mut out = Vec::with_capacity(rows.len() + 5);
    out.push(rule('='));
    out.push(line(&header));
    out.push(rule('='));
    if let Some((total, body)) = rows.split_last() {
        out.extend(body.iter().map(|r| line(r)));
        out.push(rule('-'));
        out.push(line(total));
    }
    out.push(rule('='));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::AgencySweep;
    use crate::ticket::PageRow;
    use crate::window::trailing;
    use chrono::NaiveDateTime;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn rec(agency: &str, id: &str, ts: &str, subject: &str) -> TicketRecord {
        TagCounter::default().record(agency, PageRow::new(id, dt(ts), subject, "Web"))
    }

    fn sweep() -> Sweep {
        let now = dt("2025-08-19 12:00");
        let window = trailing(now, 7).unwrap();
        let mk = |agency: &str, open: Vec<TicketRecord>, closed: Vec<TicketRecord>, total: i64| {
            let mut metrics = crate::metrics::aggregate(agency, now.date(), &open, &closed, &window);
            metrics.closed_count = total;
            AgencySweep { metrics, open, closed }
        };
        Sweep {
            agencies: vec![
                mk(
                    "Beta",
                    vec![rec("Beta", "10", "2025-08-18 09:00", "DS1234 P3 checkout")],
                    vec![rec("Beta", "11", "2025-08-17 09:00", "DS-0999 fixed")],
                    40,
                ),
                mk("Alpha", vec![rec("Alpha", "20", "2025-06-01 09:00", "ds1234 checkout broken")], vec![], 2),
            ],
            window,
        }
    }

    #[test]
    fn summary_has_total_row() {
        let rows = summary_rows(&sweep());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Beta", "1", "40", "1", "1", "1", "1"]);
        assert_eq!(rows[1], vec!["Alpha", "1", "2", "0", "0", "1", "0"]);
        assert_eq!(rows[2], vec!["TOTAL", "2", "42", "1", "1", "2", "1"]);
    }

    #[test]
    fn ticket_rows_flag_tags() {
        let rows = ticket_rows(&sweep());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], vec!["Beta", "Open", "10", "2025-08-18 09:00", "DS1234 P3 checkout", "Web", "YES", "YES"]);
        assert_eq!(rows[1][1], "Closed");
        assert_eq!(&rows[2][6..], &[s!("YES"), s!()]);
    }

    #[test]
    fn cross_agency_bugs() {
        let s = sweep();
        let idx = bug_index(&s, &TagCounter::default());
        let rows = ds_cross_rows(&idx, "DS");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["DS999", "DS-0999 fixed", "Beta", "1"]);
        assert_eq!(rows[1], vec!["DS1234", "ds1234 checkout broken", "Alpha, Beta", "2"]);
    }

    #[test]
    fn open_dump_skips_rows_without_subject() {
        let records = vec![rec("Acme", "1", "2025-08-18 09:00", "Login"), rec("Acme", "2", "2025-08-18 10:00", "")];
        let rows = open_ticket_rows(&records);
        assert_eq!(rows, vec![vec!["Acme", "1", "18/08/2025", "08", "2025", "Login"]]);
        let d = NaiveDate::from_ymd_opt(2025, 8, 19).unwrap();
        assert_eq!(open_tickets_file(d), "open_tickets_20250819.csv");
    }

    #[test]
    fn console_table_lines_up() {
        let table = console_table(&summary_rows(&sweep()));
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 8);
        assert!(lines[6].starts_with(" TOTAL "));
        let width = lines[0].chars().count();
        assert!(lines.iter().all(|l| l.chars().count() == width));
    }
}
