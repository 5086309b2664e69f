// src/runner.rs
//! Multi-agency orchestration.
//!
//! ```text
//! daily     : window(today)         → per agency: connect → open scan → closed scan → aggregate → patch → row
//! backfill  : for each date (asc)   → same as daily with the exact-day window; one store append per date
//! sweep     : trailing window       → per agency: connect → open scan → closed scan → closed total → aggregate
//! open dump : per agency            → connect → open scan
//! ```
//! Agencies run on a small worker pool; results are put back in configured
//! order before anything is written. Daily, backfill and the open dump skip a
//! failing agency and report it; the sweep stops at the first failure.

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    mpsc,
};
use std::thread;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, error, info, warn};

use crate::config::options::{Agency, AppOptions};
use crate::error::{Error, Result, ScanReadError};
use crate::metrics::{AgencyMetrics, aggregate};
use crate::patch;
use crate::progress::Progress;
use crate::scan::{Navigator, collect_records, scan_closed, scan_open};
use crate::session::Connector;
use crate::store::{RowSink, SheetCursor};
use crate::tags::TagCounter;
use crate::ticket::TicketRecord;
use crate::window::{RunMode, TimeWindow, compute, days_inclusive, trailing};

/// An agency skipped for one date (or for the whole run when `date` is `None`).
#[derive(Debug)]
pub struct AgencyFailure {
    pub date: Option<NaiveDate>,
    pub agency: String,
    pub error: Error,
}

impl std::fmt::Display for AgencyFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.date {
            Some(d) => write!(f, "{d} {}: {}", self.agency, self.error),
            None => write!(f, "{}: {}", self.agency, self.error),
        }
    }
}

/// What a run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub failures: Vec<AgencyFailure>,
    pub rows_written: usize,
    pub files: Vec<PathBuf>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// One agency's full-sweep result.
#[derive(Debug, Clone)]
pub struct AgencySweep {
    pub metrics: AgencyMetrics,
    pub open: Vec<TicketRecord>,
    /// Closed tickets inside the trailing window.
    pub closed: Vec<TicketRecord>,
}

/// Full-sweep result, in configured agency order.
#[derive(Debug, Clone)]
pub struct Sweep {
    pub window: TimeWindow,
    pub agencies: Vec<AgencySweep>,
}

/* ---------------- Worker pool ---------------- */

/// Run `work` for every configured agency on `opts.workers` threads.
///
/// Results come back in agency order. With `fail_fast`, workers stop picking up
/// new agencies once one has failed; agencies never started are absent.
fn for_each_agency<T, F>(
    opts: &AppOptions,
    fail_fast: bool,
    progress: &mut dyn Progress,
    work: F,
) -> Vec<(usize, Result<T>)>
where
    T: Send,
    F: Fn(&Agency) -> Result<T> + Sync,
{
    let agencies = &opts.agencies;
    let next = AtomicUsize::new(0);
    let abort = AtomicBool::new(false);
    let (res_tx, res_rx) = mpsc::channel::<(usize, Result<T>)>();
    let workers = opts.workers.min(agencies.len()).max(1);

    progress.begin(agencies.len());
    let mut results = Vec::with_capacity(agencies.len());

    thread::scope(|s| {
        for _ in 0..workers {
            let tx = res_tx.clone();
            let (next, abort, work) = (&next, &abort, &work);
            s.spawn(move || {
                loop {
                    if abort.load(Ordering::Relaxed) {
                        break;
                    }
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    if i >= agencies.len() {
                        break;
                    }
                    let result = work(&agencies[i]);
                    if fail_fast && result.is_err() {
                        abort.store(true, Ordering::Relaxed);
                    }
                    let _ = tx.send((i, result));
                    thread::sleep(opts.pause_for(i)); // be polite
                }
            });
        }
        drop(res_tx); // collector is the sole receiver now

        for (i, result) in res_rx {
            let name = agencies[i].name();
            match &result {
                Ok(_) => progress.item_done(name),
                Err(e) => progress.item_failed(name, &e.to_string()),
            }
            results.push((i, result));
        }
    });

    progress.finish();
    results.sort_by_key(|(i, _)| *i);
    results
}

fn agency_failed(agency: &Agency, e: Error) -> Error {
    Error::AgencyFailed { agency: s!(agency.name()), source: Box::new(e) }
}

/* ---------------- Per-agency scans ---------------- */

fn read_open<N: Navigator + ?Sized>(
    nav: &mut N,
    agency: &Agency,
    opts: &AppOptions,
    tags: &TagCounter,
) -> Result<Vec<TicketRecord>, ScanReadError> {
    collect_records(scan_open(nav, opts.scan.max_open_pages)?, agency.name(), tags)
}

fn read_closed<N: Navigator + ?Sized>(
    nav: &mut N,
    agency: &Agency,
    window: &TimeWindow,
    opts: &AppOptions,
    tags: &TagCounter,
) -> Result<Vec<TicketRecord>, ScanReadError> {
    collect_records(scan_closed(nav, window, opts.scan.max_closed_pages)?, agency.name(), tags)
}

/// Open + closed scan for one agency and one window, aggregated (not patched).
pub fn scan_agency(
    conn: &dyn Connector,
    agency: &Agency,
    window: &TimeWindow,
    opts: &AppOptions,
    tags: &TagCounter,
) -> Result<AgencyMetrics> {
    let mut nav = conn.connect(agency)?;
    let open = read_open(&mut nav, agency, opts, tags)?;
    let closed = read_closed(&mut nav, agency, window, opts, tags)?;
    let m = aggregate(agency.name(), window.label_date(), &open, &closed, window);
    debug!(agency = %agency.code, open = m.open_count, closed = m.closed_count, "Runner: scanned");
    Ok(m)
}

/// All-history closed count: the list's banner when shown, else a full scan.
fn closed_total<N: Navigator + ?Sized>(
    nav: &mut N,
    agency: &Agency,
    label_date: NaiveDate,
    opts: &AppOptions,
) -> Result<i64, ScanReadError> {
    if let Some(n) = nav.list_total()? {
        return Ok(i64::try_from(n).unwrap_or(i64::MAX));
    }
    debug!(agency = %agency.code, "Runner: no calls banner; counting the whole closed list");
    let all = TimeWindow::unbounded(label_date);
    scan_closed(nav, &all, opts.scan.max_closed_pages)?.try_fold(0i64, |n, row| row.map(|_| n + 1))
}

fn sweep_agency(
    conn: &dyn Connector,
    agency: &Agency,
    window: &TimeWindow,
    opts: &AppOptions,
    tags: &TagCounter,
) -> Result<AgencySweep> {
    let mut nav = conn.connect(agency)?;
    let open = read_open(&mut nav, agency, opts, tags)?;
    let closed = read_closed(&mut nav, agency, window, opts, tags)?;
    let mut metrics = aggregate(agency.name(), window.label_date(), &open, &closed, window);
    metrics.closed_count = closed_total(&mut nav, agency, window.label_date(), opts)?;
    Ok(AgencySweep { metrics, open, closed })
}

/* ---------------- Daily / backfill ---------------- */

/// Scan every agency for `window`, patch, and append one row per agency.
fn emit_window(
    opts: &AppOptions,
    conn: &dyn Connector,
    sink: &mut dyn RowSink,
    window: &TimeWindow,
    tags: &TagCounter,
    progress: &mut dyn Progress,
    report: &mut RunReport,
) -> Result<()> {
    let date = window.label_date();
    progress.log(&format!("{date}: {} → {}", window.start(), window.end()));
    let results = for_each_agency(opts, false, progress, |a| scan_agency(conn, a, window, opts, tags));

    let stride = opts.patch.stride;
    let mut cursor = SheetCursor::new(sink.existing());
    for (i, result) in results {
        let agency = &opts.agencies[i];
        match result {
            Ok(mut m) => {
                if opts.patch.enabled {
                    patch::resolve(&mut m, &cursor, stride);
                }
                cursor.push(&m, window, stride);
            }
            Err(e) => {
                error!(agency = %agency.code, %date, "Runner: {e}");
                report.failures.push(AgencyFailure {
                    date: Some(date),
                    agency: s!(agency.name()),
                    error: agency_failed(agency, e),
                });
            }
        }
    }

    let rows = cursor.into_rows();
    sink.append_rows(&rows)?;
    report.rows_written += rows.len();
    info!(%date, rows = rows.len(), "Runner: rows appended");
    Ok(())
}

/// Daily-live run for `today` (Monday covers the weekend).
pub fn run_daily(
    opts: &AppOptions,
    conn: &dyn Connector,
    sink: &mut dyn RowSink,
    today: NaiveDate,
    progress: &mut dyn Progress,
) -> Result<RunReport> {
    let window = compute(RunMode::DailyLive, today)?;
    let tags = TagCounter::new(&opts.scan.bug_prefixes);
    let mut report = RunReport::default();
    emit_window(opts, conn, sink, &window, &tags, progress, &mut report)?;
    Ok(report)
}

/// Backfill `from..=to` (swapped if reversed), one date at a time, ascending.
/// Each date's rows are stored before the next date runs.
pub fn run_backfill(
    opts: &AppOptions,
    conn: &dyn Connector,
    sink: &mut dyn RowSink,
    from: NaiveDate,
    to: NaiveDate,
    progress: &mut dyn Progress,
) -> Result<RunReport> {
    let mode = if from == to { RunMode::BackfillDay } else { RunMode::BackfillRange };
    let tags = TagCounter::new(&opts.scan.bug_prefixes);
    let mut report = RunReport::default();
    for date in days_inclusive(from, to) {
        let window = compute(mode, date)?;
        emit_window(opts, conn, sink, &window, &tags, progress, &mut report)?;
    }
    if !report.is_clean() {
        warn!(failures = report.failures.len(), "Runner: backfill finished with failures");
    }
    Ok(report)
}

/* ---------------- Full sweep ---------------- */

/// All-history sweep with "last `sweep_days` days" figures. Nothing is written here;
/// the first agency failure aborts the whole run.
pub fn run_full_sweep(
    opts: &AppOptions,
    conn: &dyn Connector,
    now: NaiveDateTime,
    progress: &mut dyn Progress,
) -> Result<Sweep> {
    let window = trailing(now, opts.scan.sweep_days)?;
    let tags = TagCounter::new(&opts.scan.bug_prefixes);
    let results = for_each_agency(opts, true, progress, |a| sweep_agency(conn, a, &window, opts, &tags));

    let mut agencies = Vec::with_capacity(results.len());
    for (i, result) in results {
        match result {
            Ok(a) => agencies.push(a),
            Err(e) => {
                let agency = &opts.agencies[i];
                error!(agency = %agency.code, "Runner: sweep aborted: {e}");
                return Err(agency_failed(agency, e));
            }
        }
    }
    info!(agencies = agencies.len(), "Runner: sweep complete");
    Ok(Sweep { window, agencies })
}

/* ---------------- Open-ticket dump ---------------- */

/// Every open ticket of every agency, in agency order. Failing agencies are reported.
pub fn run_open_tickets(
    opts: &AppOptions,
    conn: &dyn Connector,
    progress: &mut dyn Progress,
) -> (Vec<TicketRecord>, RunReport) {
    let tags = TagCounter::new(&opts.scan.bug_prefixes);
    let results = for_each_agency(opts, false, progress, |a| {
        let mut nav = conn.connect(a)?;
        Ok(read_open(&mut nav, a, opts, &tags)?)
    });

    let mut report = RunReport::default();
    let mut records = Vec::new();
    for (i, result) in results {
        let agency = &opts.agencies[i];
        match result {
            Ok(v) => records.extend(v),
            Err(e) => {
                error!(agency = %agency.code, "Runner: {e}");
                report.failures.push(AgencyFailure {
                    date: None,
                    agency: s!(agency.name()),
                    error: agency_failed(agency, e),
                });
            }
        }
    }
    (records, report)
}
