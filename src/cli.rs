// src/cli.rs
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::info;

use crate::config::load;
use crate::config::options::AppOptions;
use crate::error::Result;
use crate::progress::Progress;
use crate::report;
use crate::runner::{self, RunReport};
use crate::session::HttpConnector;
use crate::store::CsvStore;
use crate::tags::TagCounter;
use crate::window::parse_date;

/// Per-agency WonderDesk ticket counts.
#[derive(Parser, Debug)]
#[command(name = "wd_scrape", version, about)]
pub struct Cli {
    /// TOML config file (otherwise the environment / .env is used)
    #[arg(long, global = true, env = "WD_SCRAPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Explicit .env file
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Output directory for the daily store and reports
    #[arg(long, global = true)]
    pub out_dir: Option<PathBuf>,

    /// Rows back for the zero-value patch and the closed delta
    #[arg(long, global = true)]
    pub stride: Option<usize>,

    /// Keep zero closed counts as they are
    #[arg(long, global = true)]
    pub no_patch: bool,

    #[arg(long, global = true)]
    pub workers: Option<usize>,

    /// -v info, -vv debug, -vvv trace
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// No progress lines
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Yesterday's rows (Friday..Monday on Mondays)
    Daily {
        /// Run as if today were this date (YYYY-MM-DD); defaults to today in the configured zone
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Rows for one past date or an inclusive range
    Backfill(BackfillArgs),
    /// All-history sweep with last-week figures and CSV reports
    Sweep,
    /// Dump every open ticket
    OpenTickets,
}

#[derive(Args, Debug)]
pub struct BackfillArgs {
    #[arg(long, value_parser = parse_date, conflicts_with_all = ["start", "end"], required_unless_present = "start")]
    pub date: Option<NaiveDate>,

    #[arg(long, value_parser = parse_date, requires = "end")]
    pub start: Option<NaiveDate>,

    #[arg(long, value_parser = parse_date, requires = "start")]
    pub end: Option<NaiveDate>,
}

impl BackfillArgs {
    /// `(from, to)`; a single date is a one-day range.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.date, self.start, self.end) {
            (Some(d), _, _) => Some((d, d)),
            (None, Some(a), Some(b)) => Some((a, b)),
            _ => None,
        }
    }
}

/// Config file or environment, then CLI overrides, then validation.
pub fn load_options(cli: &Cli) -> Result<AppOptions> {
    let mut opts = match &cli.config {
        Some(path) => load::from_toml_file(path)?,
        None => load::from_env(cli.env_file.as_deref())?,
    };
    if let Some(dir) = &cli.out_dir {
        opts.export.out_dir = dir.clone();
    }
    if let Some(stride) = cli.stride {
        opts.patch.stride = stride;
    }
    if cli.no_patch {
        opts.patch.enabled = false;
    }
    if let Some(w) = cli.workers {
        opts.workers = w.max(1);
    }
    opts.validate()?;
    Ok(opts)
}

pub fn run(cli: &Cli, progress: &mut dyn Progress) -> Result<RunReport> {
    let opts = load_options(cli)?;
    info!(agencies = opts.agencies.len(), "Cli: {:?}", cli.command);
    let conn = HttpConnector::new(&opts.helpdesk);
    let now = opts.local_now(Utc::now());

    match &cli.command {
        Command::Daily { today } => {
            let mut store = CsvStore::open(&opts.export.daily_path())?;
            let today = today.unwrap_or(now.date());
            let mut report = runner::run_daily(&opts, &conn, &mut store, today, progress)?;
            report.files.push(store.path().to_path_buf());
            Ok(report)
        }
        Command::Backfill(args) => {
            // clap enforces --date or --start/--end
            let Some((from, to)) = args.range() else {
                return Ok(RunReport::default());
            };
            let mut store = CsvStore::open(&opts.export.daily_path())?;
            let mut report = runner::run_backfill(&opts, &conn, &mut store, from, to, progress)?;
            report.files.push(store.path().to_path_buf());
            Ok(report)
        }
        Command::Sweep => {
            let sweep = runner::run_full_sweep(&opts, &conn, now, progress)?;
            println!("{}", report::console_table(&report::summary_rows(&sweep)));
            let tags = TagCounter::new(&opts.scan.bug_prefixes);
            let prefix = opts.scan.bug_prefixes.first().map(String::as_str).unwrap_or("DS");
            let files = report::write_sweep(&opts.export, &sweep, &tags, prefix)?;
            Ok(RunReport { files, ..RunReport::default() })
        }
        Command::OpenTickets => {
            let (records, mut report) = runner::run_open_tickets(&opts, &conn, progress);
            report.rows_written = report::open_ticket_rows(&records).len();
            report.files.push(report::write_open_tickets(&opts.export, now.date(), &records)?);
            Ok(report)
        }
    }
}
