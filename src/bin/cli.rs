// src/bin/cli.rs
use std::path::Path;

use clap::Parser;
use color_eyre::eyre::Result;

use wd_scrape::cli::{self, Cli};
use wd_scrape::config::consts::LOG_FILE;
use wd_scrape::log;
use wd_scrape::progress::ConsoleProgress;

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Cli::parse();
    log::init(args.verbose, Some(Path::new(LOG_FILE)));

    let mut progress = ConsoleProgress::new(args.quiet);
    let report = cli::run(&args, &mut progress)?;

    for path in &report.files {
        println!("Wrote {}", path.display());
    }
    if !report.is_clean() {
        for f in &report.failures {
            eprintln!("Failed: {f}");
        }
        std::process::exit(2);
    }
    Ok(())
}
