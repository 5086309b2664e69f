// src/progress.rs
use std::io::{self, Write};

/// Lightweight progress reporting for long-running runs (per-agency scans).
/// Frontends implement this to surface status to users.
pub trait Progress {
    /// Called at the start with the number of agencies (for one date).
    fn begin(&mut self, _total: usize) {}

    /// Free-form status line for human eyes.
    fn log(&mut self, _msg: &str) {}

    /// One agency finished.
    fn item_done(&mut self, _agency: &str) {}

    /// One agency failed.
    fn item_failed(&mut self, _agency: &str, _reason: &str) {}

    /// Called at the end, successful or not.
    fn finish(&mut self) {}
}

/// A no-op progress sink.
pub struct NullProgress;
impl Progress for NullProgress {}

/// Status lines on stderr: `[2/5] Acme ✓`.
pub struct ConsoleProgress {
    done: usize,
    total: usize,
    quiet: bool,
}

impl ConsoleProgress {
    pub fn new(quiet: bool) -> Self {
        Self { done: 0, total: 0, quiet }
    }

    fn line(&self, msg: &str) {
        if !self.quiet {
            let _ = writeln!(io::stderr(), "{msg}");
        }
    }
}

impl Progress for ConsoleProgress {
    fn begin(&mut self, total: usize) {
        self.done = 0;
        self.total = total;
    }
    fn log(&mut self, msg: &str) {
        self.line(msg);
    }
    fn item_done(&mut self, agency: &str) {
        self.done += 1;
        self.line(&format!("[{}/{}] {agency} ✓", self.done, self.total));
    }
    fn item_failed(&mut self, agency: &str, reason: &str) {
        self.done += 1;
        self.line(&format!("[{}/{}] {agency} ✗ {reason}", self.done, self.total));
    }
    fn finish(&mut self) {
        if self.total > 0 {
            self.line(&format!("Done ({}/{})", self.done, self.total));
        }
    }
}
