// tests/common/mod.rs
#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDateTime;

use wd_scrape::config::options::{Agency, AppOptions};
use wd_scrape::error::{AuthError, ScanReadError};
use wd_scrape::scan::{Navigator, TicketList};
use wd_scrape::session::Connector;
use wd_scrape::ticket::PageRow;

pub fn dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

pub fn row(id: &str, ts: &str, subject: &str) -> PageRow {
    PageRow::new(id, dt(ts), subject, "General")
}

pub fn tmp_dir(name: &str) -> PathBuf {
    let mut p = std::env::temp_dir();
    p.push(format!("wd_it_{}_{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&p);
    fs::create_dir_all(&p).unwrap();
    p
}

/// Agencies with credentials, no politeness pause.
pub fn options(codes: &[&str]) -> AppOptions {
    let mut o = AppOptions::default();
    o.agencies = codes.iter().map(|c| Agency::new(c, c).with_credentials("u", "p")).collect();
    o.workers = 2;
    o.pause_ms = 0;
    o.jitter_ms = 0;
    o
}

/// One agency's lists. Pages are oldest first, like the helpdesk.
#[derive(Clone, Debug, Default)]
pub struct Desk {
    pub open: Vec<Vec<PageRow>>,
    pub closed: Vec<Vec<PageRow>>,
    /// "N Calls" on the closed list.
    pub banner: Option<u64>,
    /// Closed list has a jump-to-last control.
    pub jump: bool,
    /// Reading any closed page fails.
    pub broken_closed: bool,
}

impl Desk {
    pub fn with_closed(pages: Vec<Vec<PageRow>>) -> Self {
        Self { closed: pages, jump: true, ..Self::default() }
    }

    pub fn with_open(mut self, pages: Vec<Vec<PageRow>>) -> Self {
        self.open = pages;
        self
    }

    pub fn broken() -> Self {
        Self { broken_closed: true, jump: true, closed: vec![vec![]], ..Self::default() }
    }
}

pub struct FakeNav {
    desk: Desk,
    list: Option<TicketList>,
    page: usize,
}

impl FakeNav {
    fn pages(&self) -> &[Vec<PageRow>] {
        match self.list {
            Some(TicketList::Open) => &self.desk.open[..],
            Some(TicketList::Closed) => &self.desk.closed[..],
            None => &[],
        }
    }
}

impl Navigator for FakeNav {
    fn open_list(&mut self, list: TicketList) -> Result<(), ScanReadError> {
        self.list = Some(list);
        self.page = 0;
        Ok(())
    }

    fn goto_last_page(&mut self) -> Result<bool, ScanReadError> {
        if self.list != Some(TicketList::Closed) || !self.desk.jump || self.pages().is_empty() {
            return Ok(false);
        }
        self.page = self.pages().len() - 1;
        Ok(true)
    }

    fn next_page(&mut self) -> Result<bool, ScanReadError> {
        if self.page + 1 < self.pages().len() {
            self.page += 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn previous_page(&mut self) -> Result<bool, ScanReadError> {
        if self.page > 0 {
            self.page -= 1;
            return Ok(true);
        }
        Ok(false)
    }

    fn read_current_page(&mut self) -> Result<Vec<PageRow>, ScanReadError> {
        let Some(list) = self.list else { return Err(ScanReadError::NoListOpen) };
        if list == TicketList::Closed && self.desk.broken_closed {
            return Err(ScanReadError::Transport { url: "fake://closed".into(), message: "timed out".into() });
        }
        Ok(self.pages().get(self.page).cloned().unwrap_or_default())
    }

    fn list_total(&mut self) -> Result<Option<u64>, ScanReadError> {
        Ok(if self.list == Some(TicketList::Closed) { self.desk.banner } else { None })
    }
}

/// Hands out `FakeNav`s by agency code. Unknown codes are rejected at login.
#[derive(Default)]
pub struct FakeHelpdesk {
    desks: HashMap<String, Desk>,
    pub connects: AtomicUsize,
}

impl FakeHelpdesk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn desk(mut self, code: &str, desk: Desk) -> Self {
        self.desks.insert(code.to_ascii_uppercase(), desk);
        self
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connector for FakeHelpdesk {
    fn connect(&self, agency: &Agency) -> Result<Box<dyn Navigator + Send>, AuthError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let desk = self
            .desks
            .get(&agency.code)
            .cloned()
            .ok_or_else(|| AuthError::Rejected { agency: agency.code.clone() })?;
        Ok(Box::new(FakeNav { desk, list: None, page: 0 }))
    }
}
