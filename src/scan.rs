// src/scan.rs
//! Paginated ticket scanner.
//!
//! A `PageScan` walks a ticket list one page at a time through a `Navigator`
//! and yields rows lazily: the next page is requested only once the current
//! page's rows have been handed out.
//!
//! ```text
//! closed:  open_list(Closed) → goto_last_page → read → previous → read → … (stop: page older than window)
//!          no jump control   → read → next → read → …                      (stop: page with nothing inside)
//! open:    open_list(Open)   → read → next → read → …                      (stop: no next page)
//! ```
//! Every walk also stops on an empty page, and fails with `PageLimit` if it
//! would read more than `max_pages` pages.

use tracing::debug;

use crate::error::ScanReadError;
use crate::tags::TagCounter;
use crate::ticket::{PageRow, TicketRecord};
use crate::window::TimeWindow;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TicketList {
    /// Home list: currently open tickets.
    Open,
    Closed,
}

/// Page-level access to a helpdesk ticket list.
///
/// Navigation calls return `Ok(false)` when the control is not on the page.
pub trait Navigator {
    fn open_list(&mut self, list: TicketList) -> Result<(), ScanReadError>;
    fn goto_last_page(&mut self) -> Result<bool, ScanReadError>;
    fn next_page(&mut self) -> Result<bool, ScanReadError>;
    fn previous_page(&mut self) -> Result<bool, ScanReadError>;
    fn read_current_page(&mut self) -> Result<Vec<PageRow>, ScanReadError>;

    /// The list's own all-history count ("N Calls"), if the page shows one.
    fn list_total(&mut self) -> Result<Option<u64>, ScanReadError> {
        Ok(None)
    }
}

impl<N: Navigator + ?Sized> Navigator for Box<N> {
    fn open_list(&mut self, list: TicketList) -> Result<(), ScanReadError> {
        (**self).open_list(list)
    }
    fn goto_last_page(&mut self) -> Result<bool, ScanReadError> {
        (**self).goto_last_page()
    }
    fn next_page(&mut self) -> Result<bool, ScanReadError> {
        (**self).next_page()
    }
    fn previous_page(&mut self) -> Result<bool, ScanReadError> {
        (**self).previous_page()
    }
    fn read_current_page(&mut self) -> Result<Vec<PageRow>, ScanReadError> {
        (**self).read_current_page()
    }
    fn list_total(&mut self) -> Result<Option<u64>, ScanReadError> {
        (**self).list_total()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Previous,
    Next,
}

/// When a freshly read page ends the walk (its rows are not yielded).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stop {
    /// Only the source running out of pages.
    Never,
    /// Every row is strictly before `window.start`.
    OlderThanStart,
    /// No row falls inside the window.
    NoneInside,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Read,
    Advance,
    Done,
}

pub struct PageScan<'a, N: Navigator + ?Sized> {
    nav: &'a mut N,
    step: Step,
    stop: Stop,
    window: Option<TimeWindow>,
    max_pages: usize,
    pages: usize,
    buf: std::vec::IntoIter<PageRow>,
    state: State,
}

impl<'a, N: Navigator + ?Sized> PageScan<'a, N> {
    fn new(nav: &'a mut N, step: Step, stop: Stop, window: Option<TimeWindow>, max_pages: usize) -> Self {
        Self {
            nav,
            step,
            stop,
            window,
            max_pages,
            pages: 0,
            buf: Vec::new().into_iter(),
            state: State::Read,
        }
    }

    /// Pages read so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    fn ends_walk(&self, rows: &[PageRow]) -> bool {
        match (&self.window, self.stop) {
            (_, Stop::Never) | (None, _) => false,
            (Some(w), Stop::OlderThanStart) => rows.iter().all(|r| w.is_before(r.timestamp)),
            (Some(w), Stop::NoneInside) => !rows.iter().any(|r| w.contains(r.timestamp)),
        }
    }

    fn in_window(&self, row: &PageRow) -> bool {
        self.window.as_ref().is_none_or(|w| w.contains(row.timestamp))
    }

    fn fail(&mut self, e: ScanReadError) -> Option<Result<PageRow, ScanReadError>> {
        self.state = State::Done;
        Some(Err(e))
    }
}

impl<N: Navigator + ?Sized> Iterator for PageScan<'_, N> {
    type Item = Result<PageRow, ScanReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.buf.next() {
                if self.in_window(&row) {
                    return Some(Ok(row));
                }
                continue;
            }
            match self.state {
                State::Done => return None,
                State::Read => {
                    if self.pages >= self.max_pages {
                        return self.fail(ScanReadError::PageLimit { limit: self.max_pages });
                    }
                    let rows = match self.nav.read_current_page() {
                        Ok(rows) => rows,
                        Err(e) => return self.fail(e),
                    };
                    self.pages += 1;
                    if rows.is_empty() || self.ends_walk(&rows) {
                        debug!("Scan: stop at page {} ({} rows)", self.pages, rows.len());
                        self.state = State::Done;
                        continue;
                    }
                    self.buf = rows.into_iter();
                    self.state = State::Advance;
                }
                State::Advance => {
                    let moved = match self.step {
                        Step::Previous => self.nav.previous_page(),
                        Step::Next => self.nav.next_page(),
                    };
                    match moved {
                        Ok(true) => self.state = State::Read,
                        Ok(false) => self.state = State::Done,
                        Err(e) => return self.fail(e),
                    }
                }
            }
        }
    }
}

/// Every row of the open list, first page onwards.
pub fn scan_open<N: Navigator + ?Sized>(
    nav: &mut N,
    max_pages: usize,
) -> Result<PageScan<'_, N>, ScanReadError> {
    nav.open_list(TicketList::Open)?;
    Ok(PageScan::new(nav, Step::Next, Stop::Never, None, max_pages))
}

/// Rows of the closed list inside `window`, newest page first.
pub fn scan_closed<'a, N: Navigator + ?Sized>(
    nav: &'a mut N,
    window: &TimeWindow,
    max_pages: usize,
) -> Result<PageScan<'a, N>, ScanReadError> {
    nav.open_list(TicketList::Closed)?;
    if nav.goto_last_page()? {
        Ok(PageScan::new(nav, Step::Previous, Stop::OlderThanStart, Some(window.clone()), max_pages))
    } else {
        debug!("Scan: closed list has no jump-to-end control; walking forward");
        Ok(PageScan::new(nav, Step::Next, Stop::NoneInside, Some(window.clone()), max_pages))
    }
}

/// Drain a scan into tagged records. Any error discards what was read.
pub fn collect_records<N: Navigator + ?Sized>(
    scan: PageScan<'_, N>,
    agency: &str,
    tags: &TagCounter,
) -> Result<Vec<TicketRecord>, ScanReadError> {
    scan.map(|row| row.map(|r| tags.record(agency, r))).collect()
}
