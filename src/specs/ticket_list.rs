// src/specs/ticket_list.rs
//! Scraping *spec* for WonderDesk ticket lists (home/open and closed).
//!
//! Ticket table:
//! - The page may hold several (nested) layout tables. A **ticket table** is one whose
//!   first row has an `ID` cell, a `Date`/`Fecha` cell and a `Category`/`Categoria` cell.
//!   When several qualify, the one with the most ticket rows wins.
//! - The category cell usually wraps the subject in an anchor: subject = anchor text,
//!   category = whole cell text. A separate `Subject`/`Asunto` column takes precedence.
//! - Rows without an ID (pagination strips, spacers) are skipped. A ticket row whose date
//!   cannot be read is a `ScanReadError::BadDate`.
//!
//! Pagination anchors are matched on their visible text (`>>`, `[<]`, `Siguiente`, …).
//!
//! Login: a page that still shows a password input is a login page.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::core::html::{attr_value, elements_ci, inner_after_open_tag, open_tag, open_tags_ci, text_of, to_lower};
use crate::core::sanitize::squash_ws;
use crate::error::ScanReadError;
use crate::ticket::{PageRow, require_timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageLink {
    Last,
    Previous,
    Next,
}

impl PageLink {
    /// Accepted anchor texts, whitespace removed and lowercased.
    fn texts(self) -> &'static [&'static str] {
        match self {
            PageLink::Last => &[">>", "[>>]", "»»"],
            PageLink::Previous => &["<", "[<]", "<<", "««"],
            PageLink::Next => &[">", "[>]", "next", "siguiente", "siguiente>", "avanzar", "»"],
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Columns {
    id: usize,
    date: usize,
    category: usize,
    subject: Option<usize>,
}

impl Columns {
    fn from_header(cells: &[String]) -> Option<Self> {
        let heads: Vec<String> = cells.iter().map(|c| to_lower(c)).collect();
        let find = |pred: &dyn Fn(&str) -> bool| heads.iter().position(|h| pred(h));
        let id = find(&|h| h == "id")?;
        let date = find(&|h| h.contains("fecha") || h.contains("date"))?;
        let category = find(&|h| h.contains("category") || h.contains("categoria") || h.contains("categoría"))?;
        let subject = find(&|h| (h.contains("subject") || h.contains("asunto")) && !h.contains("categor"));
        Some(Self { id, date, category, subject })
    }

    fn width(&self) -> usize {
        [self.id, self.date, self.category, self.subject.unwrap_or(0)].into_iter().max().unwrap_or(0) + 1
    }
}

/// Raw text of one ticket row, before date parsing.
struct RawRow {
    id: String,
    date: String,
    subject: String,
    category: String,
}

/// Every table in the document, nested ones included, outermost first.
fn all_tables(doc: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut stack = elements_ci(doc, &["table"]);
    stack.reverse();
    while let Some(t) = stack.pop() {
        out.push(t);
        let body_start = open_tag(t).len();
        let mut nested = elements_ci(&t[body_start..], &["table"]);
        nested.reverse();
        stack.extend(nested);
    }
    out
}

fn cell_texts(row: &str) -> Vec<String> {
    elements_ci(row, &["td", "th"]).into_iter().map(text_of).collect()
}

fn read_table(table: &str) -> Option<Vec<RawRow>> {
    let body = inner_after_open_tag(table);
    let rows = elements_ci(&body, &["tr"]);
    let cols = Columns::from_header(&cell_texts(rows.first()?))?;

    let mut out = Vec::new();
    for tr in &rows[1..] {
        let tds = elements_ci(tr, &["td"]);
        if tds.len() < cols.width() {
            continue;
        }
        let id = text_of(tds[cols.id]);
        if id.is_empty() {
            continue;
        }
        let cat_cell = tds[cols.category];
        let category = text_of(cat_cell);
        let subject = match cols.subject {
            Some(i) => text_of(tds[i]),
            None => elements_ci(cat_cell, &["a"])
                .first()
                .map(|a| text_of(a))
                .unwrap_or_else(|| category.clone()),
        };
        if subject.is_empty() && category.is_empty() {
            continue;
        }
        out.push(RawRow { id, date: text_of(tds[cols.date]), subject, category });
    }
    Some(out)
}

/// Parse the ticket rows of one list page. `page` names the page in errors.
///
/// A page without any ticket table is an empty page, unless it is a login page
/// (session lost), which is `TableNotFound`.
pub fn parse_page(doc: &str, page: &str) -> Result<Vec<PageRow>, ScanReadError> {
    let best = all_tables(doc)
        .into_iter()
        .filter_map(read_table)
        .max_by_key(|rows| rows.len());

    let Some(raw) = best else {
        if has_password_input(doc) {
            return Err(ScanReadError::TableNotFound { page: s!(page) });
        }
        debug!("TicketList: no ticket table on {page}; treating as empty");
        return Ok(Vec::new());
    };

    raw.into_iter()
        .map(|r| {
            let ts = require_timestamp(&r.id, &r.date)?;
            Ok(PageRow { id: r.id, timestamp: ts, subject: r.subject, category: r.category })
        })
        .collect()
}

/// `href` of the pagination anchor for `which`, if the page has one.
pub fn find_link(doc: &str, which: PageLink) -> Option<String> {
    let wanted = which.texts();
    let mut hits = elements_ci(doc, &["a"]).into_iter().filter_map(|a| {
        let text = to_lower(&squash_ws(&text_of(a)));
        if !wanted.contains(&text.as_str()) {
            return None;
        }
        attr_value(open_tag(a), "href").filter(|h| !h.trim().is_empty() && !h.trim_start().starts_with('#'))
    });
    match which {
        // The last "<"-ish anchor is the one next to the page numbers.
        PageLink::Previous => hits.last(),
        _ => hits.next(),
    }
}

static CALLS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)(\d+)\s+Calls\b").unwrap());

/// The `N Calls` count WonderDesk prints above a list.
pub fn calls_banner(doc: &str) -> Option<u64> {
    let text = text_of(doc);
    CALLS.captures(&text)?.get(1)?.as_str().parse().ok()
}

pub fn has_password_input(doc: &str) -> bool {
    open_tags_ci(doc, "input")
        .iter()
        .any(|t| attr_value(t, "type").is_some_and(|v| v.eq_ignore_ascii_case("password")))
}

/// What it takes to submit the login form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub action: Option<String>,
    pub user_field: Option<String>,
    pub password_field: Option<String>,
    /// Hidden inputs and named submit buttons, sent as-is.
    pub extra: Vec<(String, String)>,
}

/// The first form holding a password input.
pub fn login_form(doc: &str) -> Option<LoginForm> {
    let form = elements_ci(doc, &["form"]).into_iter().find(|f| has_password_input(f))?;
    let mut out = LoginForm { action: attr_value(open_tag(form), "action"), ..LoginForm::default() };

    for input in open_tags_ci(form, "input") {
        let kind = attr_value(input, "type").map(|t| to_lower(&t)).unwrap_or_else(|| s!("text"));
        let Some(name) = attr_value(input, "name").filter(|n| !n.is_empty()) else { continue };
        let value = attr_value(input, "value").unwrap_or_default();
        match kind.as_str() {
            "password" if out.password_field.is_none() => out.password_field = Some(name),
            "hidden" | "submit" => out.extra.push((name, value)),
            "text" | "email" => {
                let lname = to_lower(&name);
                let named_user = lname.contains("user") || lname.contains("login");
                if out.user_field.is_none() || named_user {
                    out.user_field = Some(name);
                }
            }
            _ => {}
        }
    }
    Some(out)
}
