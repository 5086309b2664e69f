// src/session.rs
//! Authenticated helpdesk sessions.
//!
//! `Connector` opens one `Navigator` per agency. `HttpConnector` logs in with the
//! WonderDesk form and hands back an `HttpSession` that walks list pages over HTTP.

use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::config::consts::CLOSED_LIST_QUERY;
use crate::config::options::{Agency, HelpdeskOptions};
use crate::core::net::{self, http_get, http_post_form};
use crate::error::{AuthError, ScanReadError};
use crate::scan::{Navigator, TicketList};
use crate::specs::ticket_list::{self, PageLink};
use crate::ticket::PageRow;

/// Opens an authenticated session for an agency.
pub trait Connector: Sync {
    fn connect(&self, agency: &Agency) -> Result<Box<dyn Navigator + Send>, AuthError>;
}

pub struct HttpConnector {
    helpdesk: HelpdeskOptions,
}

impl HttpConnector {
    pub fn new(helpdesk: &HelpdeskOptions) -> Self {
        Self { helpdesk: helpdesk.clone() }
    }

    fn login_fields(&self, doc: &str, user: &str, pass: &str) -> (Option<String>, Vec<(String, String)>) {
        let form = ticket_list::login_form(doc).unwrap_or_default();
        let user_field = form.user_field.unwrap_or_else(|| self.helpdesk.user_field.clone());
        let password_field = form.password_field.unwrap_or_else(|| self.helpdesk.password_field.clone());
        let mut fields = form.extra;
        fields.push((user_field, s!(user)));
        fields.push((password_field, s!(pass)));
        (form.action, fields)
    }
}

impl Connector for HttpConnector {
    fn connect(&self, agency: &Agency) -> Result<Box<dyn Navigator + Send>, AuthError> {
        let code = || agency.code.clone();
        let (user, pass) = agency
            .credentials()
            .ok_or_else(|| AuthError::MissingCredentials { agency: code() })?;
        let transport = |e: ScanReadError| AuthError::Transport { agency: code(), message: e.to_string() };

        let client = net::client(self.helpdesk.timeout_secs)
            .map_err(|e| AuthError::Transport { agency: code(), message: e.to_string() })?;
        let home = self.helpdesk.cgi_url();

        let landing = http_get(&client, &home).map_err(transport)?;
        let (action, fields) = self.login_fields(&landing, user, pass);
        let target = match action.filter(|a| !a.trim().is_empty()) {
            Some(a) => net::resolve(&home, &a).map_err(transport)?,
            None => home.clone(),
        };
        debug!(agency = %agency.code, "Session: POST login to {target}");
        let after = http_post_form(&client, &target, &fields).map_err(transport)?;

        if ticket_list::has_password_input(&after) {
            return Err(AuthError::Rejected { agency: code() });
        }
        info!(agency = %agency.code, "Session: logged in");
        Ok(Box::new(HttpSession::new(client, home)))
    }
}

/// One logged-in agency session positioned on a list page.
pub struct HttpSession {
    client: Client,
    cgi_url: String,
    url: Option<String>,
    doc: Option<String>,
}

impl HttpSession {
    pub fn new(client: Client, cgi_url: String) -> Self {
        Self { client, cgi_url, url: None, doc: None }
    }

    fn load(&mut self, url: String) -> Result<(), ScanReadError> {
        let doc = http_get(&self.client, &url)?;
        self.url = Some(url);
        self.doc = Some(doc);
        Ok(())
    }

    fn follow(&mut self, which: PageLink) -> Result<bool, ScanReadError> {
        let (Some(url), Some(doc)) = (self.url.as_deref(), self.doc.as_deref()) else {
            return Err(ScanReadError::NoListOpen);
        };
        let Some(href) = ticket_list::find_link(doc, which) else {
            return Ok(false);
        };
        let target = net::resolve(url, &href)?;
        if target == url {
            // "last" on the last page links to itself
            return Ok(false);
        }
        debug!("Session: {which:?} → {target}");
        self.load(target)?;
        Ok(true)
    }
}

impl Navigator for HttpSession {
    fn open_list(&mut self, list: TicketList) -> Result<(), ScanReadError> {
        let url = match list {
            TicketList::Open => self.cgi_url.clone(),
            TicketList::Closed => format!("{}?{}", self.cgi_url, CLOSED_LIST_QUERY),
        };
        self.load(url)
    }

    fn goto_last_page(&mut self) -> Result<bool, ScanReadError> {
        self.follow(PageLink::Last)
    }

    fn next_page(&mut self) -> Result<bool, ScanReadError> {
        self.follow(PageLink::Next)
    }

    fn previous_page(&mut self) -> Result<bool, ScanReadError> {
        self.follow(PageLink::Previous)
    }

    fn read_current_page(&mut self) -> Result<Vec<PageRow>, ScanReadError> {
        let (Some(url), Some(doc)) = (self.url.as_deref(), self.doc.as_deref()) else {
            return Err(ScanReadError::NoListOpen);
        };
        ticket_list::parse_page(doc, url)
    }

    fn list_total(&mut self) -> Result<Option<u64>, ScanReadError> {
        let doc = self.doc.as_deref().ok_or(ScanReadError::NoListOpen)?;
        Ok(ticket_list::calls_banner(doc))
    }
}
