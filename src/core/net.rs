// src/core/net.rs
// Blocking HTTP with a cookie jar. One client per agency session.

use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::{Client, Response};
use tracing::trace;

use crate::config::consts::USER_AGENT;
use crate::error::ScanReadError;

pub fn client(timeout_secs: u64) -> reqwest::Result<Client> {
    Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
}

fn transport(url: &str, e: reqwest::Error) -> ScanReadError {
    let message = if e.is_timeout() { format!("timed out ({e})") } else { e.to_string() };
    ScanReadError::Transport { url: s!(url), message }
}

fn body(url: &str, resp: Response) -> Result<String, ScanReadError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(ScanReadError::Status { url: s!(url), status: status.as_u16() });
    }
    let text = resp.text().map_err(|e| transport(url, e))?;
    trace!("Net: {url} → {} bytes", text.len());
    Ok(text)
}

pub fn http_get(client: &Client, url: &str) -> Result<String, ScanReadError> {
    let resp = client.get(url).send().map_err(|e| transport(url, e))?;
    body(url, resp)
}

pub fn http_post_form(client: &Client, url: &str, fields: &[(String, String)]) -> Result<String, ScanReadError> {
    let resp = client.post(url).form(fields).send().map_err(|e| transport(url, e))?;
    body(url, resp)
}

/// Resolve `href` against the page it was found on.
pub fn resolve(base: &str, href: &str) -> Result<String, ScanReadError> {
    let base = Url::parse(base).map_err(|e| ScanReadError::Transport { url: s!(base), message: e.to_string() })?;
    base.join(href.trim())
        .map(String::from)
        .map_err(|e| ScanReadError::Transport { url: s!(href), message: e.to_string() })
}
