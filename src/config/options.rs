// src/config/options.rs
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::Deserialize;

use super::consts::*;
use crate::error::ConfigError;

/// Immutable run configuration. Built once at start-up and passed by reference.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppOptions {
    pub helpdesk: HelpdeskOptions,
    pub agencies: Vec<Agency>,
    pub scan: ScanOptions,
    pub patch: PatchOptions,
    pub export: ExportOptions,
    /// Zone whose calendar decides "today" and the sweep's trailing window.
    pub timezone: Tz,
    pub workers: usize,
    pub pause_ms: u64,
    pub jitter_ms: u64,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            helpdesk: HelpdeskOptions::default(),
            agencies: Vec::new(),
            scan: ScanOptions::default(),
            patch: PatchOptions::default(),
            export: ExportOptions::default(),
            timezone: TIMEZONE,
            workers: WORKERS,
            pause_ms: REQUEST_PAUSE_MS,
            jitter_ms: JITTER_MS,
        }
    }
}

impl AppOptions {
    /// Checks that make a run meaningful. Called once after loading + CLI overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agencies.is_empty() {
            return Err(ConfigError::NoAgencies);
        }
        if self.patch.stride == 0 {
            return Err(ConfigError::ZeroStride);
        }
        if self.helpdesk.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid { key: s!("base_url"), value: s!() });
        }
        Ok(())
    }

    /// Wall-clock time in the configured zone.
    pub fn local_now(&self, now: DateTime<Utc>) -> NaiveDateTime {
        now.with_timezone(&self.timezone).naive_local()
    }

    /// Pause after each agency: base + deterministic jitter derived from its slot.
    pub fn pause_for(&self, slot: usize) -> Duration {
        let jitter = if self.jitter_ms == 0 { 0 } else { slot as u64 % self.jitter_ms };
        Duration::from_millis(self.pause_ms + jitter)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HelpdeskOptions {
    pub base_url: String,
    pub user_field: String,
    pub password_field: String,
    pub timeout_secs: u64,
}

impl Default for HelpdeskOptions {
    fn default() -> Self {
        Self {
            base_url: s!(DEFAULT_BASE_URL),
            user_field: s!(LOGIN_USER_FIELD),
            password_field: s!(LOGIN_PASSWORD_FIELD),
            timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl HelpdeskOptions {
    pub fn cgi_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), CGI_PATH)
    }
}

/// One client agency. `code` is the env key (`ACME` in `ACME_PASSWORD`),
/// `display_name` is what lands in the sheet.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Agency {
    pub code: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Agency {
    pub fn new(code: &str, display_name: &str) -> Self {
        Self {
            code: code.trim().to_ascii_uppercase(),
            display_name: s!(display_name),
            username: None,
            password: None,
        }
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = Some(s!(username));
        self.password = Some(s!(password));
        self
    }

    /// Display name, falling back to the code.
    pub fn name(&self) -> &str {
        if self.display_name.trim().is_empty() { &self.code } else { &self.display_name }
    }

    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => Some((u, p)),
            _ => None,
        }
    }
}

impl fmt::Debug for Agency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agency")
            .field("code", &self.code)
            .field("display_name", &self.display_name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub max_closed_pages: usize,
    pub max_open_pages: usize,
    pub sweep_days: i64,
    pub bug_prefixes: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_closed_pages: MAX_CLOSED_PAGES,
            max_open_pages: MAX_OPEN_PAGES,
            sweep_days: SWEEP_TRAILING_DAYS,
            bug_prefixes: BUG_PREFIXES.iter().map(|p| s!(*p)).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PatchOptions {
    pub enabled: bool,
    /// Rows back in the daily store (one row per agency per day), not days.
    pub stride: usize,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self { enabled: true, stride: DAILY_ROW_STRIDE }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub out_dir: PathBuf,
    pub daily_file: String,
    /// Delimiter for the report CSVs (the daily store is always ',').
    pub delim: char,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            daily_file: s!(DAILY_FILE),
            delim: ',',
        }
    }
}

impl ExportOptions {
    pub fn daily_path(&self) -> PathBuf {
        self.out_dir.join(&self.daily_file)
    }

    pub fn report_path(&self, file: &str) -> PathBuf {
        self.out_dir.join(file)
    }
}
