// src/error.rs
//! Error taxonomy.
//!
//! - `InvalidDateError`: bad calendar input to the window calculator.
//! - `ScanReadError`: a page could not be fetched or read. Fatal for the agency's scan.
//! - `AuthError`: the agency session could not be opened.
//! - `ConfigError`: missing or malformed configuration.
//!
//! A historical lookup miss is *not* an error; see `patch::Lookup`.

use std::io;
use std::path::PathBuf;

/// Malformed or out-of-range date input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDateError {
    #[error("invalid date {input:?}: expected YYYY-MM-DD")]
    Malformed { input: String },

    #[error("date arithmetic out of range around {date}")]
    OutOfRange { date: String },
}

/// Failure while reading the remote paginated list.
#[derive(Debug, thiserror::Error)]
pub enum ScanReadError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("ticket table not found on {page}")]
    TableNotFound { page: String },

    #[error("ticket {id}: unreadable date {raw:?}")]
    BadDate { id: String, raw: String },

    #[error("pagination did not end within {limit} pages")]
    PageLimit { limit: usize },

    #[error("no list is open; call open_list first")]
    NoListOpen,
}

/// Failure to open an authenticated session for an agency.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{agency}: missing credentials (_USUARIO/_USERNAME and/or _PASSWORD)")]
    MissingCredentials { agency: String },

    #[error("{agency}: login rejected")]
    Rejected { agency: String },

    #[error("{agency}: login request failed: {message}")]
    Transport { agency: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no agencies configured (set AGENCIES=... or COMPANY=...)")]
    NoAgencies,

    #[error("stride must be a positive integer")]
    ZeroStride,

    #[error("cannot read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: String, value: String },
}

/// Crate-level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Date(#[from] InvalidDateError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Scan(#[from] ScanReadError),

    #[error("{path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("row store {path}: {message}")]
    Store { path: PathBuf, message: String },

    #[error("agency {agency} failed: {source}")]
    AgencyFailed { agency: String, source: Box<Error> },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
