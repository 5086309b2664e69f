// src/config/load.rs
//! Loading `AppOptions` from a TOML file or from the environment (`.env` aware).
//!
//! Environment scheme, shared by every run mode:
//! ```text
//! HELPDESK_BASE_URL=https://helpdesk.example.net
//! AGENCIES=AG1,AG2            # or COMPANY=AG1 for a single agency
//! AG1_NOMBRE=Agency One       # or AG1_NOM; defaults to the code
//! AG1_USUARIO=user            # or AG1_USERNAME
//! AG1_PASSWORD=secret
//! DAILY_ROW_STRIDE=22
//! WD_TIMEZONE=Europe/Madrid
//! BUG_PREFIXES=DS,IS
//! ```

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use super::options::{Agency, AppOptions};
use crate::error::ConfigError;

pub fn from_toml_file(path: &Path) -> Result<AppOptions, ConfigError> {
    let text = fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
    from_toml_str(&text).map_err(|e| match e {
        ConfigError::Parse { message, .. } => ConfigError::Parse { path: path.to_path_buf(), message },
        other => other,
    })
}

pub fn from_toml_str(text: &str) -> Result<AppOptions, ConfigError> {
    let mut opts: AppOptions = toml::from_str(text)
        .map_err(|e| ConfigError::Parse { path: Default::default(), message: e.to_string() })?;
    for a in &mut opts.agencies {
        a.code = a.code.trim().to_ascii_uppercase();
    }
    Ok(opts)
}

/// Load `.env` (explicit file, or the nearest one) into the process env, then read it.
pub fn from_env(env_file: Option<&Path>) -> Result<AppOptions, ConfigError> {
    match env_file {
        Some(p) => {
            dotenvy::from_path(p).map_err(|e| ConfigError::Parse {
                path: p.to_path_buf(),
                message: e.to_string(),
            })?;
        }
        None => {
            if let Ok(p) = dotenvy::dotenv() {
                debug!("Config: loaded {}", p.display());
            }
        }
    }
    from_vars(|k| std::env::var(k).ok())
}

/// Build options from any key → value source (the process env in production).
pub fn from_vars<F>(get: F) -> Result<AppOptions, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let mut opts = AppOptions::default();

    if let Some(url) = var("HELPDESK_BASE_URL") {
        opts.helpdesk.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(raw) = var("DAILY_ROW_STRIDE") {
        opts.patch.stride = raw
            .parse()
            .map_err(|_| ConfigError::Invalid { key: s!("DAILY_ROW_STRIDE"), value: raw.clone() })?;
    }
    if let Some(raw) = var("WD_TIMEZONE") {
        opts.timezone = raw
            .parse()
            .map_err(|_| ConfigError::Invalid { key: s!("WD_TIMEZONE"), value: raw.clone() })?;
    }
    if let Some(raw) = var("BUG_PREFIXES") {
        opts.scan.bug_prefixes = split_codes(&raw);
    }

    let codes = match var("AGENCIES") {
        Some(raw) => split_codes(&raw),
        None => match var("COMPANY") {
            Some(company) => vec![company.to_ascii_uppercase()],
            None => return Err(ConfigError::NoAgencies),
        },
    };

    for code in codes {
        let name = var(&format!("{code}_NOMBRE"))
            .or_else(|| var(&format!("{code}_NOM")))
            .unwrap_or_else(|| code.clone());
        let mut agency = Agency::new(&code, &name);
        agency.username = var(&format!("{code}_USUARIO")).or_else(|| var(&format!("{code}_USERNAME")));
        agency.password = var(&format!("{code}_PASSWORD"));
        if agency.credentials().is_none() {
            // Kept in the list: the run reports it as an auth failure for this agency.
            warn!(agency = %code, "Config: missing credentials");
        }
        opts.agencies.push(agency);
    }

    Ok(opts)
}

fn split_codes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|c| c.trim().to_ascii_uppercase())
        .filter(|c| !c.is_empty())
        .collect()
}
