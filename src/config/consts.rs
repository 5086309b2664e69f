// src/config/consts.rs

// Net config
pub const DEFAULT_BASE_URL: &str = "https://helpdesk.grupoiris.net";
pub const CGI_PATH: &str = "wonderdesk.cgi";
pub const CLOSED_LIST_QUERY: &str = "do=hd_list&help_status=Closed";
pub const USER_AGENT: &str = "wd_scrape/0.4";
pub const REQUEST_TIMEOUT_SECS: u64 = 15;

// Login form
pub const LOGIN_USER_FIELD: &str = "username";
pub const LOGIN_PASSWORD_FIELD: &str = "password";

// Calendar days are counted in this zone
pub const TIMEZONE: chrono_tz::Tz = chrono_tz::Europe::Madrid;

// Local store
pub const LOG_FILE: &str = ".store/debug.log";

// Scan
pub const MAX_CLOSED_PAGES: usize = 200;
pub const MAX_OPEN_PAGES: usize = 500;
pub const SWEEP_TRAILING_DAYS: i64 = 7;

// Tags
pub const BUG_PREFIXES: &[&str] = &["DS"];

// Daily sheet
pub const DAILY_ROW_STRIDE: usize = 22;
pub const DAILY_HEADERS: [&str; 14] = [
    "Fecha", "AGENCIA", "Tickets Abiertos", "Tickets Cerrados",
    "Abiertos Última Semana", "Cerrados Última Semana",
    "DS", "P3", "Total", "LW total", "Δ Cerrados(-22)", "Semana", "Mes", "Año",
];

// Export
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DAILY_FILE: &str = "datos_daily.csv";
pub const SUMMARY_FILE: &str = "agencias_wonderdesk_stats.csv";
pub const TICKETS_FILE: &str = "tickets_wonderdesk.csv";
pub const DS_CROSS_FILE: &str = "ds_cross_agencies.csv";
pub const OPEN_TICKETS_PREFIX: &str = "open_tickets";

// Concurrency
pub const WORKERS: usize = 4;
pub const REQUEST_PAUSE_MS: u64 = 75; // be polite
pub const JITTER_MS: u64 = 50; // extra 0..50 ms
