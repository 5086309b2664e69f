// src/specs/mod.rs
//! # Scraping “specs” module
//!
//! Page-specific readers for the helpdesk. Each spec knows *where the ground truth
//! lives in the HTML* of one kind of page and turns it into typed values.
//!
//! ## What lives here
//! - **Pure HTML parsing** of captured documents (no I/O): ticket rows, pagination
//!   anchors, the login form, the list's "N Calls" banner.
//! - **Selector choice & precedence** (e.g. the largest qualifying ticket table wins
//!   over layout tables; a `Subject` column beats the anchor inside `Category`).
//! - **Tolerant extraction** using `core::html` helpers (case-insensitive tag blocks,
//!   tag stripping, whitespace/entity normalization).
//!
//! ## What does **not** live here
//! - **Fetching and session state**: `session::HttpSession`.
//! - **Walking pages and stop rules**: `scan`.
//! - **Counting and aggregation**: `tags`, `metrics`.
//!
//! ## Typical call chain
//! ```text
//! runner → scan::PageScan → Navigator::read_current_page
//!                              ↘ HttpSession → specs::ticket_list::parse_page
//! ```
//!
//! ## Conventions & invariants
//! - **Case-insensitive** tag detection; no full-document regexes for structure.
//! - A row either parses into a `PageRow` or the page fails with a typed
//!   `ScanReadError`; nothing half-read escapes.
//!
//! ## Testing notes
//! - Specs are tested **offline** against inline HTML fixtures.
pub mod ticket_list;
