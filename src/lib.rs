// src/lib.rs

#[macro_use]
pub mod macros;

pub mod cli;
pub mod config;
pub mod core;
pub mod specs;

pub mod csv;
pub mod error;
pub mod file;
pub mod log;
pub mod metrics;
pub mod patch;
pub mod progress;
pub mod report;
pub mod runner;
pub mod scan;
pub mod session;
pub mod store;
pub mod tags;
pub mod ticket;
pub mod window;

pub use error::{Error, Result};
