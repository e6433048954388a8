//! Runtime configuration.
//!
//! Values come from the process environment (the binary loads `.env` first).
//! Command-line flags take precedence over anything read here.

use std::time::Duration;

use crate::error::{DashboardError, Result};
use crate::fetch::{RetryPolicy, sheet_csv_url};
use crate::session::DataSource;

/// Local sheet used when nothing else is configured.
pub const DEFAULT_SOURCE: &str = "data/Attendance-Metrics.csv";

pub const DEFAULT_LOG_FILE: &str = "logs/attendance_dashboard.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub source: DataSource,
    pub retry: RetryPolicy,
    pub log_file_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    ///
    /// `ATTENDANCE_SOURCE` wins over `ATTENDANCE_SHEET_ID`; with neither set
    /// the default local file is used.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let source = match (get("ATTENDANCE_SOURCE"), get("ATTENDANCE_SHEET_ID")) {
            (Some(source), _) => DataSource::from_arg(&source),
            (None, Some(sheet_id)) => DataSource::Remote(sheet_csv_url(sheet_id.trim())),
            (None, None) => DataSource::from_arg(DEFAULT_SOURCE),
        };

        let defaults = RetryPolicy::default();
        let attempts = match get("FETCH_RETRIES") {
            Some(raw) => parse_number(&raw, "FETCH_RETRIES")?,
            None => defaults.attempts,
        };
        let delay = match get("FETCH_RETRY_DELAY_MS") {
            Some(raw) => Duration::from_millis(parse_number(&raw, "FETCH_RETRY_DELAY_MS")?),
            None => defaults.delay,
        };

        Ok(Self {
            source,
            retry: RetryPolicy { attempts, delay },
            log_file_path: get("LOG_FILE_PATH").unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        })
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        DashboardError::Config(format!("{key} must be a non-negative integer, got '{raw}'"))
    })
}
