//! Data sources and the per-session dataset handle.
//!
//! A [`Session`] owns its source and loads the dataset at most once, on first
//! use. Every filter then borrows the same immutable [`AttendanceDataset`].

use std::fmt;
use std::path::PathBuf;

use tokio::sync::OnceCell;
use tracing::info;

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::fetch::{BasicClient, RetryPolicy, fetch_with_retry};
use crate::models::AttendanceDataset;
use crate::parser::parse_attendance;

/// Where attendance records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// A local CSV file.
    File(PathBuf),
    /// An `http(s)` URL serving CSV, usually a spreadsheet export.
    Remote(String),
}

impl DataSource {
    /// Treats `http://` and `https://` arguments as remote, anything else as a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("http://") || arg.starts_with("https://") {
            DataSource::Remote(arg.to_string())
        } else {
            DataSource::File(PathBuf::from(arg))
        }
    }

    /// Reads and parses the full dataset.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Load`] if the source cannot be read or parsed.
    #[tracing::instrument(skip_all, fields(source = %self))]
    pub async fn load(&self, retry: RetryPolicy) -> Result<AttendanceDataset> {
        let bytes = match self {
            DataSource::File(path) => tokio::fs::read(path)
                .await
                .map_err(|e| DashboardError::Load(format!("{}: {e}", path.display())))?,
            DataSource::Remote(url) => {
                let client = BasicClient::new()?;
                fetch_with_retry(&client, url, retry).await?
            }
        };

        let dataset = parse_attendance(&bytes)?;
        info!(
            rows = dataset.len(),
            earliest = ?dataset.earliest_date(),
            latest = ?dataset.reference_date(),
            "Attendance data loaded"
        );
        Ok(dataset)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::File(path) => write!(f, "{}", path.display()),
            DataSource::Remote(url) => f.write_str(url),
        }
    }
}

/// A viewing session with a lazily loaded, immutable dataset.
pub struct Session {
    source: DataSource,
    retry: RetryPolicy,
    dataset: OnceCell<AttendanceDataset>,
}

impl Session {
    pub fn new(source: DataSource, retry: RetryPolicy) -> Self {
        Self {
            source,
            retry,
            dataset: OnceCell::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.source.clone(), config.retry)
    }

    /// Session over an already loaded dataset.
    pub fn with_dataset(source: DataSource, dataset: AttendanceDataset) -> Self {
        Self {
            source,
            retry: RetryPolicy::default(),
            dataset: OnceCell::from(dataset),
        }
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// Returns the dataset, loading it on the first call only.
    pub async fn dataset(&self) -> Result<&AttendanceDataset> {
        self.dataset
            .get_or_try_init(|| self.source.load(self.retry))
            .await
    }
}
