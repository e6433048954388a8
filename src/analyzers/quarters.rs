use std::collections::{BTreeMap, BTreeSet};

use chrono::Datelike;
use tracing::debug;

use crate::analyzers::window::Quarter;
use crate::error::{DashboardError, Result};
use crate::models::AttendanceDataset;
use crate::stats::MetricsSummary;

/// Minimum number of quarters a comparison needs.
pub const MIN_QUARTERS: usize = 2;

/// Summarizes each requested quarter of the reference year over the full dataset.
///
/// # Errors
///
/// Returns [`DashboardError::Validation`] when fewer than [`MIN_QUARTERS`]
/// quarters are requested.
pub fn compare_quarters(
    dataset: &AttendanceDataset,
    quarters: &BTreeSet<Quarter>,
) -> Result<BTreeMap<Quarter, MetricsSummary>> {
    if quarters.len() < MIN_QUARTERS {
        return Err(DashboardError::Validation(
            "select at least two quarters".to_string(),
        ));
    }

    let year = dataset.reference_date().map(|d| d.year());
    let mut comparison = BTreeMap::new();

    for &quarter in quarters {
        let summary = match year.and_then(|y| quarter.window(y)) {
            Some(window) => {
                MetricsSummary::from_records(dataset.iter().filter(|r| window.contains(r.date)))
            }
            None => MetricsSummary::default(),
        };
        debug!(
            quarter = %quarter,
            first_timers = summary.first_timers,
            retained = summary.second_third_timers,
            "Quarter summarized"
        );
        comparison.insert(quarter, summary);
    }

    Ok(comparison)
}
