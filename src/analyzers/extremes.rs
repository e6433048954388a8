use std::fmt;

use serde::Serialize;

use crate::error::{DashboardError, Result};
use crate::models::{AttendanceRecord, Metric, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Extreme {
    Highest,
    Lowest,
}

impl fmt::Display for Extreme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extreme::Highest => f.write_str("highest"),
            Extreme::Lowest => f.write_str("lowest"),
        }
    }
}

/// Returns every row whose `metric` equals the subset's max (or min).
///
/// Ties are all returned, in input order.
///
/// # Errors
///
/// Returns [`DashboardError::EmptyInput`] when `rows` is empty.
pub fn find_extremes<'a, I>(rows: I, metric: Metric, extreme: Extreme) -> Result<Selection<'a>>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let rows: Vec<&'a AttendanceRecord> = rows.into_iter().collect();
    let values = rows.iter().map(|r| r.value(metric));
    let target = match extreme {
        Extreme::Highest => values.max(),
        Extreme::Lowest => values.min(),
    }
    .ok_or_else(|| {
        DashboardError::EmptyInput(format!("no services to find the {extreme} {metric}"))
    })?;

    Ok(rows
        .into_iter()
        .filter(|r| r.value(metric) == target)
        .collect())
}
