//! Explicit date-set and special-service filters.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{AttendanceRecord, Selection};

/// Returns every record whose date is in `dates`, preserving input order.
///
/// Dates with no matching record are ignored.
pub fn filter_by_dates<'a, I>(rows: I, dates: &BTreeSet<NaiveDate>) -> Selection<'a>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let selection: Selection<'a> = rows.into_iter().filter(|r| dates.contains(&r.date)).collect();
    debug!(requested = dates.len(), rows = selection.len(), "Date set applied");
    selection
}

/// Partitions by the special-service tag: tagged services when
/// `include_special` is set, ordinary services otherwise.
pub fn filter_by_special<'a, I>(rows: I, include_special: bool) -> Selection<'a>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    rows.into_iter()
        .filter(|r| r.is_special() == include_special)
        .collect()
}

/// Checkbox variant: every record, or only tagged ones when `only_special` is set.
pub fn filter_special_present<'a, I>(rows: I, only_special: bool) -> Selection<'a>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    if only_special {
        filter_by_special(rows, true)
    } else {
        rows.into_iter().collect()
    }
}
