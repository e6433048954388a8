//! Named time windows, anchored on the dataset's latest service date.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::error::DashboardError;
use crate::models::{AttendanceDataset, Selection};

/// Inclusive `[start, end]` date bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Calendar quarters of a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Bounds of this quarter in `year`. `None` only for years chrono cannot represent.
    pub fn window(self, year: i32) -> Option<DateWindow> {
        let (first_month, last_month, last_day) = match self {
            Quarter::Q1 => (1, 3, 31),
            Quarter::Q2 => (4, 6, 30),
            Quarter::Q3 => (7, 9, 30),
            Quarter::Q4 => (10, 12, 31),
        };
        Some(DateWindow {
            start: NaiveDate::from_ymd_opt(year, first_month, 1)?,
            end: NaiveDate::from_ymd_opt(year, last_month, last_day)?,
        })
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quarter::Q1 => "Q1",
            Quarter::Q2 => "Q2",
            Quarter::Q3 => "Q3",
            Quarter::Q4 => "Q4",
        };
        f.write_str(name)
    }
}

impl FromStr for Quarter {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "q1" | "1" | "first quarter" => Ok(Quarter::Q1),
            "q2" | "2" | "second quarter" => Ok(Quarter::Q2),
            "q3" | "3" | "third quarter" => Ok(Quarter::Q3),
            "q4" | "4" | "fourth quarter" => Ok(Quarter::Q4),
            other => Err(DashboardError::Validation(format!(
                "unknown quarter '{other}' (expected Q1-Q4)"
            ))),
        }
    }
}

/// Time ranges offered by the range selector.
///
/// Only the first three quarters are offered here; the fourth is available
/// to quarter comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TimeRange {
    Last3Months,
    Last6Months,
    FirstQuarter,
    SecondQuarter,
    ThirdQuarter,
    AllTime,
}

impl TimeRange {
    pub const ALL: [TimeRange; 6] = [
        TimeRange::Last3Months,
        TimeRange::Last6Months,
        TimeRange::FirstQuarter,
        TimeRange::SecondQuarter,
        TimeRange::ThirdQuarter,
        TimeRange::AllTime,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::Last3Months => "Last 3 months",
            TimeRange::Last6Months => "Last 6 months",
            TimeRange::FirstQuarter => "First quarter",
            TimeRange::SecondQuarter => "Second quarter",
            TimeRange::ThirdQuarter => "Third quarter",
            TimeRange::AllTime => "All time",
        }
    }

    /// Legacy keyword handling: anything unrecognized means "All time".
    pub fn parse_lenient(keyword: &str) -> Self {
        keyword.parse().unwrap_or(TimeRange::AllTime)
    }

    /// Computes the bounds for this range over `dataset`, or `None` if it is empty.
    pub fn window(&self, dataset: &AttendanceDataset) -> Option<DateWindow> {
        let end = dataset.reference_date()?;
        let window = match self {
            TimeRange::Last3Months => DateWindow {
                start: end.checked_sub_months(Months::new(3))?,
                end,
            },
            TimeRange::Last6Months => DateWindow {
                start: end.checked_sub_months(Months::new(6))?,
                end,
            },
            TimeRange::FirstQuarter => Quarter::Q1.window(end.year())?,
            TimeRange::SecondQuarter => Quarter::Q2.window(end.year())?,
            TimeRange::ThirdQuarter => Quarter::Q3.window(end.year())?,
            TimeRange::AllTime => DateWindow {
                start: dataset.earliest_date()?,
                end,
            },
        };
        Some(window)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeRange {
    type Err = DashboardError;

    /// Accepts the selector labels (case-insensitive) and short aliases
    /// such as `3m`, `q2` or `all`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if let Some(range) = TimeRange::ALL
            .into_iter()
            .find(|r| r.label().to_ascii_lowercase() == wanted)
        {
            return Ok(range);
        }
        match wanted.as_str() {
            "3m" | "last-3-months" => Ok(TimeRange::Last3Months),
            "6m" | "last-6-months" => Ok(TimeRange::Last6Months),
            "q1" => Ok(TimeRange::FirstQuarter),
            "q2" => Ok(TimeRange::SecondQuarter),
            "q3" => Ok(TimeRange::ThirdQuarter),
            "all" | "all-time" => Ok(TimeRange::AllTime),
            _ => Err(DashboardError::Validation(format!(
                "unsupported time range '{}'",
                s.trim()
            ))),
        }
    }
}

/// Returns the records whose date falls inside `range`, in dataset order.
///
/// An empty dataset yields an empty selection.
pub fn filter_by_time_range(dataset: &AttendanceDataset, range: TimeRange) -> Selection<'_> {
    let Some(window) = range.window(dataset) else {
        return Selection::default();
    };

    let selection: Selection<'_> = dataset.iter().filter(|r| window.contains(r.date)).collect();
    debug!(
        range = %range,
        start = %window.start,
        end = %window.end,
        rows = selection.len(),
        "Time range applied"
    );
    selection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttendanceRecord;

    fn day(d: u32, m: u32, y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn weekly_dataset() -> AttendanceDataset {
        // Sundays from 07/01/2024 through 29/12/2024
        let mut date = day(7, 1, 2024);
        let mut records = Vec::new();
        while date.year() == 2024 {
            records.push(AttendanceRecord::new(date));
            date += chrono::Duration::weeks(1);
        }
        AttendanceDataset::new(records)
    }

    #[test]
    fn test_first_quarter_scenario() {
        let dataset = AttendanceDataset::new(vec![
            AttendanceRecord::new(day(1, 1, 2024)),
            AttendanceRecord::new(day(1, 4, 2024)),
        ]);

        let selection = filter_by_time_range(&dataset, TimeRange::FirstQuarter);
        assert_eq!(selection.dates(), vec![day(1, 1, 2024)]);
    }

    #[test]
    fn test_quarter_end_is_not_clipped_to_reference() {
        let dataset = AttendanceDataset::new(vec![AttendanceRecord::new(day(10, 2, 2024))]);
        let window = TimeRange::FirstQuarter.window(&dataset).unwrap();
        assert_eq!(window.end, day(31, 3, 2024));
    }

    #[test]
    fn test_last_months_are_relative_to_reference_date() {
        let dataset = weekly_dataset();
        let reference = dataset.reference_date().unwrap();
        assert_eq!(reference, day(29, 12, 2024));

        let window = TimeRange::Last3Months.window(&dataset).unwrap();
        assert_eq!(window.start, day(29, 9, 2024));

        let window = TimeRange::Last6Months.window(&dataset).unwrap();
        assert_eq!(window.start, day(29, 6, 2024));
    }

    #[test]
    fn test_month_subtraction_clamps_to_month_end() {
        let dataset = AttendanceDataset::new(vec![AttendanceRecord::new(day(31, 5, 2024))]);
        let window = TimeRange::Last3Months.window(&dataset).unwrap();
        assert_eq!(window.start, day(29, 2, 2024));
    }

    #[test]
    fn test_every_range_returns_ordered_subset_within_bounds() {
        let dataset = weekly_dataset();

        for range in TimeRange::ALL {
            let window = range.window(&dataset).unwrap();
            let selection = filter_by_time_range(&dataset, range);

            assert!(!selection.is_empty(), "{range} selected nothing");
            assert!(selection.iter().all(|r| window.contains(r.date)));
            assert!(selection.dates().windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_all_time_covers_everything() {
        let dataset = weekly_dataset();
        let selection = filter_by_time_range(&dataset, TimeRange::AllTime);
        assert_eq!(selection.len(), dataset.len());
    }

    #[test]
    fn test_empty_dataset_yields_empty_selection() {
        let dataset = AttendanceDataset::default();
        for range in TimeRange::ALL {
            assert!(filter_by_time_range(&dataset, range).is_empty());
        }
    }

    #[test]
    fn test_range_parsing() {
        assert_eq!("Last 3 months".parse::<TimeRange>().unwrap(), TimeRange::Last3Months);
        assert_eq!("second QUARTER".parse::<TimeRange>().unwrap(), TimeRange::SecondQuarter);
        assert_eq!("all".parse::<TimeRange>().unwrap(), TimeRange::AllTime);
        assert!("Fourth quarter".parse::<TimeRange>().is_err());
        assert!("Last 1 year".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_lenient_parsing_falls_back_to_all_time() {
        assert_eq!(TimeRange::parse_lenient("Last 1 year"), TimeRange::AllTime);
        assert_eq!(TimeRange::parse_lenient("Third quarter"), TimeRange::ThirdQuarter);
    }

    #[test]
    fn test_quarter_windows() {
        let q4 = Quarter::Q4.window(2024).unwrap();
        assert_eq!(q4.start, day(1, 10, 2024));
        assert_eq!(q4.end, day(31, 12, 2024));
        assert_eq!("q2".parse::<Quarter>().unwrap(), Quarter::Q2);
        assert!("Q5".parse::<Quarter>().is_err());
    }
}
