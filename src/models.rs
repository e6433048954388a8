//! Attendance records and the immutable dataset they live in.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::error::DashboardError;

/// Tag value marking an ordinary (non-special) service.
pub const ORDINARY_SERVICE: &str = "No";

/// Day-granularity format used by the source sheet and the exported table.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// One row per service date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttendanceRecord {
    #[serde(rename = "Date", serialize_with = "serialize_day")]
    pub date: NaiveDate,
    #[serde(rename = "Members")]
    pub members: u32,
    #[serde(rename = "Guests")]
    pub guests: u32,
    #[serde(rename = "First Timers")]
    pub first_timers: u32,
    #[serde(rename = "2nd/3rd Timers")]
    pub second_third_timers: u32,
    #[serde(rename = "Children")]
    pub children: u32,
    #[serde(rename = "Total Check-in")]
    pub total_checkin: u32,
    #[serde(rename = "Special Sunday Service")]
    pub special_service_tag: String,
}

impl AttendanceRecord {
    /// Creates an ordinary-service record with every count at zero.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            members: 0,
            guests: 0,
            first_timers: 0,
            second_third_timers: 0,
            children: 0,
            total_checkin: 0,
            special_service_tag: ORDINARY_SERVICE.to_string(),
        }
    }

    pub fn is_special(&self) -> bool {
        self.special_service_tag != ORDINARY_SERVICE
    }

    /// Returns the count stored in the given column.
    pub fn value(&self, metric: Metric) -> u32 {
        match metric {
            Metric::Members => self.members,
            Metric::Guests => self.guests,
            Metric::FirstTimers => self.first_timers,
            Metric::SecondThirdTimers => self.second_third_timers,
            Metric::Children => self.children,
            Metric::TotalCheckin => self.total_checkin,
        }
    }
}

pub(crate) fn serialize_day<S: Serializer>(
    date: &NaiveDate,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&date.format(DATE_FORMAT))
}

/// Parses a `dd/mm/yyyy` date, also accepting ISO `yyyy-mm-dd`.
pub fn parse_day(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    NaiveDate::parse_from_str(input, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(input, "%Y-%m-%d"))
        .ok()
}

/// Numeric attendance columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Members,
    Guests,
    FirstTimers,
    SecondThirdTimers,
    Children,
    TotalCheckin,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Members,
        Metric::Guests,
        Metric::FirstTimers,
        Metric::SecondThirdTimers,
        Metric::Children,
        Metric::TotalCheckin,
    ];

    /// Column header as it appears in the source sheet.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::Members => "Members",
            Metric::Guests => "Guests",
            Metric::FirstTimers => "First Timers",
            Metric::SecondThirdTimers => "2nd/3rd Timers",
            Metric::Children => "Children",
            Metric::TotalCheckin => "Total Check-in",
        }
    }

    fn snake_name(&self) -> &'static str {
        match self {
            Metric::Members => "members",
            Metric::Guests => "guests",
            Metric::FirstTimers => "first_timers",
            Metric::SecondThirdTimers => "second_third_timers",
            Metric::Children => "children",
            Metric::TotalCheckin => "total_checkin",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Metric {
    type Err = DashboardError;

    /// Accepts either the sheet header (case-insensitive) or the snake_case name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Metric::ALL
            .into_iter()
            .find(|m| m.column().eq_ignore_ascii_case(wanted) || m.snake_name() == wanted)
            .ok_or_else(|| DashboardError::Validation(format!("unknown column '{wanted}'")))
    }
}

/// Attendance records ordered by date ascending. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct AttendanceDataset {
    records: Vec<AttendanceRecord>,
}

impl AttendanceDataset {
    /// Builds a dataset, stably sorting the records by date.
    pub fn new(mut records: Vec<AttendanceRecord>) -> Self {
        records.sort_by_key(|r| r.date);
        Self { records }
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AttendanceRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Latest date in the dataset; the anchor for every relative window.
    pub fn reference_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    pub fn earliest_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    /// Every record, as a selection.
    pub fn all(&self) -> Selection<'_> {
        self.records.iter().collect()
    }
}

impl<'a> IntoIterator for &'a AttendanceDataset {
    type Item = &'a AttendanceRecord;
    type IntoIter = std::slice::Iter<'a, AttendanceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// An order-preserving subset of a dataset, borrowed from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection<'a> {
    records: Vec<&'a AttendanceRecord>,
}

impl<'a> Selection<'a> {
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, &'a AttendanceRecord>> {
        self.records.iter().copied()
    }

    pub fn records(&self) -> &[&'a AttendanceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.records.iter().map(|r| r.date).collect()
    }
}

impl Serialize for Selection<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records.iter())
    }
}

impl<'a> FromIterator<&'a AttendanceRecord> for Selection<'a> {
    fn from_iter<I: IntoIterator<Item = &'a AttendanceRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for Selection<'a> {
    type Item = &'a AttendanceRecord;
    type IntoIter = std::vec::IntoIter<&'a AttendanceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a, 'b> IntoIterator for &'b Selection<'a> {
    type Item = &'a AttendanceRecord;
    type IntoIter = std::iter::Copied<std::slice::Iter<'b, &'a AttendanceRecord>>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32, m: u32, y: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_dataset_sorts_by_date() {
        let dataset = AttendanceDataset::new(vec![
            AttendanceRecord::new(day(14, 1, 2024)),
            AttendanceRecord::new(day(7, 1, 2024)),
            AttendanceRecord::new(day(21, 1, 2024)),
        ]);

        assert_eq!(
            dataset.all().dates(),
            vec![day(7, 1, 2024), day(14, 1, 2024), day(21, 1, 2024)]
        );
        assert_eq!(dataset.reference_date(), Some(day(21, 1, 2024)));
        assert_eq!(dataset.earliest_date(), Some(day(7, 1, 2024)));
    }

    #[test]
    fn test_empty_dataset_has_no_reference_date() {
        let dataset = AttendanceDataset::default();
        assert!(dataset.reference_date().is_none());
        assert!(dataset.all().is_empty());
    }

    #[test]
    fn test_parse_day_formats() {
        assert_eq!(parse_day("01/04/2024"), Some(day(1, 4, 2024)));
        assert_eq!(parse_day(" 2024-04-01 "), Some(day(1, 4, 2024)));
        assert_eq!(parse_day("April 1"), None);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("First Timers".parse::<Metric>().unwrap(), Metric::FirstTimers);
        assert_eq!("2nd/3rd timers".parse::<Metric>().unwrap(), Metric::SecondThirdTimers);
        assert_eq!("total_checkin".parse::<Metric>().unwrap(), Metric::TotalCheckin);
        assert!(matches!(
            "Pastors".parse::<Metric>(),
            Err(DashboardError::Validation(_))
        ));
    }

    #[test]
    fn test_special_tag() {
        let mut record = AttendanceRecord::new(day(24, 12, 2023));
        assert!(!record.is_special());
        record.special_service_tag = "Christmas".to_string();
        assert!(record.is_special());
    }

    #[test]
    fn test_record_serializes_with_sheet_headers() {
        let mut buf = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut buf);
            writer.serialize(AttendanceRecord::new(day(5, 2, 2024))).unwrap();
            writer.flush().unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Members,Guests,First Timers,2nd/3rd Timers,Children,Total Check-in,Special Sunday Service"
        );
        assert_eq!(lines.next().unwrap(), "05/02/2024,0,0,0,0,0,0,No");
    }
}
