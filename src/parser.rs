//! CSV parser for attendance sheets.
//!
//! Both the local file and the spreadsheet export arrive as CSV bytes, so a
//! single parser normalizes them into an [`AttendanceDataset`].

use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::error::{DashboardError, Result};
use crate::models::{AttendanceDataset, AttendanceRecord, ORDINARY_SERVICE, parse_day};

const DATE_COLUMN: &str = "Date";

/// A single sheet row as it appears on the wire.
#[derive(Debug, Deserialize)]
struct SheetRow {
    #[serde(rename = "Date", default)]
    date: Option<String>,
    #[serde(rename = "Members", default, deserialize_with = "count")]
    members: u32,
    #[serde(rename = "Guests", default, deserialize_with = "count")]
    guests: u32,
    #[serde(rename = "First Timers", default, deserialize_with = "count")]
    first_timers: u32,
    #[serde(rename = "2nd/3rd Timers", default, deserialize_with = "count")]
    second_third_timers: u32,
    #[serde(rename = "Children", default, deserialize_with = "count")]
    children: u32,
    #[serde(rename = "Total Check-in", default, deserialize_with = "count")]
    total_checkin: u32,
    #[serde(rename = "Special Sunday Service", default)]
    special_service: Option<String>,
}

fn count<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map(normalize_count).unwrap_or(0))
}

/// Converts a raw cell into a count. Blank or unreadable cells become zero.
pub fn normalize_count(raw: &str) -> u32 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0;
    }
    if let Ok(value) = trimmed.parse::<u32>() {
        return value;
    }

    // Sheets exports may carry thousands separators or float-formatted counts
    match trimmed.replace(',', "").parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => value.round() as u32,
        _ => {
            warn!(value = trimmed, "Unreadable count, treating as zero");
            0
        }
    }
}

/// Decodes CSV bytes into a date-ordered [`AttendanceDataset`].
///
/// Header names are trimmed and matched regardless of column order; extra
/// columns are ignored. Rows with a blank `Date` are skipped.
///
/// # Errors
///
/// Returns [`DashboardError::Load`] if the CSV is malformed, the header row
/// has no `Date` column, or a date is not `dd/mm/yyyy`.
pub fn parse_attendance(bytes: &[u8]) -> Result<AttendanceDataset> {
    let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(bytes);
    let headers = reader.headers()?;
    if !headers.is_empty() && !headers.iter().any(|h| h == DATE_COLUMN) {
        return Err(DashboardError::Load(format!("missing '{DATE_COLUMN}' column")));
    }
    let mut records = Vec::new();

    for (index, result) in reader.deserialize::<SheetRow>().enumerate() {
        let row = result?;
        // header is line 1
        let line = index + 2;

        let Some(raw_date) = row.date.as_deref().filter(|d| !d.is_empty()) else {
            debug!(line, "Skipping row without a date");
            continue;
        };
        let date = parse_day(raw_date).ok_or_else(|| {
            DashboardError::Load(format!("line {line}: invalid date '{raw_date}'"))
        })?;

        // a blank tag is an ordinary service, not a special one
        let special_service_tag = row
            .special_service
            .filter(|tag| !tag.is_empty())
            .unwrap_or_else(|| ORDINARY_SERVICE.to_string());

        records.push(AttendanceRecord {
            date,
            members: row.members,
            guests: row.guests,
            first_timers: row.first_timers,
            second_third_timers: row.second_third_timers,
            children: row.children,
            total_checkin: row.total_checkin,
            special_service_tag,
        });
    }

    debug!(rows = records.len(), "Attendance sheet parsed");
    Ok(AttendanceDataset::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_empty_bytes_returns_empty_dataset() {
        let dataset = parse_attendance(b"").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_parse_reordered_columns_and_blanks() {
        let csv = "\
Special Sunday Service, Date ,Members,Guests,First Timers,2nd/3rd Timers,Children,Total Check-in
Easter,31/03/2024,120,,4,2,10,140
,07/04/2024,100,5,,1,8,
";
        let dataset = parse_attendance(csv.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);

        let easter = &dataset.records()[0];
        assert_eq!(easter.date, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert_eq!(easter.members, 120);
        assert_eq!(easter.guests, 0);
        assert_eq!(easter.special_service_tag, "Easter");

        let ordinary = &dataset.records()[1];
        assert_eq!(ordinary.first_timers, 0);
        assert_eq!(ordinary.total_checkin, 0);
        assert_eq!(ordinary.special_service_tag, ORDINARY_SERVICE);
    }

    #[test]
    fn test_parse_missing_optional_columns() {
        let csv = "Date,Members\n14/01/2024,80\n";
        let dataset = parse_attendance(csv.as_bytes()).unwrap();
        let record = &dataset.records()[0];
        assert_eq!(record.members, 80);
        assert_eq!(record.children, 0);
        assert!(!record.is_special());
    }

    #[test]
    fn test_parse_skips_blank_trailing_rows() {
        let csv = "Date,Members\n14/01/2024,80\n,\n";
        let dataset = parse_attendance(csv.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_parse_invalid_date() {
        let csv = "Date,Members\n2024/13/45,80\n";
        let result = parse_attendance(csv.as_bytes());
        assert!(matches!(result, Err(DashboardError::Load(ref msg)) if msg.contains("line 2")));
    }

    #[test]
    fn test_parse_missing_date_column() {
        let csv = "Service Date,Members\n07/01/2024,200\n";
        let result = parse_attendance(csv.as_bytes());
        assert!(matches!(result, Err(DashboardError::Load(ref msg)) if msg.contains("'Date'")));
    }

    #[test]
    fn test_parse_header_only_sheet() {
        let dataset = parse_attendance(b"Date,Members,Guests\n").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_parse_blank_tag_is_not_special() {
        let csv = "Date,Special Sunday Service\n07/01/2024,\n14/01/2024,  \n";
        let dataset = parse_attendance(csv.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(dataset.iter().all(|r| !r.is_special()));
    }

    #[test]
    fn test_normalize_count() {
        assert_eq!(normalize_count(""), 0);
        assert_eq!(normalize_count(" 12 "), 12);
        assert_eq!(normalize_count("12.0"), 12);
        assert_eq!(normalize_count("1,200"), 1200);
        assert_eq!(normalize_count("n/a"), 0);
        assert_eq!(normalize_count("-3"), 0);
    }
}
