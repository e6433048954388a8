//! Rendering for the command-line dashboard.
//!
//! Supports plain-text panels, JSON, and CSV tables.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs::File;
use std::io;
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;
use tracing::debug;

use crate::analyzers::Quarter;
use crate::error::Result;
use crate::models::{DATE_FORMAT, Metric, Selection};
use crate::stats::MetricsSummary;

/// Logs any value using Rust's debug pretty-print format.
pub fn print_pretty<T: std::fmt::Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Serializes a value as pretty-printed JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Attendance metrics panel plus the retention breakdown.
pub fn render_summary(title: &str, summary: &MetricsSummary) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## {title}");
    let _ = writeln!(output, "Services: {}", summary.services);
    for (metric, total) in summary.totals() {
        let _ = writeln!(output, "- {}: {}", metric, total);
    }

    let retention = summary.retention();
    let _ = writeln!(output);
    let _ = writeln!(output, "## First Timers Retention Rate");
    let _ = writeln!(
        output,
        "Retained: {} / Not retained: {} ({:.1}%)",
        retention.retained, retention.not_retained, retention.retention_rate
    );

    output
}

/// Side-by-side retention figures for each compared quarter.
pub fn render_comparison(comparison: &BTreeMap<Quarter, MetricsSummary>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Quarter Comparison");
    let _ = writeln!(
        output,
        "{:<8}{:>14}{:>16}{:>12}",
        "Quarter",
        Metric::FirstTimers.column(),
        Metric::SecondThirdTimers.column(),
        "Retention"
    );
    for (quarter, summary) in comparison {
        let _ = writeln!(
            output,
            "{:<8}{:>14}{:>16}{:>11.1}%",
            quarter.to_string(),
            summary.first_timers,
            summary.second_third_timers,
            summary.retention_rate
        );
    }

    output
}

/// One line per selected service, with the value of `metric` highlighted.
pub fn render_rows(selection: &Selection<'_>, metric: Metric) -> String {
    let mut output = String::new();
    for record in selection {
        let _ = write!(
            output,
            "- {}: {} {}",
            record.date.format(DATE_FORMAT),
            record.value(metric),
            metric
        );
        if record.is_special() {
            let _ = write!(output, " ({})", record.special_service_tag);
        }
        let _ = writeln!(output);
    }
    output
}

/// Writes rows as CSV with a header line.
pub fn write_csv<W, T, I>(writer: W, rows: I) -> Result<()>
where
    W: io::Write,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the selected records to a CSV file, replacing any existing file.
pub fn write_table_file(path: &Path, selection: &Selection<'_>) -> Result<()> {
    debug!(path = %path.display(), rows = selection.len(), "Writing attendance table");
    let file = File::create(path)?;
    write_csv(file, selection.iter())
}
