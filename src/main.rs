//! CLI entry point for the attendance dashboard.
//!
//! Each subcommand maps one dashboard control (range selector, date picker,
//! special-service checkbox, extremes dropdown, quarter multi-select) onto the
//! library's filters and renders the result as text, JSON, or CSV.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use attendance_dashboard::analyzers::{
    DateWindow, Extreme, Quarter, TimeRange, compare_quarters, filter_by_dates, filter_by_special,
    filter_by_time_range, filter_special_present, find_extremes,
};
use attendance_dashboard::config::Config;
use attendance_dashboard::error::DashboardError;
use attendance_dashboard::models::{Metric, Selection, parse_day};
use attendance_dashboard::output::{
    print_pretty, render_comparison, render_rows, render_summary, to_json, write_csv,
    write_table_file,
};
use attendance_dashboard::session::{DataSource, Session};
use attendance_dashboard::stats::{MetricsSummary, RetentionBreakdown, trend};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "attendance_dashboard")]
#[command(about = "Weekly church attendance metrics, trends and comparisons", long_about = None)]
struct Cli {
    /// CSV file or http(s) URL to read (overrides ATTENDANCE_SOURCE)
    #[arg(short, long, global = true, value_name = "FILE_OR_URL")]
    source: Option<String>,

    /// Print JSON instead of text panels
    #[arg(long, global = true, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Attendance metrics and retention rate for a time range
    Summary {
        #[arg(short, long, default_value = "Last 3 months")]
        range: TimeRange,
    },
    /// Services on specific dates
    Dates {
        /// Service dates (dd/mm/yyyy), repeatable
        #[arg(short, long = "date", required = true, num_args = 1.., value_parser = parse_date_arg)]
        dates: Vec<NaiveDate>,
    },
    /// Services split by the Special Sunday Service tag
    Special {
        /// Show only ordinary (untagged) services
        #[arg(long, default_value_t = false, conflicts_with = "only")]
        ordinary: bool,

        /// Show only tagged special services (every service otherwise)
        #[arg(long, default_value_t = false)]
        only: bool,

        #[arg(short, long, default_value = "All time")]
        range: TimeRange,
    },
    /// Services with the highest or lowest value in a column
    Extremes {
        /// Column name, e.g. "First Timers"
        #[arg(short, long)]
        column: Metric,

        /// Find the minimum instead of the maximum
        #[arg(long, default_value_t = false)]
        lowest: bool,

        #[arg(short, long, default_value = "All time")]
        range: TimeRange,
    },
    /// Compare retention across quarters of the latest year
    Compare {
        /// Quarters to compare (Q1-Q4), at least two
        #[arg(short, long = "quarter", num_args = 1..)]
        quarters: Vec<Quarter>,
    },
    /// Export the attendance table as CSV
    Table {
        #[arg(short, long, default_value = "Last 3 months")]
        range: TimeRange,

        /// File to write instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Members, Guests and First Timers per service as CSV
    Trend {
        #[arg(short, long, default_value = "Last 3 months")]
        range: TimeRange,
    },
}

fn parse_date_arg(raw: &str) -> std::result::Result<NaiveDate, String> {
    parse_day(raw).ok_or_else(|| format!("'{raw}' is not a dd/mm/yyyy date"))
}

#[derive(Serialize)]
struct SummaryReport<'a> {
    range: &'a str,
    window: Option<DateWindow>,
    summary: MetricsSummary,
    retention: RetentionBreakdown,
}

#[derive(Serialize)]
struct QuarterReport {
    first_timers: u64,
    second_third_timers: u64,
    retention_rate: f64,
}

#[derive(Serialize)]
struct RowsReport<'a> {
    rows: &'a Selection<'a>,
    summary: MetricsSummary,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();
    let mut config = Config::from_env().context("invalid environment configuration")?;
    if let Some(source) = &cli.source {
        config.source = DataSource::from_arg(source);
    }

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = Path::new(&config.log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&config.log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("attendance_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    info!(source = %config.source, "Starting attendance dashboard");
    let session = Session::from_config(&config);

    if let Err(e) = run(&session, cli.command, cli.json).await {
        let message = recover(e).with_context(|| format!("source: {}", session.source()))?;
        println!("{message}");
    }
    Ok(())
}

/// Turns a recoverable error into the notice shown to the viewer.
/// Fatal errors are handed back so the process exits non-zero.
fn recover(err: DashboardError) -> std::result::Result<String, DashboardError> {
    if err.is_fatal() {
        return Err(err);
    }
    warn!(error = %err, "Selection could not be rendered");
    Ok(notice(&err))
}

/// Viewer-facing message for a recoverable error.
fn notice(err: &DashboardError) -> String {
    match err {
        DashboardError::EmptyInput(_) => "No data found.".to_string(),
        DashboardError::Validation(msg) => format!("Please correct your selection: {msg}."),
        other => other.to_string(),
    }
}

async fn run(
    session: &Session,
    command: Commands,
    json: bool,
) -> attendance_dashboard::error::Result<()> {
    let dataset = session.dataset().await?;

    match command {
        Commands::Summary { range } => {
            let selection = filter_by_time_range(dataset, range);
            let summary = MetricsSummary::from_records(&selection);
            print_pretty(&summary);

            if json {
                let report = SummaryReport {
                    range: range.label(),
                    window: range.window(dataset),
                    retention: summary.retention(),
                    summary,
                };
                println!("{}", to_json(&report)?);
            } else {
                print!("{}", render_summary(range.label(), &summary));
            }
        }
        Commands::Dates { dates } => {
            let dates: BTreeSet<NaiveDate> = dates.into_iter().collect();
            let selection = filter_by_dates(dataset, &dates);
            if selection.is_empty() {
                return Err(DashboardError::EmptyInput(
                    "none of the chosen dates have services".to_string(),
                ));
            }
            print_rows(&selection, Metric::Members, "Selected Services", json)?;
        }
        Commands::Special {
            ordinary,
            only,
            range,
        } => {
            let scoped = filter_by_time_range(dataset, range);
            let selection = special_rows(&scoped, ordinary, only);

            if let Some(message) = special_notice(&selection, only) {
                println!("{message}");
                return Ok(());
            }
            let title = match (ordinary, only) {
                (true, _) => "Ordinary Services",
                (false, true) => "Special Sunday Services",
                (false, false) => "All Services",
            };
            print_rows(&selection, Metric::Members, title, json)?;
        }
        Commands::Extremes {
            column,
            lowest,
            range,
        } => {
            let extreme = if lowest { Extreme::Lowest } else { Extreme::Highest };
            let scoped = filter_by_time_range(dataset, range);
            let selection = find_extremes(&scoped, column, extreme)?;
            print_rows(&selection, column, &format!("{extreme} {column}"), json)?;
        }
        Commands::Compare { quarters } => {
            let quarters: BTreeSet<Quarter> = quarters.into_iter().collect();
            let comparison = compare_quarters(dataset, &quarters)?;
            if json {
                let report: BTreeMap<Quarter, QuarterReport> = comparison
                    .iter()
                    .map(|(&quarter, summary)| {
                        let row = QuarterReport {
                            first_timers: summary.first_timers,
                            second_third_timers: summary.second_third_timers,
                            retention_rate: summary.retention_rate,
                        };
                        (quarter, row)
                    })
                    .collect();
                println!("{}", to_json(&report)?);
            } else {
                print!("{}", render_comparison(&comparison));
            }
        }
        Commands::Table { range, output } => {
            let selection = filter_by_time_range(dataset, range);
            match output {
                Some(path) => {
                    write_table_file(&path, &selection)?;
                    println!("Wrote {} rows to {}.", selection.len(), path.display());
                }
                None => write_csv(io::stdout().lock(), selection.iter())?,
            }
        }
        Commands::Trend { range } => {
            let selection = filter_by_time_range(dataset, range);
            let points = trend(&selection);
            if json {
                println!("{}", to_json(&points)?);
            } else {
                write_csv(io::stdout().lock(), points)?;
            }
        }
    }

    Ok(())
}

const NO_SPECIAL_EVENTS: &str = "No special events found.";

/// `--ordinary` keeps untagged services; otherwise `--only` narrows to tagged
/// services and its absence keeps every service.
fn special_rows<'a>(scoped: &Selection<'a>, ordinary: bool, only: bool) -> Selection<'a> {
    if ordinary {
        filter_by_special(scoped, false)
    } else {
        filter_special_present(scoped, only)
    }
}

fn special_notice(selection: &Selection<'_>, only: bool) -> Option<&'static str> {
    (only && selection.is_empty()).then_some(NO_SPECIAL_EVENTS)
}

fn print_rows(
    selection: &Selection<'_>,
    metric: Metric,
    title: &str,
    json: bool,
) -> attendance_dashboard::error::Result<()> {
    let summary = MetricsSummary::from_records(selection);
    if json {
        let report = RowsReport {
            rows: selection,
            summary,
        };
        println!("{}", to_json(&report)?);
    } else {
        println!("## {title}");
        print!("{}", render_rows(selection, metric));
        println!();
        print!("{}", render_summary("Totals", &summary));
    }
    Ok(())
}
