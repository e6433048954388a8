use std::collections::BTreeSet;
use std::path::PathBuf;

use attendance_dashboard::analyzers::{
    Extreme, Quarter, TimeRange, compare_quarters, filter_by_dates, filter_by_special,
    filter_by_time_range, find_extremes,
};
use attendance_dashboard::error::DashboardError;
use attendance_dashboard::fetch::RetryPolicy;
use attendance_dashboard::models::{Metric, parse_day};
use attendance_dashboard::parser::parse_attendance;
use attendance_dashboard::session::{DataSource, Session};
use attendance_dashboard::stats::MetricsSummary;

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/attendance.csv")
}

#[test]
fn test_full_pipeline() {
    let bytes = include_bytes!("fixtures/attendance.csv");
    let dataset = parse_attendance(bytes).expect("Failed to parse fixture");

    assert_eq!(dataset.len(), 6);
    assert_eq!(dataset.reference_date(), parse_day("13/10/2024"));

    let counts: Vec<usize> = TimeRange::ALL
        .into_iter()
        .map(|range| filter_by_time_range(&dataset, range).len())
        .collect();
    // 3m, 6m, Q1, Q2, Q3, all
    assert_eq!(counts, vec![2, 2, 3, 1, 1, 6]);

    let q1 = MetricsSummary::from_records(&filter_by_time_range(&dataset, TimeRange::FirstQuarter));
    assert_eq!(q1.first_timers, 17);
    assert_eq!(q1.second_third_timers, 7);

    let all = MetricsSummary::from_records(&dataset);
    assert_eq!(all.first_timers, 31);
    assert_eq!(all.second_third_timers, 15);
    assert_eq!(all.guests, 75);
}

#[test]
fn test_extremes_and_special_services() {
    let dataset = parse_attendance(include_bytes!("fixtures/attendance.csv")).unwrap();

    let busiest = find_extremes(&dataset, Metric::FirstTimers, Extreme::Highest).unwrap();
    assert_eq!(
        busiest.dates(),
        vec![parse_day("31/03/2024").unwrap(), parse_day("13/10/2024").unwrap()]
    );

    let quietest = find_extremes(&dataset, Metric::Guests, Extreme::Lowest).unwrap();
    assert_eq!(quietest.dates(), vec![parse_day("14/01/2024").unwrap()]);

    let special = filter_by_special(&dataset, true);
    assert_eq!(special.len(), 1);
    assert_eq!(special.records()[0].special_service_tag, "Easter");

    let q3 = filter_by_time_range(&dataset, TimeRange::ThirdQuarter);
    assert!(filter_by_special(&q3, true).is_empty());
}

#[test]
fn test_date_picker_and_quarter_comparison() {
    let dataset = parse_attendance(include_bytes!("fixtures/attendance.csv")).unwrap();

    let dates: BTreeSet<_> = ["07/04/2024", "01/01/2024"]
        .into_iter()
        .filter_map(parse_day)
        .collect();
    let picked = filter_by_dates(&dataset, &dates);
    assert_eq!(picked.len(), 1);

    let comparison =
        compare_quarters(&dataset, &BTreeSet::from([Quarter::Q1, Quarter::Q4])).unwrap();
    assert_eq!(comparison[&Quarter::Q1].first_timers, 17);
    assert_eq!(comparison[&Quarter::Q4].first_timers, 9);
    assert_eq!(comparison[&Quarter::Q4].retention_rate, 5.0 / 9.0 * 100.0);

    let rejected = compare_quarters(&dataset, &BTreeSet::from([Quarter::Q2]));
    assert!(matches!(rejected, Err(DashboardError::Validation(_))));
}

#[tokio::test]
async fn test_session_reads_fixture_file() {
    let session = Session::new(DataSource::File(fixture_path()), RetryPolicy::default());
    let dataset = session.dataset().await.expect("fixture should load");

    let selection = filter_by_time_range(dataset, TimeRange::Last3Months);
    assert_eq!(selection.len(), 2);
}
