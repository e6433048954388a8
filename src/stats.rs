use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{AttendanceRecord, Metric};

/// Column totals over a subset of records.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub services: usize,

    // column totals
    pub members: u64,
    pub guests: u64,
    pub first_timers: u64,
    pub second_third_timers: u64,
    pub children: u64,
    pub total_checkin: u64,

    pub retention_rate: f64,
}

impl MetricsSummary {
    /// Sums every metric column over `rows`. An empty subset yields all zeros.
    pub fn from_records<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a AttendanceRecord>,
    {
        let mut s = MetricsSummary::default();

        for r in rows {
            s.services += 1;
            s.members += u64::from(r.members);
            s.guests += u64::from(r.guests);
            s.first_timers += u64::from(r.first_timers);
            s.second_third_timers += u64::from(r.second_third_timers);
            s.children += u64::from(r.children);
            s.total_checkin += u64::from(r.total_checkin);
        }

        s.retention_rate = Self::pct(s.second_third_timers, s.first_timers);
        s
    }

    pub fn pct(part: u64, total: u64) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Total for a single column.
    pub fn get(&self, metric: Metric) -> u64 {
        match metric {
            Metric::Members => self.members,
            Metric::Guests => self.guests,
            Metric::FirstTimers => self.first_timers,
            Metric::SecondThirdTimers => self.second_third_timers,
            Metric::Children => self.children,
            Metric::TotalCheckin => self.total_checkin,
        }
    }

    /// `(column, total)` pairs in sheet order.
    pub fn totals(&self) -> impl Iterator<Item = (Metric, u64)> + '_ {
        Metric::ALL.into_iter().map(|m| (m, self.get(m)))
    }

    /// Retained vs. not-retained first timers, for the retention pie.
    pub fn retention(&self) -> RetentionBreakdown {
        RetentionBreakdown {
            retained: self.second_third_timers,
            not_retained: self.first_timers.saturating_sub(self.second_third_timers),
            retention_rate: self.retention_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetentionBreakdown {
    pub retained: u64,
    pub not_retained: u64,
    pub retention_rate: f64,
}

/// One point on the attendance trend chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    #[serde(rename = "Date", serialize_with = "crate::models::serialize_day")]
    pub date: NaiveDate,
    #[serde(rename = "Members")]
    pub members: u32,
    #[serde(rename = "Guests")]
    pub guests: u32,
    #[serde(rename = "First Timers")]
    pub first_timers: u32,
}

/// Members, Guests and First Timers per service, in subset order.
pub fn trend<'a, I>(rows: I) -> Vec<TrendPoint>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    rows.into_iter()
        .map(|r| TrendPoint {
            date: r.date,
            members: r.members,
            guests: r.guests,
            first_timers: r.first_timers,
        })
        .collect()
}
