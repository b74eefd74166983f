//! Time-bucketing transforms over the sales table
//!
//! Every function here groups by a calendar period derived from `order_date`
//! and sums (or averages) revenue. Output order is always chronological by
//! the parsed period, never lexical by the display string: "2024-Q1" sorts
//! before "2024-Q2" and both before "2025-Q1" because the sort key is the
//! (year, quarter) pair, not the label.

use crate::data::{SalesData, SalesRecord};
use crate::round2;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Window used by the weekday/hourly averages.
pub const RECENT_WINDOW_DAYS: i64 = 90;

/// One period bucket: display label plus the summed measure.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBucket {
    pub period: String,
    pub value: f64,
}

/// One period with its revenue and period-over-period growth. The first
/// period in chronological order has no predecessor, hence `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthPoint {
    pub period: String,
    pub revenue: f64,
    pub growth_pct: Option<f64>,
}

/// Average revenue per weekday and per hour over the recent window.
#[derive(Debug, Clone)]
pub struct WeekdayHourlySummary {
    /// Monday through Sunday, in that order, with average weekly revenue.
    pub daily: Vec<PeriodBucket>,
    /// Hours 0..=23 that saw any revenue, with the mean per-week sum.
    pub hourly: Vec<PeriodBucket>,
}

/// Total revenue per month, labeled like "Jan-2024".
pub fn revenue_by_month(sales: &SalesData) -> Vec<PeriodBucket> {
    let mut buckets: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in &sales.records {
        let key = (record.order_date.year(), record.order_date.month());
        *buckets.entry(key).or_insert(0.0) += record.revenue;
    }
    buckets
        .into_iter()
        .map(|((year, month), value)| PeriodBucket {
            period: month_display_label(year, month),
            value,
        })
        .collect()
}

/// Total revenue per quarter, labeled like "2024-Q1".
pub fn revenue_by_quarter(sales: &SalesData) -> Vec<PeriodBucket> {
    let mut buckets: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in &sales.records {
        let key = (record.order_date.year(), quarter_of(&record.order_date));
        *buckets.entry(key).or_insert(0.0) += record.revenue;
    }
    buckets
        .into_iter()
        .map(|((year, quarter), value)| PeriodBucket {
            period: format!("{}-Q{}", year, quarter),
            value,
        })
        .collect()
}

/// Total revenue per year.
pub fn revenue_by_year(sales: &SalesData) -> Vec<PeriodBucket> {
    let mut buckets: BTreeMap<i32, f64> = BTreeMap::new();
    for record in &sales.records {
        *buckets.entry(record.order_date.year()).or_insert(0.0) += record.revenue;
    }
    buckets
        .into_iter()
        .map(|(year, value)| PeriodBucket {
            period: year.to_string(),
            value,
        })
        .collect()
}

/// Monthly revenue with month-over-month growth, keyed like "2024-01".
pub fn monthly_growth_rate(sales: &SalesData) -> Vec<GrowthPoint> {
    let mut buckets: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for record in &sales.records {
        let key = (record.order_date.year(), record.order_date.month());
        *buckets.entry(key).or_insert(0.0) += record.revenue;
    }
    growth_over(
        buckets
            .into_iter()
            .map(|((year, month), revenue)| (month_sort_label(year, month), revenue)),
    )
}

/// Average order value per month: revenue sum over line-item count,
/// keyed like "2024-01".
pub fn aov_by_month(sales: &SalesData) -> Vec<PeriodBucket> {
    let mut buckets: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
    for record in &sales.records {
        let key = (record.order_date.year(), record.order_date.month());
        let entry = buckets.entry(key).or_insert((0.0, 0));
        entry.0 += record.revenue;
        entry.1 += 1;
    }
    buckets
        .into_iter()
        .map(|((year, month), (total, count))| PeriodBucket {
            period: month_sort_label(year, month),
            value: if count > 0 { total / count as f64 } else { 0.0 },
        })
        .collect()
}

/// Distinct order count per quarter, labeled like "2024-Q1".
pub fn orders_by_quarter(sales: &SalesData) -> Vec<PeriodBucket> {
    let mut buckets: BTreeMap<(i32, u32), BTreeSet<&str>> = BTreeMap::new();
    for record in &sales.records {
        let key = (record.order_date.year(), quarter_of(&record.order_date));
        buckets.entry(key).or_default().insert(&record.order_id);
    }
    buckets
        .into_iter()
        .map(|((year, quarter), orders)| PeriodBucket {
            period: format!("{}-Q{}", year, quarter),
            value: orders.len() as f64,
        })
        .collect()
}

/// Average weekday and hourly revenue over the last [`RECENT_WINDOW_DAYS`]
/// relative to `now`. The weekday figure divides each day's revenue sum by
/// the number of distinct ISO weeks observed in the window; the hourly figure
/// is the mean of per-(hour, week) sums.
pub fn weekday_hourly_averages(sales: &SalesData, now: DateTime<Utc>) -> WeekdayHourlySummary {
    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);
    let recent: Vec<&SalesRecord> = sales
        .records
        .iter()
        .filter(|r| r.order_date >= cutoff)
        .collect();

    let mut weeks: BTreeSet<(i32, u32)> = BTreeSet::new();
    let mut daily: BTreeMap<u32, f64> = BTreeMap::new();
    let mut hourly: BTreeMap<(u32, (i32, u32)), f64> = BTreeMap::new();

    for record in &recent {
        let iso = record.order_date.iso_week();
        let week = (iso.year(), iso.week());
        weeks.insert(week);
        *daily
            .entry(record.order_date.weekday().num_days_from_monday())
            .or_insert(0.0) += record.revenue;
        *hourly
            .entry((record.order_date.hour(), week))
            .or_insert(0.0) += record.revenue;
    }

    let week_count = weeks.len().max(1) as f64;
    let daily = daily
        .into_iter()
        .map(|(day, total)| PeriodBucket {
            period: weekday_name(day).to_string(),
            value: total / week_count,
        })
        .collect();

    let mut per_hour: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for ((hour, _week), total) in hourly {
        let entry = per_hour.entry(hour).or_insert((0.0, 0));
        entry.0 += total;
        entry.1 += 1;
    }
    let hourly = per_hour
        .into_iter()
        .map(|(hour, (total, count))| PeriodBucket {
            period: format!("{:02}:00", hour),
            value: total / count as f64,
        })
        .collect();

    WeekdayHourlySummary { daily, hourly }
}

/// Compute period-over-period growth for already chronologically sorted
/// (period, revenue) pairs.
fn growth_over(buckets: impl Iterator<Item = (String, f64)>) -> Vec<GrowthPoint> {
    let mut points = Vec::new();
    let mut previous: Option<f64> = None;
    for (period, revenue) in buckets {
        let growth_pct = match previous {
            Some(prev) if prev != 0.0 => Some(round2((revenue - prev) / prev * 100.0)),
            Some(_) => None,
            None => None,
        };
        points.push(GrowthPoint {
            period,
            revenue,
            growth_pct,
        });
        previous = Some(revenue);
    }
    points
}

fn quarter_of(date: &DateTime<Utc>) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// "Jan-2024" style display label.
fn month_display_label(year: i32, month: u32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.format("%b-%Y").to_string(),
        None => format!("{:04}-{:02}", year, month),
    }
}

/// "2024-01" style label for growth and AOV series.
fn month_sort_label(year: i32, month: u32) -> String {
    format!("{:04}-{:02}", year, month)
}

fn weekday_name(days_from_monday: u32) -> &'static str {
    match days_from_monday {
        0 => "Monday",
        1 => "Tuesday",
        2 => "Wednesday",
        3 => "Thursday",
        4 => "Friday",
        5 => "Saturday",
        _ => "Sunday",
    }
}
