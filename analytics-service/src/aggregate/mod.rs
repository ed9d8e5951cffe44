//! Time-bucketed aggregation of meter readings.
//!
//! Every function here is pure: callers pass the readings, the resolution and
//! (where relevant) the instant treated as "now".

use std::collections::HashMap;

use meter_client::domain::{AggregatedPoint, Reading, Resolution};
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};

#[derive(Debug, Clone, Copy)]
struct Bucket {
    voltage_sum: f64,
    current_sum: f64,
    consumption_sum: f64,
    cost_sum: f64,
    count: usize,
    first_timestamp: OffsetDateTime,
}

impl Bucket {
    fn new(first_timestamp: OffsetDateTime) -> Self {
        Self {
            voltage_sum: 0.0,
            current_sum: 0.0,
            consumption_sum: 0.0,
            cost_sum: 0.0,
            count: 0,
            first_timestamp,
        }
    }

    fn add(&mut self, r: &Reading) {
        self.voltage_sum += r.voltage;
        self.current_sum += r.current;
        self.consumption_sum += r.consumption;
        self.cost_sum += r.cost;
        self.count += 1;
        self.first_timestamp = self.first_timestamp.min(r.timestamp);
    }

    fn finish(self, bucket_key: String) -> AggregatedPoint {
        let n = self.count as f64;
        AggregatedPoint {
            bucket_key,
            voltage: self.voltage_sum / n,
            current: self.current_sum / n,
            consumption: self.consumption_sum,
            cost: self.cost_sum,
            timestamp: self.first_timestamp,
        }
    }
}

const SECOND_KEY: &[FormatItem<'static>] = format_description!("[hour]:[minute]:[second]");
const MINUTE_KEY: &[FormatItem<'static>] = format_description!("[hour]:[minute]");
const HOUR_KEY: &[FormatItem<'static>] = format_description!("[hour]:00");
const DAY_HOUR_KEY: &[FormatItem<'static>] = format_description!("[day] [month repr:short] [hour]:00");
const DAY_KEY: &[FormatItem<'static>] = format_description!("[day] [month repr:short]");
const MONTH: &[FormatItem<'static>] = format_description!("[month repr:short]");
const MONTH_KEY: &[FormatItem<'static>] = format_description!("[month repr:short] [year]");

/// Keep readings no older than `now - lookback(resolution)`.
pub fn filter_recent(readings: &[Reading], resolution: Resolution, now: OffsetDateTime) -> Vec<Reading> {
    // A cutoff before the representable range keeps everything.
    let Some(cutoff) = now.checked_sub(resolution.lookback()) else {
        return readings.to_vec();
    };

    readings.iter().filter(|r| r.timestamp >= cutoff).copied().collect()
}

/// Keep readings with `start <= timestamp <= end`.
pub fn filter_range(readings: &[Reading], start: OffsetDateTime, end: OffsetDateTime) -> Vec<Reading> {
    readings
        .iter()
        .filter(|r| r.timestamp >= start && r.timestamp <= end)
        .copied()
        .collect()
}

/// Bucket label for `ts` at `resolution`, rendered in `ts`'s own UTC offset.
///
/// The label is also the chart's x-axis text. Weekly buckets use
/// `floor(day / 7) + 1` within the month, so days 28..=31 land in "Week 5"
/// and a calendar week that spans two months is split.
pub fn bucket_key(ts: OffsetDateTime, resolution: Resolution) -> Result<String, time::error::Format> {
    let fmt = match resolution {
        Resolution::TenSeconds => SECOND_KEY,
        Resolution::OneMinute | Resolution::FiveMinutes | Resolution::FifteenMinutes => MINUTE_KEY,
        Resolution::OneHour => HOUR_KEY,
        Resolution::SixHours | Resolution::TwelveHours => DAY_HOUR_KEY,
        Resolution::OneDay => DAY_KEY,
        Resolution::OneWeek => {
            return Ok(format!("Week {}, {}", ts.day() / 7 + 1, ts.format(MONTH)?));
        }
        Resolution::OneMonth | Resolution::SixMonths => MONTH_KEY,
    };
    ts.format(fmt)
}

/// Group readings by bucket key and reduce each group.
///
/// Voltage and current are averaged, consumption and cost are summed. Output
/// is sorted by each bucket's earliest timestamp (ties broken by key), so the
/// result does not depend on hash iteration order.
pub fn aggregate(readings: &[Reading], resolution: Resolution) -> Vec<AggregatedPoint> {
    if readings.is_empty() {
        return Vec::new();
    }

    let mut ordered: Vec<&Reading> = readings.iter().collect();
    ordered.sort_by_key(|r| r.timestamp);

    let mut buckets: HashMap<String, Bucket> = HashMap::new();
    for r in ordered {
        let key = match bucket_key(r.timestamp, resolution) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(id = r.id, error = %e, "skipping reading with unformattable timestamp");
                continue;
            }
        };
        buckets
            .entry(key)
            .or_insert_with(|| Bucket::new(r.timestamp))
            .add(r);
    }

    let mut points: Vec<AggregatedPoint> = buckets
        .into_iter()
        .map(|(key, bucket)| bucket.finish(key))
        .collect();
    points.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.bucket_key.cmp(&b.bucket_key))
    });

    metrics::counter!("aggregation_runs_total", "resolution" => resolution.tag()).increment(1);
    tracing::trace!(
        resolution = resolution.tag(),
        readings = readings.len(),
        buckets = points.len(),
        "aggregated readings"
    );

    points
}

/// Recency-filter against `now`, then aggregate.
pub fn filter_and_aggregate(
    readings: &[Reading],
    resolution: Resolution,
    now: OffsetDateTime,
) -> Vec<AggregatedPoint> {
    aggregate(&filter_recent(readings, resolution, now), resolution)
}

/// Like [`filter_and_aggregate`], sampling the wall clock once.
pub fn filter_and_aggregate_now(readings: &[Reading], resolution: Resolution) -> Vec<AggregatedPoint> {
    filter_and_aggregate(readings, resolution, OffsetDateTime::now_utc())
}

/// Aggregate the readings inside an explicit `[start, end]` window.
pub fn aggregate_range(
    readings: &[Reading],
    start: OffsetDateTime,
    end: OffsetDateTime,
    resolution: Resolution,
) -> Vec<AggregatedPoint> {
    aggregate(&filter_range(readings, start, end), resolution)
}
