//! Metrics view state: the readings of the selected meter and one resolution
//! per chart. Series are recomputed from scratch on every refresh; the
//! previous result is simply replaced.

pub mod events;

pub use events::{DashboardEvent, EventBus};

use meter_client::domain::{AggregatedPoint, Reading, Resolution};
use serde::Serialize;
use time::OffsetDateTime;

use crate::aggregate::filter_and_aggregate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chart {
    Consumption,
    Voltage,
    Current,
    Cost,
}

impl Chart {
    pub const ALL: [Chart; 4] = [Chart::Consumption, Chart::Voltage, Chart::Current, Chart::Cost];

    fn index(self) -> usize {
        match self {
            Chart::Consumption => 0,
            Chart::Voltage => 1,
            Chart::Current => 2,
            Chart::Cost => 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSeries {
    pub consumption: Vec<AggregatedPoint>,
    pub voltage: Vec<AggregatedPoint>,
    pub current: Vec<AggregatedPoint>,
    pub cost: Vec<AggregatedPoint>,
}

impl DashboardSeries {
    pub fn get(&self, chart: Chart) -> &[AggregatedPoint] {
        match chart {
            Chart::Consumption => &self.consumption,
            Chart::Voltage => &self.voltage,
            Chart::Current => &self.current,
            Chart::Cost => &self.cost,
        }
    }

    fn slot(&mut self, chart: Chart) -> &mut Vec<AggregatedPoint> {
        match chart {
            Chart::Consumption => &mut self.consumption,
            Chart::Voltage => &mut self.voltage,
            Chart::Current => &mut self.current,
            Chart::Cost => &mut self.cost,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsView {
    readings: Vec<Reading>,
    initial: Resolution,
    resolutions: [Resolution; 4],
}

impl MetricsView {
    pub fn new(initial: Resolution) -> Self {
        Self {
            readings: Vec::new(),
            initial,
            resolutions: [initial; 4],
        }
    }

    pub fn resolution(&self, chart: Chart) -> Resolution {
        self.resolutions[chart.index()]
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn apply(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::SetResolution(chart, resolution) => {
                self.resolutions[chart.index()] = resolution;
            }
            DashboardEvent::ResetResolutions => {
                self.resolutions = [self.initial; 4];
            }
            DashboardEvent::ReadingsLoaded(readings) => {
                self.readings = readings;
            }
        }
    }

    /// Apply every queued event, in order.
    pub fn apply_all(&mut self, bus: &mut EventBus) {
        for event in bus.drain() {
            self.apply(event);
        }
    }

    /// Recompute every chart against a single `now`.
    pub fn refresh(&self, now: OffsetDateTime) -> DashboardSeries {
        let mut series = DashboardSeries::default();
        for chart in Chart::ALL {
            *series.slot(chart) = filter_and_aggregate(&self.readings, self.resolution(chart), now);
        }
        series
    }
}

impl Default for MetricsView {
    fn default() -> Self {
        Self::new(Resolution::TenSeconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::Duration;

    fn readings(now: OffsetDateTime) -> Vec<Reading> {
        (0..120)
            .map(|i| Reading {
                id: i,
                voltage: 230.0,
                current: 2.0,
                consumption: 0.01,
                cost: 0.005,
                timestamp: now - Duration::seconds(i * 30),
            })
            .collect()
    }

    #[test]
    fn starts_at_initial_resolution_and_resets() {
        let mut view = MetricsView::default();
        let mut bus = EventBus::new();
        bus.emit(DashboardEvent::SetResolution(Chart::Voltage, Resolution::OneHour));
        bus.emit(DashboardEvent::SetResolution(Chart::Cost, Resolution::OneDay));
        view.apply_all(&mut bus);

        assert_eq!(view.resolution(Chart::Voltage), Resolution::OneHour);
        assert_eq!(view.resolution(Chart::Cost), Resolution::OneDay);
        assert_eq!(view.resolution(Chart::Current), Resolution::TenSeconds);

        view.apply(DashboardEvent::ResetResolutions);
        for chart in Chart::ALL {
            assert_eq!(view.resolution(chart), Resolution::TenSeconds);
        }
    }

    #[test]
    fn refresh_uses_each_charts_resolution() {
        let now = datetime!(2024-05-01 12:00:00 UTC);
        let mut view = MetricsView::default();
        view.apply(DashboardEvent::ReadingsLoaded(readings(now)));
        view.apply(DashboardEvent::SetResolution(Chart::Consumption, Resolution::OneHour));

        let series = view.refresh(now);

        // 10s: last 10 minutes at one reading per 30s, distinct seconds.
        assert_eq!(series.voltage.len(), 21);
        assert_eq!(series.get(Chart::Current), series.get(Chart::Voltage));
        // 1h: the whole hour of readings, split at 12:00.
        let keys: Vec<&str> = series.consumption.iter().map(|p| p.bucket_key.as_str()).collect();
        assert_eq!(keys, vec!["11:00", "12:00"]);
        let total: f64 = series.consumption.iter().map(|p| p.consumption).sum();
        assert!((total - 1.2).abs() < 1e-9);
    }

    #[test]
    fn refresh_without_readings_is_empty() {
        let series = MetricsView::default().refresh(datetime!(2024-05-01 12:00:00 UTC));
        assert_eq!(series, DashboardSeries::default());
    }
}
