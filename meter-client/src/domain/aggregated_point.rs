use serde::Serialize;
use time::OffsetDateTime;

/// One bucket of an aggregated series, ready for charting or export.
///
/// `voltage` and `current` are bucket averages; `consumption` and `cost` are
/// bucket totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedPoint {
    pub bucket_key: String,
    pub voltage: f64,
    pub current: f64,
    pub consumption: f64,
    pub cost: f64,
    /// Earliest reading in the bucket. Sort key only.
    #[serde(skip)]
    pub timestamp: OffsetDateTime,
}
