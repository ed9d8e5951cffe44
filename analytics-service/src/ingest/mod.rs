use meter_client::domain::{IngestError, Reading};

/// Outcome of validating a batch of raw readings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub readings: Vec<Reading>,
    pub dropped: usize,
}

impl IngestReport {
    /// Count a dropped record under `reason`.
    pub fn record_drop(&mut self, reason: &'static str) {
        self.dropped += 1;
        metrics::counter!("readings_dropped_total", "reason" => reason).increment(1);
    }
}

/// Validate raw readings, dropping any that violate a required field.
///
/// Never fails: bad records are counted and logged, the rest are returned in
/// input order.
pub fn ingest<T, I>(raws: I) -> IngestReport
where
    I: IntoIterator<Item = T>,
    T: TryInto<Reading, Error = IngestError>,
{
    let mut report = IngestReport::default();

    for raw in raws {
        match TryInto::<Reading>::try_into(raw) {
            Ok(reading) => report.readings.push(reading),
            Err(e) => {
                tracing::debug!(error = %e, "dropping reading");
                report.record_drop(e.reason());
            }
        }
    }

    if report.dropped > 0 {
        tracing::info!(
            kept = report.readings.len(),
            dropped = report.dropped,
            "readings failed validation"
        );
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use meter_client::domain::RawReading;

    fn raw(id: i64, time_value: &str) -> RawReading {
        RawReading {
            id: Some(id),
            voltage_value: Some(230.0),
            current_value: Some(2.0),
            consumption_value: Some(0.1),
            electricity_cost: Some(0.05),
            time_value: Some(time_value.to_string()),
        }
    }

    #[test]
    fn keeps_valid_readings_in_order() {
        let report = ingest(vec![
            raw(1, "2024-01-01T00:00:02Z"),
            raw(2, "2024-01-01T00:00:01Z"),
        ]);
        assert_eq!(report.dropped, 0);
        let ids: Vec<i64> = report.readings.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn drops_unparseable_timestamp_without_failing() {
        let mut missing = raw(3, "");
        missing.time_value = None;

        let report = ingest(vec![
            raw(1, "2024-01-01T00:00:01Z"),
            raw(2, "31/31/2024"),
            missing,
        ]);
        assert_eq!(report.readings.len(), 1);
        assert_eq!(report.dropped, 2);
    }

    #[test]
    fn empty_input_is_empty_report() {
        let report = ingest(Vec::<RawReading>::new());
        assert_eq!(report, IngestReport::default());
    }
}
