use std::{
    fs::File,
    path::{Path, PathBuf},
};

use meter_client::domain::{RawReading, Reading};

use super::{ReadingSource, SourceError};
use crate::ingest::IngestReport;

/// CSV export of the readings API.
///
/// Expected header columns (by name):
/// - id
/// - voltageValue
/// - currentValue
/// - consumptionValue
/// - electricityCost
/// - timeValue (RFC 3339, or ISO without offset for UTC)
///
/// Empty cells are treated as absent and the row is dropped.
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn read_csv(path: &Path) -> Result<IngestReport, SourceError> {
    let file = File::open(path).map_err(|e| SourceError::Open {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let mut report = IngestReport::default();

    for (idx, result) in rdr.deserialize::<RawReading>().enumerate() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) if e.is_io_error() => {
                return Err(SourceError::Read(format!("failed to read CSV record: {e}")));
            }
            Err(e) => {
                tracing::debug!(row = idx + 1, error = %e, "skipping malformed CSV record");
                report.record_drop("malformed_record");
                continue;
            }
        };

        match Reading::try_from(raw) {
            Ok(reading) => report.readings.push(reading),
            Err(e) => {
                tracing::debug!(row = idx + 1, error = %e, "dropping reading");
                report.record_drop(e.reason());
            }
        }
    }

    Ok(report)
}

#[async_trait::async_trait]
impl ReadingSource for CsvFileSource {
    async fn fetch(&self) -> Result<IngestReport, SourceError> {
        // csv is a blocking reader; keep it off the async workers.
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_csv(&path))
            .await
            .map_err(|e| SourceError::Read(format!("csv reader task failed: {e}")))?
    }
}
