use std::path::PathBuf;

use meter_client::domain::{RawReading, Reading};
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader},
};

use super::{ReadingSource, SourceError};
use crate::ingest::IngestReport;

/// Newline-delimited JSON readings, one API-shaped object per line
/// (`id`, `voltageValue`, `currentValue`, `consumptionValue`,
/// `electricityCost`, `timeValue`). Blank lines are skipped.
pub struct NdjsonFileSource {
    path: PathBuf,
}

impl NdjsonFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ReadingSource for NdjsonFileSource {
    async fn fetch(&self) -> Result<IngestReport, SourceError> {
        let file = File::open(&self.path).await.map_err(|e| SourceError::Open {
            path: self.path.display().to_string(),
            source: e,
        })?;
        let mut lines = BufReader::new(file).lines();
        let mut report = IngestReport::default();
        let mut line_no = 0usize;

        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| SourceError::Read(format!("failed to read ndjson line: {e}")))?
        {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            let raw: RawReading = match serde_json::from_str(&line) {
                Ok(v) => v,
                Err(e) => {
                    tracing::debug!(line = line_no, error = %e, "skipping malformed ndjson line");
                    report.record_drop("malformed_record");
                    continue;
                }
            };

            match Reading::try_from(raw) {
                Ok(reading) => report.readings.push(reading),
                Err(e) => {
                    tracing::debug!(line = line_no, error = %e, "dropping reading");
                    report.record_drop(e.reason());
                }
            }
        }

        tracing::debug!(
            path = %self.path.display(),
            kept = report.readings.len(),
            dropped = report.dropped,
            "ndjson source read"
        );
        Ok(report)
    }
}
