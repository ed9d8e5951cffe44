//! Reading sources: where already-recorded readings come from before they are
//! validated and aggregated.

pub mod csv_file;
pub mod ndjson_file;
pub mod questdb;

pub use csv_file::CsvFileSource;
pub use ndjson_file::NdjsonFileSource;
pub use questdb::QuestDbReadingSource;

use std::path::Path;

use crate::ingest::IngestReport;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read input: {0}")]
    Read(String),
    #[error("query failed: {0}")]
    Query(String),
}

/// Supplies one meter's readings, validated, to the aggregation layer.
///
/// Record-level problems are dropped and counted in the report; only failures
/// that make the whole source unreadable surface as [`SourceError`].
#[async_trait::async_trait]
pub trait ReadingSource: Send + Sync {
    async fn fetch(&self) -> Result<IngestReport, SourceError>;
}

/// Pick a file source by extension: `.csv` is CSV, anything else NDJSON.
pub fn file_source(path: &Path) -> Box<dyn ReadingSource> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => Box::new(CsvFileSource::new(path)),
        _ => Box::new(NdjsonFileSource::new(path)),
    }
}
