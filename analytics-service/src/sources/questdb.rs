use meter_client::{db, RetryPolicy};
use sqlx::PgPool;
use time::OffsetDateTime;

use super::{ReadingSource, SourceError};
use crate::ingest::{ingest, IngestReport};

/// Readings of one meter stored in QuestDB, fetched over pgwire.
pub struct QuestDbReadingSource {
    pool: PgPool,
    meter_id: i64,
    start: OffsetDateTime,
    end: OffsetDateTime,
    retry: RetryPolicy,
}

impl QuestDbReadingSource {
    pub fn new(
        pool: PgPool,
        meter_id: i64,
        start: OffsetDateTime,
        end: OffsetDateTime,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            pool,
            meter_id,
            start,
            end,
            retry,
        }
    }
}

#[async_trait::async_trait]
impl ReadingSource for QuestDbReadingSource {
    async fn fetch(&self) -> Result<IngestReport, SourceError> {
        let rows = self
            .retry
            .run("load_readings", || {
                db::load_readings(&self.pool, self.meter_id, self.start, self.end)
            })
            .await
            .map_err(|e| {
                metrics::counter!("questdb_fetch_errors_total").increment(1);
                SourceError::Query(e.to_string())
            })?;

        tracing::debug!(meter_id = self.meter_id, rows = rows.len(), "fetched readings from questdb");
        Ok(ingest(rows))
    }
}
