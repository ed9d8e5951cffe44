use anyhow::Result;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::domain::{IngestError, Reading};

/// Row shape of the `meter_readings` table. Columns are nullable upstream, so
/// rows are validated into [`Reading`] before use.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeterReadingRow {
    pub id: Option<i64>,
    pub ts: Option<OffsetDateTime>,
    pub meter_id: i64,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub consumption_kwh: Option<f64>,
    pub cost: Option<f64>,
}

impl TryFrom<MeterReadingRow> for Reading {
    type Error = IngestError;

    fn try_from(row: MeterReadingRow) -> Result<Self, Self::Error> {
        Reading::validate(
            row.id,
            row.ts,
            row.voltage,
            row.current,
            row.consumption_kwh,
            row.cost,
        )
    }
}

/// Fetch the time-ordered readings of a single meter in `[start, end]`.
pub async fn load_readings(
    pool: &PgPool,
    meter_id: i64,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<Vec<MeterReadingRow>> {
    let rows = sqlx::query_as::<_, MeterReadingRow>(
        r#"
        SELECT
            id,
            ts,
            meter_id,
            voltage,
            current,
            consumption_kwh,
            cost
        FROM meter_readings
        WHERE meter_id = $1
          AND ts >= $2
          AND ts <= $3
        ORDER BY ts
        "#,
    )
    .bind(meter_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
