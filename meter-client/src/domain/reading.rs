use serde::Deserialize;
use time::{
    format_description::{well_known::Rfc3339, FormatItem},
    macros::format_description,
    OffsetDateTime, PrimitiveDateTime,
};

/// Offset-less timestamps as emitted by the readings API, interpreted as UTC.
const NAIVE_FRACTIONAL: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
const NAIVE_SECONDS: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// One validated sensor sample.
///
/// `consumption` (kWh) and `cost` are incremental for the sample's interval,
/// `voltage` (V) and `current` (A) are instantaneous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub id: i64,
    pub voltage: f64,
    pub current: f64,
    pub consumption: f64,
    pub cost: f64,
    pub timestamp: OffsetDateTime,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("reading {id:?} is missing required field '{field}'")]
    MissingField { id: Option<i64>, field: &'static str },
    #[error("reading {id:?} has an invalid timestamp '{raw}'")]
    InvalidTimestamp { id: Option<i64>, raw: String },
    #[error("reading {id:?} has a non-finite value for '{field}'")]
    NonFinite { id: Option<i64>, field: &'static str },
}

impl IngestError {
    /// Short, stable label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingField { .. } => "missing_field",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
            Self::NonFinite { .. } => "non_finite",
        }
    }
}

/// Loosely-typed reading as it arrives from the readings API.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReading {
    pub id: Option<i64>,
    pub voltage_value: Option<f64>,
    pub current_value: Option<f64>,
    pub consumption_value: Option<f64>,
    pub electricity_cost: Option<f64>,
    pub time_value: Option<String>,
}

/// Parse an RFC 3339 timestamp, or an offset-less ISO timestamp assumed to be UTC.
pub fn parse_timestamp(s: &str) -> Option<OffsetDateTime> {
    let s = s.trim();
    if let Ok(ts) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(ts);
    }

    PrimitiveDateTime::parse(s, NAIVE_FRACTIONAL)
        .or_else(|_| PrimitiveDateTime::parse(s, NAIVE_SECONDS))
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

impl Reading {
    /// Build a reading from already-typed but possibly absent fields.
    pub fn validate(
        id: Option<i64>,
        timestamp: Option<OffsetDateTime>,
        voltage: Option<f64>,
        current: Option<f64>,
        consumption: Option<f64>,
        cost: Option<f64>,
    ) -> Result<Self, IngestError> {
        let timestamp = timestamp.ok_or(IngestError::MissingField { id, field: "timeValue" })?;

        let require = |value: Option<f64>, field: &'static str| -> Result<f64, IngestError> {
            let v = value.ok_or(IngestError::MissingField { id, field })?;
            if v.is_finite() {
                Ok(v)
            } else {
                Err(IngestError::NonFinite { id, field })
            }
        };

        Ok(Reading {
            id: id.ok_or(IngestError::MissingField { id, field: "id" })?,
            voltage: require(voltage, "voltageValue")?,
            current: require(current, "currentValue")?,
            consumption: require(consumption, "consumptionValue")?,
            cost: require(cost, "electricityCost")?,
            timestamp,
        })
    }
}

impl TryFrom<RawReading> for Reading {
    type Error = IngestError;

    fn try_from(raw: RawReading) -> Result<Self, Self::Error> {
        let timestamp = match raw.time_value.as_deref() {
            None => None,
            Some(s) => Some(parse_timestamp(s).ok_or_else(|| IngestError::InvalidTimestamp {
                id: raw.id,
                raw: s.to_string(),
            })?),
        };

        Reading::validate(
            raw.id,
            timestamp,
            raw.voltage_value,
            raw.current_value,
            raw.consumption_value,
            raw.electricity_cost,
        )
    }
}
