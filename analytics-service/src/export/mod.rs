//! CSV report rendering for aggregated series.

use std::path::{Path, PathBuf};

use meter_client::domain::{AggregatedPoint, Resolution};
use time::{format_description::FormatItem, macros::format_description, Date, Duration, OffsetDateTime};

use crate::config::ExportConfig;

pub const NO_DATA_PLACEHOLDER: &str = "No data available for the selected period.";

const ROW_TIMESTAMP: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const LONG_DATE: &[FormatItem<'static>] = format_description!("[month repr:short] [day padding:none], [year]");
const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("failed to format timestamp: {0}")]
    Format(#[from] time::error::Format),
    #[error("failed to write csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("report is not valid utf-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("resolution '{0}' is not offered for export")]
    NotExportable(String),
    #[error("invalid report window: {0}")]
    Window(String),
    #[error("invalid time component: {0}")]
    Range(#[from] time::error::ComponentRange),
}

/// Strict resolution parse for exports: unknown and sub-15-minute tags are
/// rejected instead of falling back.
pub fn export_resolution(tag: &str) -> Result<Resolution, ExportError> {
    match tag.parse::<Resolution>() {
        Ok(r) if r.is_exportable() => Ok(r),
        _ => Err(ExportError::NotExportable(tag.to_string())),
    }
}

/// Inclusive `[start, end]` bounds for a report over calendar days (UTC).
///
/// A start date begins at midnight and an end date covers its whole day, up
/// to the last nanosecond. Without a start the window reaches `window` back
/// from `now`; without an end it stops at `now`.
pub fn report_window(
    start: Option<Date>,
    end: Option<Date>,
    window: Duration,
    now: OffsetDateTime,
) -> Result<(OffsetDateTime, OffsetDateTime), ExportError> {
    let start = match start {
        Some(day) => day.midnight().assume_utc(),
        None => now
            .checked_sub(window)
            .ok_or_else(|| ExportError::Window(format!("{window} before {now} is out of range")))?,
    };
    let end = match end {
        Some(day) => day.with_hms_nano(23, 59, 59, 999_999_999)?.assume_utc(),
        None => now,
    };
    if end < start {
        return Err(ExportError::Window("end is before start".to_string()));
    }
    Ok((start, end))
}

/// Which report is being exported. Decides title and column set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Consumption,
    Cost,
}

impl MetricKind {
    pub fn title(&self) -> &'static str {
        match self {
            MetricKind::Consumption => "Electricity Consumption Report",
            MetricKind::Cost => "Electricity Cost Report",
        }
    }

    fn file_stem(&self) -> &'static str {
        match self {
            MetricKind::Consumption => "Electricity_Consumption",
            MetricKind::Cost => "Electricity_Cost",
        }
    }

    pub fn columns(&self) -> [&'static str; 4] {
        match self {
            MetricKind::Consumption => ["timestamp", "consumption", "voltage", "current"],
            MetricKind::Cost => ["timestamp", "cost", "rate", "consumption"],
        }
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "consumption" => Ok(MetricKind::Consumption),
            "cost" => Ok(MetricKind::Cost),
            other => Err(format!("unknown metric kind '{other}' (expected consumption|cost)")),
        }
    }
}

/// Everything the report header needs besides the data itself.
#[derive(Debug, Clone)]
pub struct ReportRequest<'a> {
    pub kind: MetricKind,
    pub meter_name: &'a str,
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
    pub resolution: Resolution,
}

impl ReportRequest<'_> {
    pub fn description(&self) -> Result<String, ExportError> {
        Ok(format!(
            "Data for meter {} from {} to {} with {} resolution.",
            self.meter_name,
            self.start.format(LONG_DATE)?,
            self.end.format(ISO_DATE)?,
            self.resolution.full_label(),
        ))
    }

    /// `Electricity_<Kind>_<tag>_<YYYY-MM-DD>.csv`, dated by `today`.
    pub fn file_name(&self, today: OffsetDateTime) -> Result<String, ExportError> {
        Ok(format!(
            "{}_{}_{}.csv",
            self.kind.file_stem(),
            self.resolution.tag(),
            today.format(ISO_DATE)?
        ))
    }
}

fn row(point: &AggregatedPoint, kind: MetricKind, cfg: &ExportConfig) -> Result<[String; 4], ExportError> {
    let ts = point.timestamp.format(ROW_TIMESTAMP)?;
    let consumption = format!("{:.2} kWh", point.consumption);

    Ok(match kind {
        MetricKind::Consumption => [
            ts,
            consumption,
            format!("{:.1} V", point.voltage),
            format!("{:.2} A", point.current),
        ],
        MetricKind::Cost => [
            ts,
            format!("{}{:.2}", cfg.currency_symbol, point.cost),
            format!("{}{}/kWh", cfg.currency_symbol, cfg.unit_rate),
            consumption,
        ],
    })
}

/// Render the full report: title, description, blank line, then either the
/// CSV table or the no-data placeholder.
pub fn render_report(
    points: &[AggregatedPoint],
    req: &ReportRequest<'_>,
    cfg: &ExportConfig,
) -> Result<String, ExportError> {
    let mut out = format!("{}\n{}\n\n", req.kind.title(), req.description()?);

    if points.is_empty() {
        out.push_str(NO_DATA_PLACEHOLDER);
        return Ok(out);
    }

    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(req.kind.columns())?;
    for p in points {
        wtr.write_record(row(p, req.kind, cfg)?)?;
    }
    let body = wtr.into_inner().map_err(|e| e.into_error())?;
    out.push_str(&String::from_utf8(body)?);

    Ok(out)
}

/// Render and write the report into `dir`, returning the written path.
pub async fn write_report(
    dir: &Path,
    points: &[AggregatedPoint],
    req: &ReportRequest<'_>,
    cfg: &ExportConfig,
    today: OffsetDateTime,
) -> Result<PathBuf, ExportError> {
    let contents = render_report(points, req, cfg)?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(req.file_name(today)?);
    tokio::fs::write(&path, contents).await?;

    metrics::counter!("reports_written_total").increment(1);
    tracing::info!(path = %path.display(), rows = points.len(), "report written");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_range;
    use meter_client::domain::Reading;
    use time::macros::{date, datetime};

    fn request(kind: MetricKind, meter_name: &str) -> ReportRequest<'_> {
        ReportRequest {
            kind,
            meter_name,
            start: datetime!(2024-03-01 00:00:00 UTC),
            end: datetime!(2024-03-08 00:00:00 UTC),
            resolution: Resolution::OneDay,
        }
    }

    fn point() -> AggregatedPoint {
        AggregatedPoint {
            bucket_key: "02 Mar".to_string(),
            voltage: 231.04,
            current: 4.567,
            consumption: 12.346,
            cost: 5.8,
            timestamp: datetime!(2024-03-02 00:15:00 UTC),
        }
    }

    #[test]
    fn empty_series_emits_placeholder() {
        let out = render_report(&[], &request(MetricKind::Consumption, "Home"), &ExportConfig::default()).unwrap();
        assert_eq!(
            out,
            "Electricity Consumption Report\n\
             Data for meter Home from Mar 1, 2024 to 2024-03-08 with 1 day resolution.\n\
             \n\
             No data available for the selected period."
        );
    }

    #[test]
    fn consumption_report_rows() {
        let out = render_report(&[point()], &request(MetricKind::Consumption, "Home"), &ExportConfig::default()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Electricity Consumption Report");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "timestamp,consumption,voltage,current");
        assert_eq!(lines[4], "2024-03-02 00:15:00,12.35 kWh,231.0 V,4.57 A");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn cost_report_uses_configured_currency() {
        let out = render_report(&[point()], &request(MetricKind::Cost, "Home"), &ExportConfig::default()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Electricity Cost Report");
        assert_eq!(lines[3], "timestamp,cost,rate,consumption");
        assert_eq!(lines[4], "2024-03-02 00:15:00,₦5.80,₦0.47/kWh,12.35 kWh");
    }

    #[test]
    fn values_with_commas_are_quoted() {
        let cfg = ExportConfig {
            currency_symbol: "1,000x ".to_string(),
            ..ExportConfig::default()
        };
        let out = render_report(&[point()], &request(MetricKind::Cost, "Home"), &cfg).unwrap();
        let data = out.lines().nth(4).unwrap();
        assert_eq!(
            data,
            "2024-03-02 00:15:00,\"1,000x 5.80\",\"1,000x 0.47/kWh\",12.35 kWh"
        );
    }

    #[test]
    fn file_name_includes_kind_tag_and_date() {
        let name = request(MetricKind::Cost, "Home")
            .file_name(datetime!(2024-03-09 17:00:00 UTC))
            .unwrap();
        assert_eq!(name, "Electricity_Cost_1d_2024-03-09.csv");
    }

    #[test]
    fn export_resolution_rejects_fine_grained_and_unknown_tags() {
        for tag in ["10s", "1m", "5m", "2d", ""] {
            assert!(matches!(export_resolution(tag), Err(ExportError::NotExportable(_))), "{tag}");
        }
        for r in Resolution::EXPORTABLE {
            assert_eq!(export_resolution(r.tag()).unwrap(), r);
        }
    }

    #[test]
    fn end_date_covers_the_whole_day() {
        let now = datetime!(2024-03-10 12:00:00 UTC);
        let (start, end) = report_window(
            Some(date!(2024-03-01)),
            Some(date!(2024-03-07)),
            Duration::days(7),
            now,
        )
        .unwrap();
        assert_eq!(start, datetime!(2024-03-01 00:00:00 UTC));

        let late = Reading {
            id: 1,
            voltage: 230.0,
            current: 1.0,
            consumption: 0.5,
            cost: 0.2,
            timestamp: datetime!(2024-03-07 23:59:59.5 UTC),
        };
        let next_day = Reading {
            timestamp: datetime!(2024-03-08 00:00:00 UTC),
            ..late
        };
        let points = aggregate_range(&[late, next_day], start, end, Resolution::OneDay);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].bucket_key, "07 Mar");
        // The header still names the calendar day.
        assert_eq!(end.format(ISO_DATE).unwrap(), "2024-03-07");
    }

    #[test]
    fn open_window_counts_back_from_now() {
        let now = datetime!(2024-03-10 12:00:00 UTC);
        let (start, end) = report_window(None, None, Duration::days(7), now).unwrap();
        assert_eq!(start, datetime!(2024-03-03 12:00:00 UTC));
        assert_eq!(end, now);
    }

    #[test]
    fn bad_windows_are_errors() {
        let now = datetime!(2024-03-10 12:00:00 UTC);
        let reversed = report_window(Some(date!(2024-03-09)), Some(date!(2024-03-08)), Duration::days(7), now);
        assert!(matches!(reversed, Err(ExportError::Window(_))));
        let huge = report_window(None, None, Duration::MAX, now);
        assert!(matches!(huge, Err(ExportError::Window(_))));
    }

    #[tokio::test]
    async fn write_report_creates_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("reports");
        let path = write_report(
            &out,
            &[point()],
            &request(MetricKind::Consumption, "Home"),
            &ExportConfig::default(),
            datetime!(2024-03-09 17:00:00 UTC),
        )
        .await
        .unwrap();
        assert_eq!(path.parent().unwrap(), out);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Electricity Consumption Report\n"));
    }

    #[test]
    fn metric_kind_parses() {
        assert_eq!("cost".parse::<MetricKind>(), Ok(MetricKind::Cost));
        assert!("voltage".parse::<MetricKind>().is_err());
    }
}
