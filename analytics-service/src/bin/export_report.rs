use anyhow::{bail, Context, Result};
use analytics_service::{
    aggregate::aggregate_range,
    config::{AppConfig, ExportConfig},
    export::{export_resolution, report_window, write_report, MetricKind, ReportRequest},
    observability,
    sources::file_source,
};
use std::{env, path::Path};
use time::{macros::format_description, Date, OffsetDateTime};

fn parse_day(s: &str) -> Result<Date> {
    Date::parse(s, format_description!("[year]-[month]-[day]")).with_context(|| format!("invalid date '{s}'"))
}

/// Offline report: readings file in, CSV report out.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 5 {
        bail!(
            "usage: export_report <readings.ndjson|readings.csv> <meter_name> <resolution> \
             <consumption|cost> [start YYYY-MM-DD] [end YYYY-MM-DD]"
        );
    }
    let input = Path::new(&args[1]);
    let meter_name = &args[2];
    let resolution = export_resolution(&args[3])?;
    let kind: MetricKind = args[4].parse().map_err(anyhow::Error::msg)?;

    // Config is optional offline; without it the built-in export defaults apply.
    let export_cfg = match AppConfig::load() {
        Ok(cfg) => cfg.export,
        Err(e) => {
            tracing::warn!(error = %e, "no usable config, using export defaults");
            ExportConfig::default()
        }
    };

    let now = OffsetDateTime::now_utc();
    let start_day = args.get(5).map(|s| parse_day(s)).transpose()?;
    let end_day = args.get(6).map(|s| parse_day(s)).transpose()?;
    let (start, end) = report_window(start_day, end_day, export_cfg.window(), now)?;

    let report = file_source(input).fetch().await?;
    tracing::info!(
        input = %input.display(),
        readings = report.readings.len(),
        dropped = report.dropped,
        "readings loaded"
    );

    let points = aggregate_range(&report.readings, start, end, resolution);
    let req = ReportRequest {
        kind,
        meter_name,
        start,
        end,
        resolution,
    };
    let path = write_report(&export_cfg.output_dir, &points, &req, &export_cfg, now).await?;
    println!("{}", path.display());

    Ok(())
}
