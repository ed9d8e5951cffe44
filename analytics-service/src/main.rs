use anyhow::{bail, Context, Result};
use analytics_service::{
    aggregate::aggregate_range,
    config::AppConfig,
    dashboard::{Chart, DashboardEvent, EventBus, MetricsView},
    export::{write_report, MetricKind, ReportRequest},
    metrics_server, observability,
    sources::{QuestDbReadingSource, ReadingSource},
};
use sqlx::postgres::PgPoolOptions;
use std::env;
use time::OffsetDateTime;

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("usage: analytics-service <meter_id> <meter_name> [consumption|cost]");
    }
    let meter_id: i64 = args[1]
        .parse()
        .with_context(|| format!("invalid meter id '{}'", args[1]))?;
    let meter_name = &args[2];
    let kind: MetricKind = match args.get(3) {
        Some(s) => s.parse().map_err(anyhow::Error::msg)?,
        None => MetricKind::Consumption,
    };

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let pool = PgPoolOptions::new()
        .max_connections(cfg.questdb.max_connections)
        .connect(&cfg.questdb.uri)
        .await?;

    // One instant for the whole run: fetch window, charts and report agree on it.
    let now = OffsetDateTime::now_utc();
    let export_window = cfg.export.window();
    let export_start = now
        .checked_sub(export_window)
        .context("export window reaches before the representable range")?;
    let fetch_start = export_start.min(now - cfg.dashboard.initial_resolution.lookback());

    let source = QuestDbReadingSource::new(pool, meter_id, fetch_start, now, cfg.retry.policy());
    let report = source.fetch().await?;
    tracing::info!(
        meter_id,
        readings = report.readings.len(),
        dropped = report.dropped,
        "readings loaded"
    );

    let mut view = MetricsView::new(cfg.dashboard.initial_resolution);
    let mut bus = EventBus::new();
    bus.emit(DashboardEvent::ReadingsLoaded(report.readings));
    view.apply_all(&mut bus);

    let series = view.refresh(now);
    for chart in Chart::ALL {
        tracing::info!(
            chart = ?chart,
            resolution = view.resolution(chart).tag(),
            points = series.get(chart).len(),
            "chart series ready"
        );
    }
    tracing::debug!(series = %serde_json::to_string(&series)?, "dashboard series");

    let resolution = cfg.dashboard.export_resolution;
    let points = aggregate_range(view.readings(), export_start, now, resolution);
    let req = ReportRequest {
        kind,
        meter_name,
        start: export_start,
        end: now,
        resolution,
    };
    let path = write_report(&cfg.export.output_dir, &points, &req, &cfg.export, now).await?;
    println!("{}", path.display());

    Ok(())
}
