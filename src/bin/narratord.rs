//! narratord - scene narrator daemon
//!
//! This daemon:
//! 1. Captures frames from the configured source at a fixed interval
//! 2. Runs the configured detector and the detection-to-narrative pipeline
//! 3. Stores every snapshot report in SQLite
//! 4. Aggregates the recent window into an activity report every report interval
//! 5. On Ctrl-C, stops capture and flushes one final report

use anyhow::{anyhow, Result};
use std::sync::atomic::Ordering;

use scene_narrator::config::MonitorConfig;
use scene_narrator::ingest::open_source;
use scene_narrator::{BackendRegistry, JsonDirSink, Monitor, MonitorSettings, SqliteReportStore};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = MonitorConfig::load()?;
    let source = open_source(&cfg.capture.source)?;
    let detectors = BackendRegistry::from_settings(&cfg.detector)?;
    let store = SqliteReportStore::open(&cfg.db_path)?;

    let mut monitor = Monitor::new(MonitorSettings::from_config(&cfg), source, detectors)
        .with_sink(Box::new(store));
    if let Some(dir) = &cfg.reports.output_dir {
        monitor = monitor.with_sink(Box::new(JsonDirSink::new(dir)?));
        log::info!("json reports written to {}", dir.display());
    }

    log::info!(
        "narratord {} running. writing to {}",
        env!("CARGO_PKG_VERSION"),
        cfg.db_path
    );
    log::info!(
        "window={}s retention={}s min_confidence={:.2} reference={}x{}",
        cfg.reports.window.as_secs(),
        cfg.reports.retention.as_secs(),
        cfg.analysis.min_confidence,
        cfg.analysis.reference_width,
        cfg.analysis.reference_height
    );

    let mut handle = monitor.spawn()?;
    let stop = handle.stop_flag();
    ctrlc::set_handler(move || {
        log::info!("stop requested; flushing final report");
        stop.store(true, Ordering::SeqCst);
    })
    .map_err(|e| anyhow!("failed to install Ctrl-C handler: {}", e))?;

    let summary = handle.join()?;
    log::info!(
        "narratord stopped: frames={} failures={} dropped={} snapshots={} reports={} sink_errors={}",
        summary.capture.frames_captured,
        summary.capture.capture_failures,
        summary.capture.snapshots_dropped,
        summary.report.snapshots_received,
        summary.report.reports_emitted,
        summary.report.sink_errors
    );
    Ok(())
}
