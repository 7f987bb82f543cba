//! analyze_reports - offline aggregation over stored snapshot reports

use anyhow::{anyhow, Result};
use chrono::{Duration, Local};
use clap::Parser;
use std::path::PathBuf;

use scene_narrator::aggregate::{AlertLevel, TrendDirection};
use scene_narrator::storage::{ReportSink, StoredAggregate};
use scene_narrator::{aggregate, JsonDirSink, SqliteReportStore};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the narrator database.
    #[arg(long, default_value = "narrator.db", env = "NARRATOR_DB_PATH")]
    db_path: String,
    /// Aggregate the last N minutes (all stored snapshots when omitted).
    #[arg(long)]
    minutes: Option<i64>,
    /// List the N most recent stored aggregate reports instead of aggregating.
    #[arg(long, value_name = "N", conflicts_with_all = ["save", "output_dir"])]
    history: Option<usize>,
    /// Print the aggregate report as JSON.
    #[arg(long)]
    json: bool,
    /// Also store the aggregate report in the database.
    #[arg(long)]
    save: bool,
    /// Write the aggregate report as a JSON file into this directory.
    #[arg(long, env = "NARRATOR_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, value_enum, default_value = "auto", value_name = "MODE")]
    ui: ui::UiMode,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let ui = ui::Ui::new(args.ui);

    let since = match args.minutes {
        Some(minutes) if minutes <= 0 => return Err(anyhow!("--minutes must be positive")),
        Some(minutes) => Some(Local::now() - Duration::minutes(minutes)),
        None => None,
    };

    let mut store = {
        let _stage = ui.stage("Open report database");
        SqliteReportStore::open(&args.db_path)?
    };
    if let Some(limit) = args.history {
        let stored = {
            let _stage = ui.stage("Load stored aggregate reports");
            store.load_aggregates(limit)?
        };
        if args.json {
            println!("{}", serde_json::to_string_pretty(&stored)?);
        } else if stored.is_empty() {
            println!("no stored aggregate reports");
        } else {
            for entry in &stored {
                println!(
                    "{} ({} samples): {}",
                    entry.generated_at.format("%Y-%m-%d %H:%M:%S"),
                    entry.report.sample_count,
                    entry.report.narrative
                );
            }
        }
        return Ok(());
    }

    let reports = {
        let _stage = ui.stage("Load snapshot reports");
        store.load_snapshots(since, None)?
    };

    let snapshots = {
        let _stage = ui.stage("Collect snapshots");
        let progress = ui.progress(reports.len() as u64, "snapshots");
        let mut snapshots = Vec::with_capacity(reports.len());
        for report in reports {
            snapshots.push(report.snapshot);
            progress.inc(1);
        }
        progress.finish_and_clear();
        snapshots
    };

    let stored = {
        let _stage = ui.stage("Aggregate");
        StoredAggregate {
            generated_at: Local::now(),
            report: aggregate(&snapshots),
        }
    };

    if args.save {
        let _stage = ui.stage("Store aggregate report");
        store.record_aggregate(&stored)?;
    }
    if let Some(dir) = &args.output_dir {
        let _stage = ui.stage("Write JSON report");
        JsonDirSink::new(dir)?.record_aggregate(&stored)?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stored)?);
        return Ok(());
    }

    let report = &stored.report;
    println!("{}", report.narrative);
    if report.is_insufficient() {
        return Ok(());
    }
    println!();
    if let Some(summary) = report.executive_summary.computed() {
        println!(
            "occupancy: {:.1}% ({}/{} samples), primary activity: {}, variety: {}",
            summary.occupancy_percent,
            summary.samples_with_people,
            summary.total_samples,
            summary.primary_activity.as_deref().unwrap_or("none"),
            summary.activity_variety
        );
        println!(
            "activity level: {}, peak hour: {}",
            summary.activity_level.as_str(),
            summary.peak_hour.as_deref().unwrap_or("n/a")
        );
        for observation in &summary.observations {
            println!("note: {}", observation);
        }
    }
    let trend = match report.activity_trend.direction {
        TrendDirection::Increasing => "increasing",
        TrendDirection::Decreasing => "decreasing",
        TrendDirection::Stable => "stable",
        TrendDirection::Insufficient => "insufficient data",
    };
    println!("activity trend: {}", trend);
    if let Some(patterns) = report.patterns.computed() {
        println!(
            "peaks: {}, idle periods: {}",
            patterns.peaks.len(),
            patterns.idles.len()
        );
    }
    for alert in &report.alerts {
        let level = match alert.level {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
        };
        println!("[{}] {}", level, alert.message);
    }
    Ok(())
}
