use anyhow::Result;
use chrono::{Duration, Local, TimeZone};

use scene_narrator::detect::{DetectionResult, RawDetection};
use scene_narrator::storage::StoredAggregate;
use scene_narrator::{
    aggregate, BoundingBox, InMemoryReportSink, JsonDirSink, Pipeline, ReportSink,
    SnapshotReport, SqliteReportStore, Timestamp,
};

fn at(minute: u32) -> Timestamp {
    Local.with_ymd_and_hms(2024, 6, 3, 15, minute, 0).unwrap()
}

fn report_at(timestamp: Timestamp, persons: usize) -> SnapshotReport {
    let mut result = DetectionResult::new(1920, 1080);
    for i in 0..persons {
        result = result.with_detection(RawDetection::new(
            "person",
            0.9,
            BoundingBox::new(100.0 + i as f32 * 300.0, 400.0, 150.0, 350.0),
        ));
    }
    Pipeline::default().process(Ok(result), None, timestamp)
}

#[test]
fn sqlite_round_trips_snapshot_reports_by_time_range() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("narrator.db");
    let db_path = db_path.to_string_lossy().to_string();

    {
        let mut store = SqliteReportStore::open(&db_path)?;
        store.record_snapshot(&report_at(at(10), 1))?;
        store.record_snapshot(&report_at(at(0), 2))?;
        store.record_snapshot(&report_at(at(20), 0))?;
    }

    let store = SqliteReportStore::open(&db_path)?;
    let all = store.load_snapshots(None, None)?;
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].timestamp(), at(0));
    assert_eq!(all[0].summary.total_persons, 2);
    assert_eq!(all[2].narrative, "No person detected in the scene. Scene without detectable activity.");

    let window = store.load_snapshots(Some(at(5)), Some(at(20)))?;
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].timestamp(), at(10));
    Ok(())
}

#[test]
fn sqlite_stores_aggregates_and_prunes() -> Result<()> {
    let mut store = SqliteReportStore::open_in_memory()?;
    let reports: Vec<SnapshotReport> = (0..4).map(|m| report_at(at(m * 10), 1)).collect();
    for report in &reports {
        store.record_snapshot(report)?;
    }

    let snapshots: Vec<_> = reports.iter().map(|r| r.snapshot.clone()).collect();
    let first = StoredAggregate {
        generated_at: at(31),
        report: aggregate(&snapshots[..2]),
    };
    let second = StoredAggregate {
        generated_at: at(32),
        report: aggregate(&snapshots),
    };
    store.record_aggregate(&first)?;
    store.record_aggregate(&second)?;

    let latest = store.load_aggregates(1)?;
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].generated_at, at(32));
    assert_eq!(latest[0].report.sample_count, 4);
    assert_eq!(latest[0].report.narrative, second.report.narrative);

    assert_eq!(store.prune_before(at(15))?, 2);
    assert_eq!(store.load_snapshots(None, None)?.len(), 2);
    Ok(())
}

#[test]
fn json_dir_sink_names_files_by_generation_time() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut sink = JsonDirSink::new(dir.path().join("reports"))?;
    let stored = StoredAggregate {
        generated_at: at(45),
        report: aggregate(&[report_at(at(44), 1).snapshot]),
    };

    sink.record_snapshot(&report_at(at(44), 1))?;
    sink.record_aggregate(&stored)?;
    sink.record_aggregate(&stored)?;

    let first = sink.dir().join("report_20240603_154500.json");
    let second = sink.dir().join("report_20240603_154500_1.json");
    assert!(first.exists());
    assert!(second.exists());
    assert_eq!(std::fs::read_dir(sink.dir())?.count(), 2);

    let parsed: StoredAggregate = serde_json::from_str(&std::fs::read_to_string(first)?)?;
    assert_eq!(parsed.report.sample_count, 1);
    assert_eq!(parsed.generated_at, at(45));
    Ok(())
}

#[test]
fn in_memory_sink_clones_share_reports() -> Result<()> {
    let sink = InMemoryReportSink::new();
    let mut writer = sink.clone();
    writer.record_snapshot(&report_at(Local::now() - Duration::minutes(1), 1))?;
    writer.record_aggregate(&StoredAggregate {
        generated_at: Local::now(),
        report: aggregate(&[]),
    })?;

    assert_eq!(sink.snapshots()?.len(), 1);
    assert!(sink.aggregates()?[0].report.is_insufficient());
    Ok(())
}

#[test]
fn in_memory_sink_prunes_old_snapshots() -> Result<()> {
    let sink = InMemoryReportSink::new();
    let mut writer = sink.clone();
    for minute in [0, 10, 20] {
        writer.record_snapshot(&report_at(at(minute), 1))?;
    }

    assert_eq!(writer.prune_before(at(10))?, 1);
    let kept: Vec<Timestamp> = sink.snapshots()?.iter().map(|r| r.timestamp()).collect();
    assert_eq!(kept, vec![at(10), at(20)]);

    let dir = tempfile::tempdir()?;
    let mut files = JsonDirSink::new(dir.path().join("out"))?;
    assert_eq!(files.prune_before(at(30))?, 0);
    Ok(())
}
