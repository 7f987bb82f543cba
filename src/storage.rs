//! Report sinks.
//!
//! The monitor hands every snapshot report and every aggregate report to each
//! configured `ReportSink`. Sinks own their persistence; the core never does I/O.

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::aggregate::AggregateReport;
use crate::{SnapshotReport, Timestamp};

/// An aggregate report with the time it was produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredAggregate {
    pub generated_at: Timestamp,
    pub report: AggregateReport,
}

pub trait ReportSink: Send {
    fn record_snapshot(&mut self, report: &SnapshotReport) -> Result<()>;

    fn record_aggregate(&mut self, aggregate: &StoredAggregate) -> Result<()>;

    /// Drop stored snapshot reports captured before `cutoff`. Returns how many
    /// were removed. Sinks that keep no snapshots remove nothing.
    fn prune_before(&mut self, _cutoff: Timestamp) -> Result<usize> {
        Ok(0)
    }
}

// -------------------- SQLite --------------------

pub struct SqliteReportStore {
    conn: Connection,
}

impl SqliteReportStore {
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("failed to open report database {}", db_path))?;
        let mut store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let mut store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS snapshot_reports (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              captured_at_ms INTEGER NOT NULL,
              total_persons INTEGER NOT NULL,
              total_objects INTEGER NOT NULL,
              payload_json TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS aggregate_reports (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              generated_at_ms INTEGER NOT NULL,
              sample_count INTEGER NOT NULL,
              payload_json TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_snapshots_captured ON snapshot_reports(captured_at_ms);
            "#,
        )?;
        Ok(())
    }

    /// Snapshot reports captured within `[since, until)`, oldest first.
    pub fn load_snapshots(
        &self,
        since: Option<Timestamp>,
        until: Option<Timestamp>,
    ) -> Result<Vec<SnapshotReport>> {
        let since_ms = since.map(|t| t.timestamp_millis()).unwrap_or(i64::MIN);
        let until_ms = until.map(|t| t.timestamp_millis()).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            "SELECT payload_json FROM snapshot_reports \
             WHERE captured_at_ms >= ?1 AND captured_at_ms < ?2 \
             ORDER BY captured_at_ms ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![since_ms, until_ms], |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for row in rows {
            let payload = row?;
            let report: SnapshotReport = serde_json::from_str(&payload)
                .map_err(|e| anyhow!("corrupt snapshot report payload: {}", e))?;
            out.push(report);
        }
        Ok(out)
    }

    /// Most recent aggregate reports, newest first.
    pub fn load_aggregates(&self, limit: usize) -> Result<Vec<StoredAggregate>> {
        let limit = i64::try_from(limit).map_err(|_| anyhow!("limit exceeds i64 range"))?;
        let mut stmt = self.conn.prepare(
            "SELECT payload_json FROM aggregate_reports ORDER BY generated_at_ms DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| row.get::<_, String>(0))?;

        let mut out = Vec::new();
        for row in rows {
            let payload = row?;
            let stored: StoredAggregate = serde_json::from_str(&payload)
                .map_err(|e| anyhow!("corrupt aggregate report payload: {}", e))?;
            out.push(stored);
        }
        Ok(out)
    }
}

impl ReportSink for SqliteReportStore {
    fn record_snapshot(&mut self, report: &SnapshotReport) -> Result<()> {
        let payload = serde_json::to_string(report)?;
        let total_persons = i64::try_from(report.summary.total_persons)
            .map_err(|_| anyhow!("person count exceeds i64 range"))?;
        let total_objects = i64::try_from(report.summary.total_objects)
            .map_err(|_| anyhow!("object count exceeds i64 range"))?;
        self.conn.execute(
            "INSERT INTO snapshot_reports(captured_at_ms, total_persons, total_objects, payload_json) \
             VALUES (?1, ?2, ?3, ?4)",
            params![
                report.timestamp().timestamp_millis(),
                total_persons,
                total_objects,
                payload
            ],
        )?;
        Ok(())
    }

    fn record_aggregate(&mut self, aggregate: &StoredAggregate) -> Result<()> {
        let payload = serde_json::to_string(aggregate)?;
        let sample_count = i64::try_from(aggregate.report.sample_count)
            .map_err(|_| anyhow!("sample count exceeds i64 range"))?;
        self.conn.execute(
            "INSERT INTO aggregate_reports(generated_at_ms, sample_count, payload_json) VALUES (?1, ?2, ?3)",
            params![aggregate.generated_at.timestamp_millis(), sample_count, payload],
        )?;
        Ok(())
    }

    fn prune_before(&mut self, cutoff: Timestamp) -> Result<usize> {
        let removed = self.conn.execute(
            "DELETE FROM snapshot_reports WHERE captured_at_ms < ?1",
            params![cutoff.timestamp_millis()],
        )?;
        Ok(removed)
    }
}

// -------------------- JSON files --------------------

/// Writes each aggregate report to `report_YYYYmmdd_HHMMSS.json` in a directory.
/// Snapshot reports are not written.
pub struct JsonDirSink {
    dir: PathBuf,
}

impl JsonDirSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create report directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, generated_at: &Timestamp) -> PathBuf {
        let stem = format!("report_{}", generated_at.format("%Y%m%d_%H%M%S"));
        let mut path = self.dir.join(format!("{}.json", stem));
        let mut suffix = 1;
        while path.exists() {
            path = self.dir.join(format!("{}_{}.json", stem, suffix));
            suffix += 1;
        }
        path
    }
}

impl ReportSink for JsonDirSink {
    fn record_snapshot(&mut self, _report: &SnapshotReport) -> Result<()> {
        Ok(())
    }

    fn record_aggregate(&mut self, aggregate: &StoredAggregate) -> Result<()> {
        let path = self.file_path(&aggregate.generated_at);
        let json = serde_json::to_string_pretty(aggregate)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write report {}", path.display()))?;
        log::info!("report written to {}", path.display());
        Ok(())
    }
}

// -------------------- Memory --------------------

#[derive(Debug, Default)]
struct InMemoryReports {
    snapshots: Vec<SnapshotReport>,
    aggregates: Vec<StoredAggregate>,
}

/// Shared in-memory sink. Clones observe the same reports.
#[derive(Clone, Debug, Default)]
pub struct InMemoryReportSink {
    inner: Arc<Mutex<InMemoryReports>>,
}

impl InMemoryReportSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Result<Vec<SnapshotReport>> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("report sink lock poisoned"))?;
        Ok(guard.snapshots.clone())
    }

    pub fn aggregates(&self) -> Result<Vec<StoredAggregate>> {
        let guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("report sink lock poisoned"))?;
        Ok(guard.aggregates.clone())
    }
}

impl ReportSink for InMemoryReportSink {
    fn record_snapshot(&mut self, report: &SnapshotReport) -> Result<()> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("report sink lock poisoned"))?
            .snapshots
            .push(report.clone());
        Ok(())
    }

    fn record_aggregate(&mut self, aggregate: &StoredAggregate) -> Result<()> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("report sink lock poisoned"))?
            .aggregates
            .push(aggregate.clone());
        Ok(())
    }

    fn prune_before(&mut self, cutoff: Timestamp) -> Result<usize> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("report sink lock poisoned"))?;
        let before = guard.snapshots.len();
        guard.snapshots.retain(|report| report.timestamp() >= cutoff);
        Ok(before - guard.snapshots.len())
    }
}
