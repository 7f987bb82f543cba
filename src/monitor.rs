//! Capture loop and report scheduler.
//!
//! Two threads connected by a bounded channel:
//! - capture: pulls a frame, runs the detector and the pipeline, and sends the
//!   `SnapshotReport` without blocking. A full queue drops the report.
//! - report: owns the `SessionBuffer`, forwards each snapshot report to the
//!   sinks, aggregates the window every report interval and prunes the buffer
//!   and the sinks by retention.
//!
//! Stopping sets a shared flag. The capture thread exits after its current
//! cycle and drops the sender; the report thread drains whatever is queued,
//! runs one final aggregation and exits.

use anyhow::{anyhow, Result};
use chrono::Local;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::aggregate::aggregate;
use crate::config::MonitorConfig;
use crate::detect::BackendRegistry;
use crate::ingest::FrameSource;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::session::SessionBuffer;
use crate::storage::{ReportSink, StoredAggregate};
use crate::SnapshotReport;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct MonitorSettings {
    pub capture_interval: Duration,
    pub queue_capacity: usize,
    pub report_interval: Duration,
    pub window: Duration,
    pub retention: Duration,
    pub pipeline: PipelineConfig,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            capture_interval: Duration::from_secs(30),
            queue_capacity: 64,
            report_interval: Duration::from_secs(10 * 60),
            window: Duration::from_secs(10 * 60),
            retention: Duration::from_secs(60 * 60),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl MonitorSettings {
    pub fn from_config(cfg: &MonitorConfig) -> Self {
        Self {
            capture_interval: cfg.capture.interval,
            queue_capacity: cfg.capture.queue_capacity,
            report_interval: cfg.reports.interval,
            window: cfg.reports.window,
            retention: cfg.reports.retention,
            pipeline: cfg.pipeline_config(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames_captured: u64,
    pub capture_failures: u64,
    pub snapshots_sent: u64,
    pub snapshots_dropped: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub snapshots_received: u64,
    pub reports_emitted: u64,
    pub sink_errors: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    pub capture: CaptureStats,
    pub report: ReportStats,
}

pub struct Monitor {
    settings: MonitorSettings,
    source: Box<dyn FrameSource>,
    detectors: BackendRegistry,
    sinks: Vec<Box<dyn ReportSink>>,
}

impl Monitor {
    pub fn new(
        settings: MonitorSettings,
        source: Box<dyn FrameSource>,
        detectors: BackendRegistry,
    ) -> Self {
        Self {
            settings,
            source,
            detectors,
            sinks: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Start both loops.
    pub fn spawn(self) -> Result<MonitorHandle> {
        if self.settings.queue_capacity == 0 {
            return Err(anyhow!("queue capacity must be at least 1"));
        }
        if self.settings.window < self.settings.report_interval {
            return Err(anyhow!("report window must cover the report interval"));
        }
        let window = chrono::Duration::from_std(self.settings.window)
            .map_err(|_| anyhow!("report window out of range"))?;
        let retention = chrono::Duration::from_std(self.settings.retention)
            .map_err(|_| anyhow!("retention out of range"))?;

        let (tx, rx) = sync_channel::<SnapshotReport>(self.settings.queue_capacity);
        let shutdown = Arc::new(AtomicBool::new(false));

        log::info!(
            "monitor starting: source={} capture every {:?}, report every {:?} over {:?}",
            self.source.describe(),
            self.settings.capture_interval,
            self.settings.report_interval,
            self.settings.window
        );

        let capture = CaptureLoop {
            source: self.source,
            detectors: self.detectors,
            pipeline: Pipeline::new(self.settings.pipeline),
            interval: self.settings.capture_interval,
            tx,
            shutdown: shutdown.clone(),
        };
        let report = ReportLoop {
            rx,
            sinks: self.sinks,
            buffer: SessionBuffer::new(),
            interval: self.settings.report_interval,
            window,
            retention,
        };

        let capture_join = std::thread::Builder::new()
            .name("narrator-capture".to_string())
            .spawn(move || capture.run())?;
        let report_join = std::thread::Builder::new()
            .name("narrator-report".to_string())
            .spawn(move || report.run())?;

        Ok(MonitorHandle {
            shutdown,
            capture: Some(capture_join),
            report: Some(report_join),
        })
    }
}

#[derive(Debug)]
pub struct MonitorHandle {
    shutdown: Arc<AtomicBool>,
    capture: Option<JoinHandle<CaptureStats>>,
    report: Option<JoinHandle<ReportStats>>,
}

impl MonitorHandle {
    /// Flag shared with the loops. Setting it has the same effect as `stop`
    /// without waiting for the threads.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.capture.as_ref().map_or(true, |j| j.is_finished())
            && self.report.as_ref().map_or(true, |j| j.is_finished())
    }

    /// Signal both loops to stop and wait for the final flush.
    pub fn stop(mut self) -> Result<MonitorSummary> {
        self.shutdown.store(true, Ordering::SeqCst);
        self.join()
    }

    /// Wait for both loops to exit after the stop flag has been set elsewhere.
    pub fn join(&mut self) -> Result<MonitorSummary> {
        let capture = match self.capture.take() {
            Some(join) => join
                .join()
                .map_err(|_| anyhow!("capture thread panicked"))?,
            None => CaptureStats::default(),
        };
        let report = match self.report.take() {
            Some(join) => join
                .join()
                .map_err(|_| anyhow!("report thread panicked"))?,
            None => ReportStats::default(),
        };
        Ok(MonitorSummary { capture, report })
    }
}

// -------------------- Capture --------------------

struct CaptureLoop {
    source: Box<dyn FrameSource>,
    detectors: BackendRegistry,
    pipeline: Pipeline,
    interval: Duration,
    tx: SyncSender<SnapshotReport>,
    shutdown: Arc<AtomicBool>,
}

impl CaptureLoop {
    fn run(mut self) -> CaptureStats {
        let mut stats = CaptureStats::default();
        let mut last_health_log = Instant::now();

        while !self.shutdown.load(Ordering::SeqCst) {
            let cycle_start = Instant::now();
            let report = self.capture_once(&mut stats);

            match self.tx.try_send(report) {
                Ok(()) => stats.snapshots_sent += 1,
                Err(TrySendError::Full(_)) => {
                    stats.snapshots_dropped += 1;
                    log::warn!("report queue full; dropping snapshot");
                }
                Err(TrySendError::Disconnected(_)) => {
                    log::error!("report loop gone; stopping capture");
                    break;
                }
            }

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                log::info!(
                    "capture health={} frames={} failures={} sent={} dropped={}",
                    self.source.is_healthy(),
                    stats.frames_captured,
                    stats.capture_failures,
                    stats.snapshots_sent,
                    stats.snapshots_dropped
                );
                last_health_log = Instant::now();
            }

            sleep_until(cycle_start + self.interval, &self.shutdown);
        }

        log::info!("capture loop stopped after {} frames", stats.frames_captured);
        stats
    }

    fn capture_once(&mut self, stats: &mut CaptureStats) -> SnapshotReport {
        match self.source.next_frame() {
            Ok(frame) => {
                stats.frames_captured += 1;
                let outcome = self
                    .detectors
                    .detect(frame.pixels(), frame.width, frame.height);
                let luma = frame.to_luma();
                self.pipeline.process(outcome, Some(&luma), frame.captured_at)
            }
            Err(err) => {
                stats.capture_failures += 1;
                self.pipeline
                    .process(Err(err.context("frame capture failed")), None, Local::now())
            }
        }
    }
}

fn sleep_until(deadline: Instant, shutdown: &AtomicBool) {
    loop {
        if shutdown.load(Ordering::SeqCst) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        std::thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

// -------------------- Report --------------------

struct ReportLoop {
    rx: Receiver<SnapshotReport>,
    sinks: Vec<Box<dyn ReportSink>>,
    buffer: SessionBuffer,
    interval: Duration,
    window: chrono::Duration,
    retention: chrono::Duration,
}

impl ReportLoop {
    fn run(mut self) -> ReportStats {
        let mut stats = ReportStats::default();
        let mut next_report = Instant::now() + self.interval;

        loop {
            match self.rx.recv_timeout(POLL_INTERVAL) {
                Ok(report) => self.accept(report, &mut stats),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            if Instant::now() >= next_report {
                self.emit_aggregate(&mut stats);
                next_report = Instant::now() + self.interval;
            }
        }

        log::info!(
            "report loop flushing {} buffered snapshots",
            self.buffer.len()
        );
        self.emit_aggregate(&mut stats);
        stats
    }

    fn accept(&mut self, report: SnapshotReport, stats: &mut ReportStats) {
        stats.snapshots_received += 1;
        log::debug!("snapshot {}: {}", report.timestamp(), report.narrative);
        for sink in self.sinks.iter_mut() {
            if let Err(err) = sink.record_snapshot(&report) {
                stats.sink_errors += 1;
                log::warn!("failed to record snapshot report: {:#}", err);
            }
        }
        self.buffer.push(report.snapshot);
    }

    fn emit_aggregate(&mut self, stats: &mut ReportStats) {
        let now = Local::now();
        let window = self.buffer.window(now - self.window);
        if window.is_empty() {
            log::info!("no snapshots in the last {}s; skipping report", self.window.num_seconds());
        } else {
            let stored = StoredAggregate {
                generated_at: now,
                report: aggregate(&window),
            };
            for sink in self.sinks.iter_mut() {
                if let Err(err) = sink.record_aggregate(&stored) {
                    stats.sink_errors += 1;
                    log::warn!("failed to record aggregate report: {:#}", err);
                }
            }
            stats.reports_emitted += 1;
            log::info!(
                "report #{}: {} samples, {}",
                stats.reports_emitted,
                stored.report.sample_count,
                stored.report.narrative
            );
        }
        let cutoff = now - self.retention;
        self.buffer.retain_since(cutoff);
        for sink in self.sinks.iter_mut() {
            match sink.prune_before(cutoff) {
                Ok(0) => {}
                Ok(removed) => log::debug!("pruned {} stored snapshot reports", removed),
                Err(err) => {
                    stats.sink_errors += 1;
                    log::warn!("failed to prune snapshot reports: {:#}", err);
                }
            }
        }
    }
}
