use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pipeline::PipelineConfig;
use crate::spatial::ReferenceFrame;

const DEFAULT_DB_PATH: &str = "narrator.db";
const DEFAULT_SOURCE: &str = "stub://screen";
const DEFAULT_CAPTURE_INTERVAL_MS: u64 = 30_000;
const DEFAULT_QUEUE_CAPACITY: usize = 64;
const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;
const DEFAULT_REFERENCE_WIDTH: u32 = 1920;
const DEFAULT_REFERENCE_HEIGHT: u32 = 1080;
const DEFAULT_REPORT_INTERVAL_SECS: u64 = 10 * 60;
const DEFAULT_WINDOW_SECS: u64 = 10 * 60;
const DEFAULT_RETENTION_SECS: u64 = 60 * 60;

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    db_path: Option<String>,
    capture: Option<CaptureConfigFile>,
    analysis: Option<AnalysisConfigFile>,
    reports: Option<ReportsConfigFile>,
    detector: Option<DetectorConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    source: Option<String>,
    interval_ms: Option<u64>,
    queue_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct AnalysisConfigFile {
    min_confidence: Option<f32>,
    reference_width: Option<u32>,
    reference_height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ReportsConfigFile {
    interval_secs: Option<u64>,
    window_secs: Option<u64>,
    retention_secs: Option<u64>,
    output_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct DetectorConfigFile {
    backend: Option<DetectorKind>,
    model_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DetectorKind {
    Stub,
    Tract,
}

impl std::str::FromStr for DetectorKind {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "stub" => Ok(DetectorKind::Stub),
            "tract" => Ok(DetectorKind::Tract),
            other => Err(anyhow!("unknown detector backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub db_path: String,
    pub capture: CaptureSettings,
    pub analysis: AnalysisSettings,
    pub reports: ReportSettings,
    pub detector: DetectorSettings,
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub source: String,
    pub interval: Duration,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub min_confidence: f32,
    pub reference_width: u32,
    pub reference_height: u32,
}

#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub interval: Duration,
    pub window: Duration,
    pub retention: Duration,
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: DetectorKind,
    pub model_path: Option<PathBuf>,
}

impl MonitorConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("NARRATOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Self {
        let db_path = file.db_path.unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
        let capture = file.capture.unwrap_or_default();
        let analysis = file.analysis.unwrap_or_default();
        let reports = file.reports.unwrap_or_default();
        let detector = file.detector.unwrap_or_default();

        Self {
            db_path,
            capture: CaptureSettings {
                source: capture.source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
                interval: Duration::from_millis(
                    capture.interval_ms.unwrap_or(DEFAULT_CAPTURE_INTERVAL_MS),
                ),
                queue_capacity: capture.queue_capacity.unwrap_or(DEFAULT_QUEUE_CAPACITY),
            },
            analysis: AnalysisSettings {
                min_confidence: analysis.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE),
                reference_width: analysis.reference_width.unwrap_or(DEFAULT_REFERENCE_WIDTH),
                reference_height: analysis
                    .reference_height
                    .unwrap_or(DEFAULT_REFERENCE_HEIGHT),
            },
            reports: ReportSettings {
                interval: Duration::from_secs(
                    reports.interval_secs.unwrap_or(DEFAULT_REPORT_INTERVAL_SECS),
                ),
                window: Duration::from_secs(reports.window_secs.unwrap_or(DEFAULT_WINDOW_SECS)),
                retention: Duration::from_secs(
                    reports.retention_secs.unwrap_or(DEFAULT_RETENTION_SECS),
                ),
                output_dir: reports.output_dir,
            },
            detector: DetectorSettings {
                backend: detector.backend.unwrap_or(DetectorKind::Stub),
                model_path: detector.model_path,
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("NARRATOR_DB_PATH") {
            if !path.trim().is_empty() {
                self.db_path = path;
            }
        }
        if let Ok(source) = std::env::var("NARRATOR_SOURCE") {
            if !source.trim().is_empty() {
                self.capture.source = source;
            }
        }
        if let Some(ms) = env_u64("NARRATOR_CAPTURE_INTERVAL_MS", "milliseconds")? {
            self.capture.interval = Duration::from_millis(ms);
        }
        if let Some(secs) = env_u64("NARRATOR_REPORT_INTERVAL_SECS", "seconds")? {
            self.reports.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("NARRATOR_WINDOW_SECS", "seconds")? {
            self.reports.window = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("NARRATOR_RETENTION_SECS", "seconds")? {
            self.reports.retention = Duration::from_secs(secs);
        }
        if let Ok(dir) = std::env::var("NARRATOR_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.reports.output_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(confidence) = std::env::var("NARRATOR_MIN_CONFIDENCE") {
            self.analysis.min_confidence = confidence
                .trim()
                .parse()
                .map_err(|_| anyhow!("NARRATOR_MIN_CONFIDENCE must be a number"))?;
        }
        if let Ok(backend) = std::env::var("NARRATOR_DETECTOR") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend.parse()?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.capture.interval.is_zero() {
            return Err(anyhow!("capture interval must be greater than zero"));
        }
        if self.capture.queue_capacity == 0 {
            return Err(anyhow!("capture queue capacity must be at least 1"));
        }
        if self.reports.interval.is_zero() {
            return Err(anyhow!("report interval must be greater than zero"));
        }
        if self.reports.window.is_zero() {
            return Err(anyhow!("report window must be greater than zero"));
        }
        if self.reports.retention < self.reports.window {
            return Err(anyhow!(
                "retention ({}s) must cover the report window ({}s)",
                self.reports.retention.as_secs(),
                self.reports.window.as_secs()
            ));
        }
        if self.reports.window < self.reports.interval {
            return Err(anyhow!(
                "report window ({}s) must cover the report interval ({}s)",
                self.reports.window.as_secs(),
                self.reports.interval.as_secs()
            ));
        }
        if !(0.0..=1.0).contains(&self.analysis.min_confidence) {
            return Err(anyhow!("min confidence must be within [0, 1]"));
        }
        if self.analysis.reference_width == 0 || self.analysis.reference_height == 0 {
            return Err(anyhow!("reference resolution must be non-zero"));
        }
        if self.detector.backend == DetectorKind::Tract && self.detector.model_path.is_none() {
            return Err(anyhow!("the tract detector requires detector.model_path"));
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            min_confidence: self.analysis.min_confidence,
            reference: ReferenceFrame {
                width: self.analysis.reference_width,
                height: self.analysis.reference_height,
            },
        }
    }
}

fn env_u64(name: &str, unit: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be an integer number of {}", name, unit)),
        Err(_) => Ok(None),
    }
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
