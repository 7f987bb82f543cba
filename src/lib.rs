//! Scene Narrator
//!
//! This crate turns per-frame object/person detections into behavioral signals,
//! a deterministic natural-language narrative, and windowed activity reports.
//!
//! # Architecture
//!
//! The pipeline is a chain of pure stages:
//!
//! 1. **Normalizer** (`normalize`): raw detector output to a canonical detection set.
//! 2. **Spatial Analyzer** (`spatial`): posture, head orientation, hand activity,
//!    person/object interactions and a scene-wide motion intensity.
//! 3. **Activity Inference Engine** (`inference`): decision table to a probable activity.
//! 4. **Narrative Composer** (`narrative`): one descriptive paragraph per snapshot.
//! 5. **Temporal Aggregator** (`aggregate`): statistics, trend, peak/idle periods,
//!    hourly histograms and a consolidated narrative over a window of snapshots.
//!
//! The heuristics are approximations. Head orientation depends on absolute screen
//! position and hand activity on bounding-box shape; neither is behavioral ground truth.
//!
//! # Module Structure
//!
//! - `detect`: external detector interface and backends
//! - `frame`, `ingest`: captured frames and frame sources
//! - `monitor`: capture loop and report scheduler
//! - `storage`: report sinks (SQLite, JSON files, memory)
//! - Core types: Detection, Snapshot, PersonSignal, Interaction, SnapshotReport

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub mod aggregate;
pub mod config;
pub mod detect;
pub mod frame;
pub mod inference;
pub mod ingest;
pub mod monitor;
pub mod narrative;
pub mod normalize;
pub mod pipeline;
pub mod session;
pub mod spatial;
pub mod storage;

pub use aggregate::{aggregate, AggregateReport};
pub use detect::{BackendRegistry, DetectionResult, DetectorBackend, RawDetection};
pub use frame::Frame;
pub use inference::{infer_activity, ProbableActivity};
pub use ingest::{FrameSource, ImageFileSource, SyntheticSource};
pub use monitor::{Monitor, MonitorHandle, MonitorSettings};
pub use narrative::compose_narrative;
pub use normalize::{normalize, normalize_outcome, DetectionSet};
pub use pipeline::{Pipeline, PipelineConfig};
pub use session::SessionBuffer;
pub use storage::{InMemoryReportSink, JsonDirSink, ReportSink, SqliteReportStore};

/// Wall-clock capture time of a sample.
pub type Timestamp = DateTime<Local>;

/// Class label the detector uses for people.
pub const PERSON_CLASS: &str = "person";

// -------------------- Geometry --------------------

/// Axis-aligned box in pixel space. `x`/`y` is the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// `height / width`, or `None` for a degenerate box.
    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let ratio = self.height / self.width;
        ratio.is_finite().then_some(ratio)
    }

    /// Euclidean distance between the centers of two boxes.
    pub fn center_distance(&self, other: &BoundingBox) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }
}

// -------------------- Detections --------------------

/// One located person or object. Immutable once created; identity is only
/// meaningful inside the snapshot that owns it (no tracking across snapshots).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: String,
    pub kind: String,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
    pub captured_at: Timestamp,
}

impl Detection {
    pub fn is_person(&self) -> bool {
        self.kind == PERSON_CLASS
    }
}

// -------------------- Derived Signals --------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Posture {
    StandingErect,
    StandingRelaxed,
    Seated,
    CrouchedOrLying,
    Unknown,
}

impl Posture {
    pub const ALL: [Posture; 5] = [
        Posture::StandingErect,
        Posture::StandingRelaxed,
        Posture::Seated,
        Posture::CrouchedOrLying,
        Posture::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Posture::StandingErect => "standing-erect",
            Posture::StandingRelaxed => "standing-relaxed",
            Posture::Seated => "seated",
            Posture::CrouchedOrLying => "crouched-or-lying",
            Posture::Unknown => "unknown",
        }
    }

    pub fn is_standing(&self) -> bool {
        matches!(self, Posture::StandingErect | Posture::StandingRelaxed)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeadOrientation {
    LookingLeft,
    LookingRight,
    LookingUp,
    LookingDown,
    LookingForward,
    Neutral,
}

impl HeadOrientation {
    pub const ALL: [HeadOrientation; 6] = [
        HeadOrientation::LookingLeft,
        HeadOrientation::LookingRight,
        HeadOrientation::LookingUp,
        HeadOrientation::LookingDown,
        HeadOrientation::LookingForward,
        HeadOrientation::Neutral,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HeadOrientation::LookingLeft => "looking-left",
            HeadOrientation::LookingRight => "looking-right",
            HeadOrientation::LookingUp => "looking-up",
            HeadOrientation::LookingDown => "looking-down",
            HeadOrientation::LookingForward => "looking-forward",
            HeadOrientation::Neutral => "neutral",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HandActivity {
    Typing,
    Gesturing,
    Pointing,
    HandsInLap,
    HandsIdle,
    HoldingObject,
    Unknown,
}

impl HandActivity {
    pub const ALL: [HandActivity; 7] = [
        HandActivity::Typing,
        HandActivity::Gesturing,
        HandActivity::Pointing,
        HandActivity::HandsInLap,
        HandActivity::HandsIdle,
        HandActivity::HoldingObject,
        HandActivity::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HandActivity::Typing => "typing",
            HandActivity::Gesturing => "gesturing",
            HandActivity::Pointing => "pointing",
            HandActivity::HandsInLap => "hands-in-lap",
            HandActivity::HandsIdle => "hands-idle",
            HandActivity::HoldingObject => "holding-object",
            HandActivity::Unknown => "unknown",
        }
    }
}

/// Derived attributes for one person detection.
///
/// `confidence` is copied from the person detection. It is not a measure of how
/// well the behavioral heuristics fit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersonSignal {
    pub person_id: String,
    pub posture: Posture,
    pub head_orientation: HeadOrientation,
    pub hand_activity: HandActivity,
    pub probable_activity: ProbableActivity,
    pub confidence: f32,
}

/// Proximity relationship between one person and one object of the same snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub person_id: String,
    pub object_id: String,
    pub object_kind: String,
    pub distance: f32,
}

/// Scene-wide edge-density signal. Only present when intensity exceeds the
/// motion threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotionSignal {
    pub intensity: f64,
    pub description: String,
}

// -------------------- Snapshots --------------------

/// One scene sample. Built atomically by the pipeline and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub timestamp: Timestamp,
    pub persons: Vec<Detection>,
    pub objects: Vec<Detection>,
    pub motion_intensity: f64,
    pub interactions: Vec<Interaction>,
    pub person_signals: Vec<PersonSignal>,
}

impl Snapshot {
    /// Zero detections, zero motion, no interactions.
    pub fn empty(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            persons: Vec::new(),
            objects: Vec::new(),
            motion_intensity: 0.0,
            interactions: Vec::new(),
            person_signals: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.objects.is_empty()
    }

    /// Sum of the person-level activity signal.
    pub fn total_activity(&self) -> f64 {
        self.person_signals
            .iter()
            .map(|signal| signal.probable_activity.intensity())
            .sum()
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            total_persons: self.persons.len(),
            total_objects: self.objects.len(),
            total_interactions: self.interactions.len(),
            motion: self.motion_intensity,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub total_persons: usize,
    pub total_objects: usize,
    pub total_interactions: usize,
    pub motion: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapshotStatus {
    Ok,
    NoDetections,
}

/// Per-snapshot record emitted by the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotReport {
    pub snapshot: Snapshot,
    pub summary: SnapshotSummary,
    pub motion: Option<MotionSignal>,
    pub narrative: String,
    pub status: SnapshotStatus,
}

impl SnapshotReport {
    pub fn timestamp(&self) -> Timestamp {
        self.snapshot.timestamp
    }
}

// -------------------- Tests --------------------
