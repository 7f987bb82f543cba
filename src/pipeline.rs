//! Detection-to-narrative pipeline.
//!
//! Glues Normalizer → Spatial Analyzer → Activity Inference Engine → Narrative
//! Composer. `Pipeline` holds only immutable settings, so one instance can be
//! shared across threads and invoked concurrently on independent frames.

use anyhow::Result;
use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::detect::DetectionResult;
use crate::narrative::compose_narrative;
use crate::normalize::{normalize_outcome, DetectionSet};
use crate::spatial::{analyze_person, find_interactions, motion_intensity, motion_signal, ReferenceFrame};
use crate::{MotionSignal, Snapshot, SnapshotReport, SnapshotStatus, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Detections below this confidence are discarded by the normalizer.
    pub min_confidence: f32,
    /// Resolution used for the head-orientation bands.
    pub reference: ReferenceFrame,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            reference: ReferenceFrame::default(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run a detector outcome through every stage. A failed outcome yields an
    /// empty snapshot report rather than an error.
    pub fn process(
        &self,
        outcome: Result<DetectionResult>,
        luma: Option<&GrayImage>,
        captured_at: Timestamp,
    ) -> SnapshotReport {
        let detections = normalize_outcome(outcome, captured_at, self.config.min_confidence);
        self.analyze(detections, luma)
    }

    /// Analyze an already normalized detection set.
    pub fn analyze(&self, detections: DetectionSet, luma: Option<&GrayImage>) -> SnapshotReport {
        let intensity = luma.map(motion_intensity).unwrap_or(0.0);
        let motion = motion_signal(intensity);

        let person_signals = detections
            .persons
            .iter()
            .map(|person| analyze_person(person, self.config.reference))
            .collect();
        let interactions = find_interactions(&detections.persons, &detections.objects);

        let snapshot = Snapshot {
            timestamp: detections.timestamp,
            persons: detections.persons,
            objects: detections.objects,
            motion_intensity: motion.as_ref().map(|m| m.intensity).unwrap_or(0.0),
            interactions,
            person_signals,
        };
        build_report(snapshot, motion)
    }
}

/// Wrap a finished snapshot with its summary, narrative and status.
pub fn build_report(snapshot: Snapshot, motion: Option<MotionSignal>) -> SnapshotReport {
    let narrative = compose_narrative(&snapshot);
    let status = if snapshot.is_empty() {
        SnapshotStatus::NoDetections
    } else {
        SnapshotStatus::Ok
    };
    SnapshotReport {
        summary: snapshot.summary(),
        snapshot,
        motion,
        narrative,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::RawDetection;
    use crate::{BoundingBox, Posture};
    use anyhow::anyhow;
    use chrono::Local;
    use image::Luma;

    #[test]
    fn failed_detector_produces_empty_report() {
        let report = Pipeline::default().process(Err(anyhow!("timeout")), None, Local::now());
        assert_eq!(report.status, SnapshotStatus::NoDetections);
        assert!(report.snapshot.is_empty());
        assert!(report.motion.is_none());
        assert!(report.narrative.starts_with("No person detected"));
    }

    #[test]
    fn low_motion_is_reported_as_zero() {
        let flat = GrayImage::from_pixel(8, 8, Luma([40]));
        let result = DetectionResult::new(1920, 1080).with_detection(RawDetection::new(
            "person",
            0.9,
            BoundingBox::new(800.0, 400.0, 200.0, 300.0),
        ));
        let report = Pipeline::default().process(Ok(result), Some(&flat), Local::now());
        assert_eq!(report.snapshot.motion_intensity, 0.0);
        assert_eq!(report.status, SnapshotStatus::Ok);
        assert_eq!(report.snapshot.person_signals[0].posture, Posture::Seated);
        assert_eq!(report.snapshot.person_signals[0].confidence, 0.9);
    }
}
