//! Detection Record Normalizer.
//!
//! Converts a detector's raw per-frame output into a canonical `DetectionSet`
//! split into persons and objects. A detector failure never propagates: it is
//! logged and replaced by an empty set.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::detect::{DetectionResult, RawDetection};
use crate::{BoundingBox, Detection, Timestamp, PERSON_CLASS};

/// Canonical detections for one frame, in detector order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionSet {
    pub timestamp: Timestamp,
    pub frame_width: u32,
    pub frame_height: u32,
    pub persons: Vec<Detection>,
    pub objects: Vec<Detection>,
}

impl DetectionSet {
    /// Zero detections. Used whenever input is unavailable.
    pub fn empty(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            frame_width: 0,
            frame_height: 0,
            persons: Vec::new(),
            objects: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty() && self.objects.is_empty()
    }
}

/// Normalize one detector result.
///
/// Detections with non-finite values or a confidence below `min_confidence` are
/// dropped. Confidence is clamped to `[0, 1]` and negative box extents to zero.
/// Ids are `"{class}_{index}"` where `index` is the position in the raw output.
pub fn normalize(result: &DetectionResult, captured_at: Timestamp, min_confidence: f32) -> DetectionSet {
    let mut set = DetectionSet {
        timestamp: captured_at,
        frame_width: result.frame_width,
        frame_height: result.frame_height,
        persons: Vec::new(),
        objects: Vec::new(),
    };

    for (index, raw) in result.detections.iter().enumerate() {
        let Some(detection) = canonicalize(raw, index, captured_at, min_confidence) else {
            continue;
        };
        if detection.is_person() {
            set.persons.push(detection);
        } else {
            set.objects.push(detection);
        }
    }

    log::debug!(
        "normalized {} raw detections into {} persons and {} objects",
        result.detections.len(),
        set.persons.len(),
        set.objects.len()
    );
    set
}

/// Normalize a detector outcome, substituting an empty set on failure.
pub fn normalize_outcome(
    outcome: Result<DetectionResult>,
    captured_at: Timestamp,
    min_confidence: f32,
) -> DetectionSet {
    match outcome {
        Ok(result) => normalize(&result, captured_at, min_confidence),
        Err(err) => {
            log::warn!("detector input unavailable, using empty snapshot: {:#}", err);
            DetectionSet::empty(captured_at)
        }
    }
}

fn canonicalize(
    raw: &RawDetection,
    index: usize,
    captured_at: Timestamp,
    min_confidence: f32,
) -> Option<Detection> {
    let b = raw.bounding_box;
    let finite = raw.confidence.is_finite()
        && b.x.is_finite()
        && b.y.is_finite()
        && b.width.is_finite()
        && b.height.is_finite();
    if !finite {
        log::debug!("dropping non-finite detection {} ({})", index, raw.class_label);
        return None;
    }

    let confidence = raw.confidence.clamp(0.0, 1.0);
    if confidence < min_confidence {
        return None;
    }

    let kind = raw.class_label.trim().to_string();
    Some(Detection {
        id: format!("{}_{}", kind, index),
        kind,
        confidence,
        bounding_box: BoundingBox::new(b.x, b.y, b.width.max(0.0), b.height.max(0.0)),
        captured_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use chrono::Local;

    fn raw(label: &str, confidence: f32, bbox: BoundingBox) -> RawDetection {
        RawDetection::new(label, confidence, bbox)
    }

    #[test]
    fn splits_persons_and_objects() {
        let result = DetectionResult::new(1920, 1080)
            .with_detection(raw(PERSON_CLASS, 0.9, BoundingBox::new(0.0, 0.0, 100.0, 250.0)))
            .with_detection(raw("laptop", 0.8, BoundingBox::new(50.0, 50.0, 60.0, 40.0)))
            .with_detection(raw(PERSON_CLASS, 0.7, BoundingBox::new(500.0, 0.0, 90.0, 200.0)));
        let set = normalize(&result, Local::now(), 0.5);
        assert_eq!(set.persons.len(), 2);
        assert_eq!(set.objects.len(), 1);
        assert_eq!(set.persons[0].id, "person_0");
        assert_eq!(set.persons[1].id, "person_2");
        assert_eq!(set.objects[0].id, "laptop_1");
        assert_eq!((set.frame_width, set.frame_height), (1920, 1080));
    }

    #[test]
    fn drops_low_confidence_and_non_finite() {
        let result = DetectionResult::new(640, 480)
            .with_detection(raw("cup", 0.3, BoundingBox::new(0.0, 0.0, 10.0, 10.0)))
            .with_detection(raw("cup", f32::NAN, BoundingBox::new(0.0, 0.0, 10.0, 10.0)))
            .with_detection(raw("cup", 0.9, BoundingBox::new(0.0, f32::INFINITY, 10.0, 10.0)));
        assert!(normalize(&result, Local::now(), 0.5).is_empty());
    }

    #[test]
    fn clamps_confidence_and_extents() {
        let result = DetectionResult::new(640, 480)
            .with_detection(raw("book", 1.4, BoundingBox::new(3.0, 4.0, -5.0, 12.0)));
        let set = normalize(&result, Local::now(), 0.5);
        let book = &set.objects[0];
        assert_eq!(book.confidence, 1.0);
        assert_eq!(book.bounding_box.width, 0.0);
        assert_eq!(book.bounding_box.height, 12.0);
    }

    #[test]
    fn detector_failure_yields_empty_set() {
        let now = Local::now();
        let set = normalize_outcome(Err(anyhow!("camera unplugged")), now, 0.5);
        assert!(set.is_empty());
        assert_eq!(set.timestamp, now);
    }
}
