//! Spatial Analyzer.
//!
//! Derives per-person signals (posture, head orientation, hand activity),
//! person/object interactions and a scene-wide motion intensity from a single
//! frame's detections.
//!
//! These are position and shape heuristics. Head orientation follows the box's
//! absolute position in the reference resolution, not actual head pose, and hand
//! activity follows the box's shape. Neither is behavioral ground truth.

use image::GrayImage;
use imageproc::edges::canny;
use serde::{Deserialize, Serialize};

use crate::inference::infer_activity;
use crate::{
    BoundingBox, Detection, HandActivity, HeadOrientation, Interaction, MotionSignal,
    PersonSignal, Posture,
};

pub const STANDING_ERECT_RATIO: f32 = 2.2;
pub const STANDING_RELAXED_RATIO: f32 = 1.8;
pub const SEATED_RATIO: f32 = 1.3;

/// Interactions require center distance strictly below this many pixels.
pub const INTERACTION_DISTANCE: f32 = 200.0;
pub const MAX_INTERACTION_PERSONS: usize = 3;
pub const MAX_INTERACTION_OBJECTS: usize = 3;
pub const MAX_INTERACTIONS: usize = 5;

/// Canny hysteresis thresholds for the edge-density measure.
pub const CANNY_LOW_THRESHOLD: f32 = 50.0;
pub const CANNY_HIGH_THRESHOLD: f32 = 150.0;
/// Motion is only reported above this intensity.
pub const MOTION_THRESHOLD: f64 = 1.0;

/// Upper-screen band (pixels from the top) where a standing person counts as pointing.
const POINTING_MAX_Y: f32 = 300.0;
const SEATED_WIDE_FACTOR: f32 = 0.8;
const STANDING_TALL_FACTOR: f32 = 2.0;
const LOW_BAND: f32 = 0.3;
const HIGH_BAND: f32 = 0.7;

/// Resolution the head-orientation bands are computed against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    pub width: u32,
    pub height: u32,
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

// -------------------- Person Signals --------------------

/// Posture from the box aspect ratio (`height / width`).
pub fn classify_posture(bbox: &BoundingBox) -> Posture {
    match bbox.aspect_ratio() {
        None => Posture::Unknown,
        Some(ratio) if ratio > STANDING_ERECT_RATIO => Posture::StandingErect,
        Some(ratio) if ratio > STANDING_RELAXED_RATIO => Posture::StandingRelaxed,
        Some(ratio) if ratio > SEATED_RATIO => Posture::Seated,
        Some(_) => Posture::CrouchedOrLying,
    }
}

/// Head orientation from the box's top-left corner.
///
/// The horizontal band wins over the vertical one. Positions are mirrored: a
/// person in the left band of the camera image is looking right.
pub fn head_orientation(bbox: &BoundingBox, reference: ReferenceFrame) -> HeadOrientation {
    if reference.width == 0 || reference.height == 0 {
        return HeadOrientation::Neutral;
    }
    let width = reference.width as f32;
    let height = reference.height as f32;

    if bbox.x < width * LOW_BAND {
        HeadOrientation::LookingRight
    } else if bbox.x > width * HIGH_BAND {
        HeadOrientation::LookingLeft
    } else if bbox.y < height * LOW_BAND {
        HeadOrientation::LookingUp
    } else if bbox.y > height * HIGH_BAND {
        HeadOrientation::LookingDown
    } else {
        HeadOrientation::LookingForward
    }
}

/// Hand activity from posture and box shape.
pub fn hand_activity(posture: Posture, bbox: &BoundingBox) -> HandActivity {
    match posture {
        Posture::Seated if bbox.width > bbox.height * SEATED_WIDE_FACTOR => HandActivity::Typing,
        Posture::Seated => HandActivity::HandsInLap,
        Posture::StandingErect | Posture::StandingRelaxed => {
            if bbox.height > bbox.width * STANDING_TALL_FACTOR {
                HandActivity::Gesturing
            } else if bbox.y < POINTING_MAX_Y {
                HandActivity::Pointing
            } else {
                HandActivity::HandsIdle
            }
        }
        Posture::CrouchedOrLying => HandActivity::HoldingObject,
        Posture::Unknown => HandActivity::Unknown,
    }
}

/// Full signal set for one person detection.
pub fn analyze_person(person: &Detection, reference: ReferenceFrame) -> PersonSignal {
    let bbox = &person.bounding_box;
    let posture = classify_posture(bbox);
    let head_orientation = head_orientation(bbox, reference);
    let hand_activity = hand_activity(posture, bbox);
    PersonSignal {
        person_id: person.id.clone(),
        posture,
        head_orientation,
        hand_activity,
        probable_activity: infer_activity(posture, hand_activity, head_orientation),
        confidence: person.confidence,
    }
}

// -------------------- Interactions --------------------

/// Person/object pairs closer than `INTERACTION_DISTANCE`.
///
/// Only the first 3 persons and first 3 objects are considered, in detection
/// order, and enumeration stops once 5 interactions are found.
pub fn find_interactions(persons: &[Detection], objects: &[Detection]) -> Vec<Interaction> {
    let mut interactions = Vec::new();
    for person in persons.iter().take(MAX_INTERACTION_PERSONS) {
        for object in objects.iter().take(MAX_INTERACTION_OBJECTS) {
            let distance = person.bounding_box.center_distance(&object.bounding_box);
            if distance < INTERACTION_DISTANCE {
                interactions.push(Interaction {
                    person_id: person.id.clone(),
                    object_id: object.id.clone(),
                    object_kind: object.kind.clone(),
                    distance,
                });
                if interactions.len() >= MAX_INTERACTIONS {
                    return interactions;
                }
            }
        }
    }
    interactions
}

// -------------------- Motion --------------------

/// Edge density of a grayscale frame, as a percentage rounded to 2 decimals.
///
/// Edges come from Canny with hysteresis thresholds of 50 and 150.
/// Frames smaller than 3x3 score zero.
pub fn motion_intensity(luma: &GrayImage) -> f64 {
    let (width, height) = luma.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let edges = canny(luma, CANNY_LOW_THRESHOLD, CANNY_HIGH_THRESHOLD);
    let edge_pixels = edges.pixels().filter(|pixel| pixel[0] > 0).count();

    let total = (width as u64) * (height as u64);
    let percent = edge_pixels as f64 / total as f64 * 100.0;
    (percent * 100.0).round() / 100.0
}

/// Motion signal, only when `intensity` exceeds the motion threshold.
pub fn motion_signal(intensity: f64) -> Option<MotionSignal> {
    if intensity > MOTION_THRESHOLD {
        Some(MotionSignal {
            intensity,
            description: format!("Movement detected with intensity {:.2}.", intensity),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use image::Luma;

    fn detection(id: &str, kind: &str, bbox: BoundingBox) -> Detection {
        Detection {
            id: id.to_string(),
            kind: kind.to_string(),
            confidence: 0.9,
            bounding_box: bbox,
            captured_at: Local::now(),
        }
    }

    #[test]
    fn posture_thresholds_are_strict() {
        let with_height = |h: f32| BoundingBox::new(0.0, 0.0, 10.0, h);
        assert_eq!(classify_posture(&with_height(25.0)), Posture::StandingErect);
        assert_eq!(classify_posture(&with_height(22.0)), Posture::StandingRelaxed);
        assert_eq!(classify_posture(&with_height(18.0)), Posture::Seated);
        assert_eq!(classify_posture(&with_height(13.0)), Posture::CrouchedOrLying);
        assert_eq!(
            classify_posture(&BoundingBox::new(0.0, 0.0, 0.0, 50.0)),
            Posture::Unknown
        );
    }

    #[test]
    fn head_orientation_bands() {
        let reference = ReferenceFrame::default();
        let at = |x: f32, y: f32| head_orientation(&BoundingBox::new(x, y, 10.0, 10.0), reference);
        assert_eq!(at(100.0, 500.0), HeadOrientation::LookingRight);
        assert_eq!(at(1500.0, 500.0), HeadOrientation::LookingLeft);
        assert_eq!(at(900.0, 100.0), HeadOrientation::LookingUp);
        assert_eq!(at(900.0, 900.0), HeadOrientation::LookingDown);
        assert_eq!(at(900.0, 500.0), HeadOrientation::LookingForward);
        let zero = ReferenceFrame {
            width: 0,
            height: 0,
        };
        assert_eq!(
            head_orientation(&BoundingBox::new(0.0, 0.0, 1.0, 1.0), zero),
            HeadOrientation::Neutral
        );
    }

    #[test]
    fn hand_activity_follows_posture_and_shape() {
        let wide = BoundingBox::new(0.0, 500.0, 100.0, 110.0);
        assert_eq!(hand_activity(Posture::Seated, &wide), HandActivity::Typing);
        let narrow = BoundingBox::new(0.0, 500.0, 100.0, 150.0);
        assert_eq!(hand_activity(Posture::Seated, &narrow), HandActivity::HandsInLap);
        let tall = BoundingBox::new(0.0, 500.0, 100.0, 250.0);
        assert_eq!(
            hand_activity(Posture::StandingErect, &tall),
            HandActivity::Gesturing
        );
        let high = BoundingBox::new(0.0, 100.0, 100.0, 190.0);
        assert_eq!(
            hand_activity(Posture::StandingRelaxed, &high),
            HandActivity::Pointing
        );
        let low = BoundingBox::new(0.0, 400.0, 100.0, 190.0);
        assert_eq!(
            hand_activity(Posture::StandingRelaxed, &low),
            HandActivity::HandsIdle
        );
        assert_eq!(
            hand_activity(Posture::CrouchedOrLying, &low),
            HandActivity::HoldingObject
        );
        assert_eq!(hand_activity(Posture::Unknown, &low), HandActivity::Unknown);
    }

    #[test]
    fn interactions_respect_enumeration_cap() {
        let persons: Vec<Detection> = (0..3)
            .map(|i| {
                detection(
                    &format!("person_{i}"),
                    "person",
                    BoundingBox::new(100.0 + i as f32 * 10.0, 100.0, 20.0, 40.0),
                )
            })
            .collect();
        let objects: Vec<Detection> = (0..3)
            .map(|i| {
                detection(
                    &format!("cup_{i}"),
                    "cup",
                    BoundingBox::new(110.0 + i as f32 * 10.0, 110.0, 10.0, 10.0),
                )
            })
            .collect();

        let interactions = find_interactions(&persons, &objects);
        assert_eq!(interactions.len(), 5);
        let pairs: Vec<(&str, &str)> = interactions
            .iter()
            .map(|i| (i.person_id.as_str(), i.object_id.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("person_0", "cup_0"),
                ("person_0", "cup_1"),
                ("person_0", "cup_2"),
                ("person_1", "cup_0"),
                ("person_1", "cup_1"),
            ]
        );
        assert!(interactions.iter().all(|i| i.distance < 50.0));
    }

    #[test]
    fn distant_pairs_are_not_interactions() {
        let persons = vec![detection("person_0", "person", BoundingBox::new(0.0, 0.0, 10.0, 10.0))];
        let objects = vec![
            detection("tv_1", "tv", BoundingBox::new(200.0, 0.0, 10.0, 10.0)),
            detection("cup_2", "cup", BoundingBox::new(100.0, 0.0, 10.0, 10.0)),
        ];
        let interactions = find_interactions(&persons, &objects);
        assert_eq!(interactions.len(), 1);
        assert_eq!(interactions[0].object_kind, "cup");
    }

    #[test]
    fn flat_frame_has_no_motion() {
        let flat = GrayImage::from_pixel(16, 16, Luma([120]));
        assert_eq!(motion_intensity(&flat), 0.0);
        assert!(motion_signal(motion_intensity(&flat)).is_none());
    }

    #[test]
    fn bright_square_is_measured_as_edges() {
        // White 32x32 square centred in a black 64x64 frame: only its outline is edge.
        let square = GrayImage::from_fn(64, 64, |x, y| {
            if (16..48).contains(&x) && (16..48).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        });
        let intensity = motion_intensity(&square);
        assert!(intensity > MOTION_THRESHOLD, "intensity {intensity}");
        assert!(intensity < 10.0, "intensity {intensity}");
        assert_eq!(intensity, (intensity * 100.0).round() / 100.0);

        let signal = motion_signal(intensity).unwrap();
        assert!(signal.description.contains(&format!("{:.2}", intensity)));
    }

    #[test]
    fn motion_signal_requires_intensity_above_threshold() {
        assert!(motion_signal(1.0).is_none());
        let signal = motion_signal(16.0).unwrap();
        assert_eq!(signal.description, "Movement detected with intensity 16.00.");
    }

    #[test]
    fn tiny_frames_score_zero() {
        let tiny = GrayImage::from_pixel(2, 2, Luma([255]));
        assert_eq!(motion_intensity(&tiny), 0.0);
    }
}
