use serde::{Deserialize, Serialize};

use crate::BoundingBox;

/// Output of one detector run over one frame.
///
/// Boxes are in the pixel space of `frame_width` x `frame_height`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub frame_width: u32,
    pub frame_height: u32,
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

impl DetectionResult {
    pub fn new(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            detections: Vec::new(),
        }
    }

    pub fn with_detection(mut self, detection: RawDetection) -> Self {
        self.detections.push(detection);
        self
    }
}

/// One class/confidence/box tuple as reported by an external detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub class_label: String,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

impl RawDetection {
    pub fn new(class_label: &str, confidence: f32, bounding_box: BoundingBox) -> Self {
        Self {
            class_label: class_label.to_string(),
            confidence,
            bounding_box,
        }
    }
}

/// COCO-80 class names in model output order.
pub const COCO_CLASSES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorbike",
    "aeroplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "sofa",
    "pottedplant",
    "bed",
    "diningtable",
    "toilet",
    "tvmonitor",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

/// Class name for a COCO class index; out-of-range ids become `unknown_{id}`.
pub fn coco_class_name(class_id: usize) -> String {
    COCO_CLASSES
        .get(class_id)
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("unknown_{}", class_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coco_names_cover_known_and_unknown_ids() {
        assert_eq!(coco_class_name(0), "person");
        assert_eq!(coco_class_name(63), "laptop");
        assert_eq!(coco_class_name(80), "unknown_80");
    }

    #[test]
    fn detection_result_parses_without_detections() {
        let result: DetectionResult =
            serde_json::from_str(r#"{"frame_width": 1920, "frame_height": 1080}"#).unwrap();
        assert_eq!(result.frame_width, 1920);
        assert!(result.detections.is_empty());
    }
}
