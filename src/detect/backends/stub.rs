use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{DetectionResult, RawDetection};
use crate::{BoundingBox, PERSON_CLASS};

const STUB_CONFIDENCE: f32 = 0.85;

/// Simulated detector used when no model is available.
///
/// Reports one person at `(w/4, h/4)` sized `w/4 x h/3`, whatever the pixels contain.
pub struct StubBackend {
    frames_seen: u64,
}

impl StubBackend {
    pub fn new() -> Self {
        Self { frames_seen: 0 }
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult> {
        self.frames_seen += 1;
        let (w, h) = (width as f32, height as f32);
        let person = RawDetection::new(
            PERSON_CLASS,
            STUB_CONFIDENCE,
            BoundingBox::new(
                (width / 4) as f32,
                (height / 4) as f32,
                (w / 4.0).floor(),
                (h / 3.0).floor(),
            ),
        );
        Ok(DetectionResult::new(width, height).with_detection(person))
    }
}
