use std::collections::VecDeque;

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::DetectionResult;

enum ScriptStep {
    Detections(DetectionResult),
    Failure(String),
}

/// Replays a fixed queue of detector outputs, one per `detect` call.
///
/// Used to feed externally produced detections (a JSON file, an RPC bridge) and
/// to exercise detector failures. An exhausted script is an error unless
/// `repeat_last` is set.
pub struct ScriptedBackend {
    steps: VecDeque<ScriptStep>,
    last: Option<DetectionResult>,
    repeat_last: bool,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            steps: VecDeque::new(),
            last: None,
            repeat_last: false,
        }
    }

    pub fn from_results(results: impl IntoIterator<Item = DetectionResult>) -> Self {
        let mut backend = Self::new();
        for result in results {
            backend.push_result(result);
        }
        backend
    }

    /// Keep returning the last result once the queue is drained.
    pub fn repeat_last(mut self, enabled: bool) -> Self {
        self.repeat_last = enabled;
        self
    }

    pub fn push_result(&mut self, result: DetectionResult) {
        self.steps.push_back(ScriptStep::Detections(result));
    }

    pub fn push_failure(&mut self, message: &str) {
        self.steps.push_back(ScriptStep::Failure(message.to_string()));
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult> {
        match self.steps.pop_front() {
            Some(ScriptStep::Detections(mut result)) => {
                if result.frame_width == 0 || result.frame_height == 0 {
                    result.frame_width = width;
                    result.frame_height = height;
                }
                self.last = Some(result.clone());
                Ok(result)
            }
            Some(ScriptStep::Failure(message)) => Err(anyhow!("scripted failure: {}", message)),
            None => match (&self.last, self.repeat_last) {
                (Some(last), true) => Ok(last.clone()),
                _ => Err(anyhow!("detection script exhausted")),
            },
        }
    }
}
