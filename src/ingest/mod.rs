//! Frame ingestion sources.
//!
//! This module provides the sources the capture loop pulls frames from:
//! - Local image files or directories of images (`ImageFileSource`)
//! - Synthetic frames for tests and demos (`SyntheticSource`, `stub://` paths)
//!
//! Only local paths are accepted. Sources never write frames to disk; each
//! frame is handed to the pipeline and dropped after analysis.

use anyhow::{anyhow, Result};

use crate::frame::Frame;

pub mod file;
pub mod synthetic;

pub use file::ImageFileSource;
pub use synthetic::SyntheticSource;

/// A producer of frames for the capture loop.
pub trait FrameSource: Send {
    /// Capture the next frame.
    fn next_frame(&mut self) -> Result<Frame>;

    /// Human-readable description for logs.
    fn describe(&self) -> String;

    /// Check if the source is healthy.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Open a source from a configured location.
///
/// `stub://<name>` yields a synthetic source; anything else must be a local file
/// or directory path.
pub fn open_source(location: &str) -> Result<Box<dyn FrameSource>> {
    if location.trim().is_empty() {
        return Err(anyhow!("frame source must not be empty"));
    }
    if let Some(name) = location.strip_prefix("stub://") {
        return Ok(Box::new(SyntheticSource::new(name)));
    }
    if location.contains("://") {
        return Err(anyhow!(
            "frame ingestion only supports local paths or stub:// (got {})",
            location
        ));
    }
    Ok(Box::new(ImageFileSource::open(location)?))
}
