//! Captured frames.
//!
//! A `Frame` owns one RGB8 image and the wall-clock time it was captured.
//! Detectors receive the raw pixels; the spatial analyzer works on the
//! grayscale view produced by `to_luma`.

use anyhow::{anyhow, Result};
use image::{DynamicImage, GrayImage, Luma};

use crate::detect::{DetectorBackend, DetectionResult};
use crate::Timestamp;

/// One RGB8 frame. Pixel rows are tightly packed, 3 bytes per pixel.
#[derive(Clone, Debug)]
pub struct Frame {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub captured_at: Timestamp,
}

impl Frame {
    /// Wrap raw RGB8 bytes. Fails when the buffer does not match the dimensions.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, captured_at: Timestamp) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(3))
            .ok_or_else(|| anyhow!("frame dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes for {}x{}, received {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
            captured_at,
        })
    }

    /// Convert a decoded image of any pixel layout into an RGB8 frame.
    pub fn from_image(image: DynamicImage, captured_at: Timestamp) -> Result<Self> {
        let rgb = image.into_rgb8();
        let (width, height) = rgb.dimensions();
        Self::new(rgb.into_raw(), width, height, captured_at)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Grayscale copy using ITU-R BT.601 weights.
    pub fn to_luma(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let offset = ((y as usize) * (self.width as usize) + x as usize) * 3;
            let r = self.pixels[offset] as f32;
            let g = self.pixels[offset + 1] as f32;
            let b = self.pixels[offset + 2] as f32;
            Luma([(0.299 * r + 0.587 * g + 0.114 * b).round().min(255.0) as u8])
        })
    }

    /// Run a detector over this frame's pixels.
    pub fn run_detector(&self, detector: &mut dyn DetectorBackend) -> Result<DetectionResult> {
        detector.detect(&self.pixels, self.width, self.height)
    }
}
