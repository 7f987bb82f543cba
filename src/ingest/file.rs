//! Local image frame source.
//!
//! `ImageFileSource` reads a single image file, or every PNG/JPEG image in a
//! directory in name order, and cycles through them. Each call decodes the
//! next file in memory and stamps it with the current wall-clock time.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::Local;

use super::FrameSource;
use crate::frame::Frame;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Cycles through local image files.
pub struct ImageFileSource {
    location: PathBuf,
    files: Vec<PathBuf>,
    cursor: usize,
    frames_captured: u64,
    last_error: Option<String>,
}

impl ImageFileSource {
    pub fn open<P: AsRef<Path>>(location: P) -> Result<Self> {
        let location = location.as_ref().to_path_buf();
        let files = if location.is_dir() {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(&location)
                .with_context(|| format!("failed to list {}", location.display()))?
            {
                let path = entry?.path();
                if path.is_file() && has_image_extension(&path) {
                    files.push(path);
                }
            }
            files.sort();
            files
        } else if location.is_file() {
            vec![location.clone()]
        } else {
            return Err(anyhow!("image source not found: {}", location.display()));
        };

        if files.is_empty() {
            return Err(anyhow!(
                "no PNG or JPEG images found in {}",
                location.display()
            ));
        }

        Ok(Self {
            location,
            files,
            cursor: 0,
            frames_captured: 0,
            last_error: None,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn frames_captured(&self) -> u64 {
        self.frames_captured
    }
}

impl FrameSource for ImageFileSource {
    fn next_frame(&mut self) -> Result<Frame> {
        let path = self.files[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.files.len();

        let decoded = image::open(&path)
            .with_context(|| format!("failed to decode {}", path.display()));
        match decoded {
            Ok(image) => {
                self.last_error = None;
                self.frames_captured += 1;
                Frame::from_image(image, Local::now())
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn describe(&self) -> String {
        format!("{} ({} images)", self.location.display(), self.files.len())
    }

    fn is_healthy(&self) -> bool {
        self.last_error.is_none()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn cycles_through_directory_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        RgbImage::from_pixel(4, 2, Rgb([255, 0, 0]))
            .save(dir.path().join("b.png"))
            .unwrap();
        RgbImage::from_pixel(2, 2, Rgb([0, 0, 255]))
            .save(dir.path().join("a.png"))
            .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let mut source = ImageFileSource::open(dir.path()).unwrap();
        assert_eq!(source.len(), 2);
        assert_eq!(source.next_frame().unwrap().width, 2);
        assert_eq!(source.next_frame().unwrap().width, 4);
        assert_eq!(source.next_frame().unwrap().width, 2);
        assert_eq!(source.frames_captured(), 3);
        assert!(source.is_healthy());
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ImageFileSource::open(dir.path()).is_err());
        assert!(ImageFileSource::open(dir.path().join("missing.png")).is_err());
    }
}
