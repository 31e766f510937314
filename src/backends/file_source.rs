// SPDX-License-Identifier: GPL-3.0-only

//! Static image file acting as a camera
//!
//! Handy for testing a printed code without a webcam, and for scanning
//! screenshots. The file is decoded again on every capture so that an
//! image being rewritten by another program is picked up between ticks.

use crate::backends::camera::{Frame, FrameSource};
use crate::constants::file_formats;
use crate::errors::{ScanError, ScanResult};
use std::path::PathBuf;
use tracing::{debug, info};

/// Frame source backed by an image on disk
#[derive(Debug, Clone)]
pub struct ImageFileSource {
    path: PathBuf,
}

impl ImageFileSource {
    /// Use `path` as the frame source
    ///
    /// Fails with `DeviceUnavailable` if the file is missing or its
    /// extension is not a supported image format.
    pub fn open(path: impl Into<PathBuf>) -> ScanResult<Self> {
        let path = path.into();

        if !path.is_file() {
            return Err(ScanError::DeviceUnavailable(format!(
                "image file not found: {}",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !file_formats::is_image_extension(&extension) {
            return Err(ScanError::DeviceUnavailable(format!(
                "unsupported image format: {}",
                path.display()
            )));
        }

        info!(path = %path.display(), "Using image file as frame source");
        Ok(Self { path })
    }
}

impl FrameSource for ImageFileSource {
    fn capture(&mut self) -> ScanResult<Frame> {
        let image = image::open(&self.path).map_err(|e| {
            ScanError::CaptureFailure(format!("failed to load {}: {}", self.path.display(), e))
        })?;

        let frame = Frame::from_image(&image);
        debug!(
            path = %self.path.display(),
            width = frame.width,
            height = frame.height,
            "Loaded image frame"
        );
        Ok(frame)
    }

    fn describe(&self) -> String {
        format!("image {}", self.path.display())
    }
}
