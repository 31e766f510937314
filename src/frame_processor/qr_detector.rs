// SPDX-License-Identifier: GPL-3.0-only

//! QR code detection
//!
//! This module implements QR code decoding using the rqrr crate.
//! Frames are converted to grayscale and downscaled before grid detection,
//! then every detected grid is decoded on its own.

use super::FrameDecoder;
use crate::backends::camera::Frame;
use crate::constants::detection;
use image::GrayImage;
use image::imageops::{self, FilterType};
use tracing::{debug, trace, warn};

/// QR code detector
///
/// Optimized for webcam frames: large frames are downscaled first since
/// grid detection cost grows with pixel count.
#[derive(Debug, Clone)]
pub struct QrDetector {
    /// Maximum dimension for processing (0 disables downscaling)
    max_dimension: u32,
}

impl Default for QrDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl QrDetector {
    /// Create a new QR detector with default settings
    pub fn new() -> Self {
        Self {
            max_dimension: detection::DEFAULT_MAX_DIMENSION,
        }
    }

    /// Create a QR detector with custom max dimension
    pub fn with_max_dimension(max_dimension: u32) -> Self {
        Self { max_dimension }
    }
}

impl FrameDecoder for QrDetector {
    fn decode(&self, frame: &Frame) -> Vec<String> {
        detect_sync(frame, self.max_dimension)
    }
}

/// Synchronous QR detection (runs on the poll loop's blocking worker)
fn detect_sync(frame: &Frame, max_dimension: u32) -> Vec<String> {
    let start = std::time::Instant::now();

    let gray = match frame.to_luma() {
        Ok(gray) => gray,
        Err(e) => {
            warn!(error = %e, "Frame could not be converted to grayscale");
            return Vec::new();
        }
    };

    let gray = downscale(gray, max_dimension);
    let (proc_width, proc_height) = gray.dimensions();
    trace!(
        proc_width,
        proc_height,
        conversion_ms = start.elapsed().as_millis(),
        "Prepared grayscale image for processing"
    );

    let mut prepared =
        rqrr::PreparedImage::prepare_from_greyscale(proc_width as usize, proc_height as usize, |x, y| {
            gray.get_pixel(x as u32, y as u32).0[0]
        });
    let grids = prepared.detect_grids();

    let mut payloads = Vec::with_capacity(grids.len());
    for grid in grids {
        match grid.decode() {
            Ok((_meta, content)) if content.is_empty() => {
                trace!("Skipping QR code with empty payload");
            }
            Ok((_meta, content)) => {
                debug!(content = %content, "Decoded QR code");
                payloads.push(content);
            }
            Err(e) => {
                debug!(error = ?e, "Failed to decode QR grid");
            }
        }
    }

    if !payloads.is_empty() {
        debug!(
            count = payloads.len(),
            total_ms = start.elapsed().as_millis(),
            "QR detection found codes"
        );
    }

    payloads
}

/// Shrink the image so its longest side is at most `max_dimension`
fn downscale(gray: GrayImage, max_dimension: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if max_dimension == 0 || (width <= max_dimension && height <= max_dimension) {
        return gray;
    }

    let scale = (width as f32 / max_dimension as f32).max(height as f32 / max_dimension as f32);
    let new_width = ((width as f32 / scale) as u32).clamp(1, max_dimension);
    let new_height = ((height as f32 / scale) as u32).clamp(1, max_dimension);

    imageops::resize(&gray, new_width, new_height, FilterType::Triangle)
}
