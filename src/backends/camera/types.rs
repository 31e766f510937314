// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for frame sources

use crate::constants::file_formats;
use crate::errors::{ScanError, ScanResult};
use image::{DynamicImage, GrayImage, ImageBuffer, RgbaImage};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// A single captured frame
///
/// Pixel data is always RGBA after leaving a frame source; sources convert
/// whatever the device delivers before handing the frame out.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    /// RGBA pixels, `stride` bytes per row
    pub data: Arc<[u8]>,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Timestamp when the frame was captured
    pub captured_at: Instant,
}

impl Frame {
    /// Create a frame from tightly packed RGBA pixels
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> ScanResult<Self> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(ScanError::CaptureFailure(format!(
                "RGBA buffer has {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }

        Ok(Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            stride: width * 4,
            captured_at: Instant::now(),
        })
    }

    /// Create a frame from a decoded image
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();

        Self {
            width,
            height,
            data: Arc::from(rgba.into_raw().into_boxed_slice()),
            stride: width * 4,
            captured_at: Instant::now(),
        }
    }

    /// Copy RGBA data without stride padding
    pub fn rgba_without_stride(&self) -> Vec<u8> {
        let width = self.width as usize;
        let height = self.height as usize;
        let stride = self.stride as usize;

        if stride == width * 4 {
            return self.data.get(..width * height * 4).unwrap_or(&self.data[..]).to_vec();
        }

        let mut result = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            let row_start = y * stride;
            let row_end = row_start + width * 4;
            if row_end <= self.data.len() {
                result.extend_from_slice(&self.data[row_start..row_end]);
            }
        }

        result
    }

    /// View the frame as an `image` RGBA buffer
    pub fn to_rgba_image(&self) -> ScanResult<RgbaImage> {
        ImageBuffer::from_raw(self.width, self.height, self.rgba_without_stride()).ok_or_else(
            || {
                ScanError::CaptureFailure(format!(
                    "frame buffer too short for {}x{}",
                    self.width, self.height
                ))
            },
        )
    }

    /// Convert the frame to 8-bit grayscale
    pub fn to_luma(&self) -> ScanResult<GrayImage> {
        Ok(DynamicImage::ImageRgba8(self.to_rgba_image()?).to_luma8())
    }

    /// Save the frame to an image file, format chosen by extension
    ///
    /// Parent directories are created. Alpha is dropped so that formats
    /// without an alpha channel (JPEG) can be written.
    pub fn save(&self, path: &Path) -> ScanResult<()> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !file_formats::is_image_extension(&extension) {
            return Err(ScanError::Io(format!(
                "unsupported image extension for {}",
                path.display()
            )));
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let rgb = DynamicImage::ImageRgba8(self.to_rgba_image()?).to_rgb8();
        rgb.save(path)
            .map_err(|e| ScanError::Io(format!("failed to write {}: {}", path.display(), e)))?;

        debug!(path = %path.display(), width = self.width, height = self.height, "Frame saved");
        Ok(())
    }
}

/// Pixel layout of a raw buffer delivered by a capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Motion JPEG, one JPEG image per buffer
    Mjpeg,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    Yuyv,
    /// UYVY - Packed 4:2:2 (U Y0 V Y1 interleaved)
    Uyvy,
    /// RGB24 - 3 bytes per pixel
    Rgb24,
    /// Gray8 - single 8-bit channel
    Gray8,
}

impl PixelFormat {
    /// Parse a V4L2 FourCC code
    pub fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"MJPG" | b"JPEG" => Some(Self::Mjpeg),
            b"YUYV" | b"YUY2" => Some(Self::Yuyv),
            b"UYVY" => Some(Self::Uyvy),
            b"RGB3" => Some(Self::Rgb24),
            b"GREY" => Some(Self::Gray8),
            _ => None,
        }
    }

    /// Bytes per pixel for packed formats (None for compressed formats)
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            Self::Mjpeg => None,
            Self::Yuyv | Self::Uyvy => Some(2),
            Self::Rgb24 => Some(3),
            Self::Gray8 => Some(1),
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mjpeg => "MJPG",
            Self::Yuyv => "YUYV",
            Self::Uyvy => "UYVY",
            Self::Rgb24 => "RGB3",
            Self::Gray8 => "GREY",
        };
        write!(f, "{}", name)
    }
}

/// Camera device as reported by enumeration
#[derive(Debug, Clone)]
pub struct CameraDevice {
    /// Index usable with `--camera`
    pub index: usize,
    /// Device name (V4L2 card)
    pub name: String,
    /// Device node (e.g., /dev/video0)
    pub path: String,
    /// FourCC codes the device advertises
    pub formats: Vec<String>,
}
