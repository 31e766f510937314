// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion for raw capture buffers
//!
//! Everything downstream of a frame source works on RGBA, so each raw
//! device buffer goes through [`to_rgba`] exactly once.

use super::types::PixelFormat;
use crate::errors::{ScanError, ScanResult};
use image::ImageFormat;

/// Convert a raw device buffer to tightly packed RGBA
///
/// `stride` is the number of bytes per row in `data` for packed formats
/// (ignored for MJPEG). Returns the RGBA bytes and the real dimensions,
/// which for MJPEG come from the JPEG header.
pub fn to_rgba(
    format: PixelFormat,
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
) -> ScanResult<(Vec<u8>, u32, u32)> {
    if data.is_empty() {
        return Err(ScanError::CaptureFailure(
            "camera returned an empty buffer".to_string(),
        ));
    }

    let packed = || strip_stride(format, data, width, height, stride);
    let rgba = match format {
        PixelFormat::Mjpeg => return decode_mjpeg(data),
        PixelFormat::Yuyv => yuyv_to_rgba(&packed()?, width, height),
        PixelFormat::Uyvy => uyvy_to_rgba(&packed()?, width, height),
        PixelFormat::Rgb24 => rgb_to_rgba(&packed()?),
        PixelFormat::Gray8 => gray_to_rgba(&packed()?),
    };

    Ok((rgba, width, height))
}

/// MJPEG buffers are complete JPEG images; dimensions come from the header
fn decode_mjpeg(data: &[u8]) -> ScanResult<(Vec<u8>, u32, u32)> {
    let image = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map_err(|e| ScanError::CaptureFailure(format!("MJPEG decode failed: {}", e)))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok((rgba.into_raw(), width, height))
}

/// Copy rows of a packed buffer without their stride padding
fn strip_stride(
    format: PixelFormat,
    data: &[u8],
    width: u32,
    height: u32,
    stride: u32,
) -> ScanResult<Vec<u8>> {
    let bpp = format.bytes_per_pixel().unwrap_or(1);
    let row_len = width as usize * bpp;
    let stride = (stride as usize).max(row_len);
    let needed = stride * (height as usize).saturating_sub(1) + row_len;

    if data.len() < needed {
        return Err(ScanError::CaptureFailure(format!(
            "truncated {} buffer: {} bytes, expected at least {}",
            format,
            data.len(),
            needed
        )));
    }

    if stride == row_len {
        return Ok(data[..row_len * height as usize].to_vec());
    }

    let mut packed = Vec::with_capacity(row_len * height as usize);
    for row in data.chunks(stride).take(height as usize) {
        packed.extend_from_slice(&row[..row_len]);
    }
    Ok(packed)
}

/// Convert one YUV sample to RGBA (BT.601)
fn yuv_pixel(y: f32, u: f32, v: f32) -> [u8; 4] {
    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
    [r, g, b, 255]
}

/// Convert YUYV (YUV 4:2:2) to RGBA
///
/// YUYV format: Y0 U0 Y1 V0 - each 4-byte group encodes 2 pixels.
pub fn yuyv_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = width as usize * height as usize;
    let mut rgba = Vec::with_capacity(pixel_count.min(data.len() / 2) * 4);

    for chunk in data.chunks_exact(4) {
        let y0 = chunk[0] as f32;
        let u = chunk[1] as f32 - 128.0;
        let y1 = chunk[2] as f32;
        let v = chunk[3] as f32 - 128.0;

        for y in [y0, y1] {
            if rgba.len() >= pixel_count * 4 {
                break;
            }
            rgba.extend_from_slice(&yuv_pixel(y, u, v));
        }
    }

    rgba
}

/// Convert UYVY (YUV 4:2:2) to RGBA
///
/// UYVY format: U0 Y0 V0 Y1 - each 4-byte group encodes 2 pixels.
pub fn uyvy_to_rgba(data: &[u8], width: u32, height: u32) -> Vec<u8> {
    let pixel_count = width as usize * height as usize;
    let mut rgba = Vec::with_capacity(pixel_count.min(data.len() / 2) * 4);

    for chunk in data.chunks_exact(4) {
        let u = chunk[0] as f32 - 128.0;
        let y0 = chunk[1] as f32;
        let v = chunk[2] as f32 - 128.0;
        let y1 = chunk[3] as f32;

        for y in [y0, y1] {
            if rgba.len() >= pixel_count * 4 {
                break;
            }
            rgba.extend_from_slice(&yuv_pixel(y, u, v));
        }
    }

    rgba
}

/// Convert RGB to RGBA by adding alpha channel
pub fn rgb_to_rgba(rgb: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(rgb.len() / 3 * 4);
    for chunk in rgb.chunks_exact(3) {
        rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
    }
    rgba
}

/// Expand 8-bit grayscale to RGBA
pub fn gray_to_rgba(gray: &[u8]) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(gray.len() * 4);
    for &v in gray {
        rgba.extend_from_slice(&[v, v, v, 255]);
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yuyv_to_rgba() {
        // Y=128, U=128, V=128 -> neutral gray
        let yuyv = vec![128u8, 128, 128, 128];
        let rgba = yuyv_to_rgba(&yuyv, 2, 1);

        assert_eq!(rgba.len(), 8);
        assert!((rgba[0] as i32 - 128).abs() <= 1);
        assert!((rgba[1] as i32 - 128).abs() <= 1);
        assert!((rgba[2] as i32 - 128).abs() <= 1);
        assert_eq!(rgba[3], 255);
    }

    #[test]
    fn test_uyvy_to_rgba() {
        // Y=235 with neutral chroma -> near white
        let uyvy = vec![128u8, 235, 128, 235];
        let rgba = uyvy_to_rgba(&uyvy, 2, 1);

        assert_eq!(rgba.len(), 8);
        assert_eq!(&rgba[0..4], &[235, 235, 235, 255]);
        assert_eq!(&rgba[4..8], &[235, 235, 235, 255]);
    }

    #[test]
    fn test_huge_dimensions_are_bounded_by_data() {
        // u32::MAX * 2 pixels does not fit in a u32
        let yuyv = vec![128u8, 128, 128, 128];
        assert_eq!(yuyv_to_rgba(&yuyv, u32::MAX, 2).len(), 8);
        assert_eq!(uyvy_to_rgba(&yuyv, u32::MAX, 2).len(), 8);
    }

    #[test]
    fn test_rgb_to_rgba() {
        let rgb = vec![255u8, 0, 0, 0, 255, 0];
        let rgba = rgb_to_rgba(&rgb);
        assert_eq!(rgba, vec![255, 0, 0, 255, 0, 255, 0, 255]);
    }

    #[test]
    fn test_gray_with_stride_padding() {
        // 2x2 gray image, 3 bytes per row (1 byte padding)
        let data = vec![10u8, 20, 0, 30, 40, 0];
        let (rgba, w, h) = to_rgba(PixelFormat::Gray8, &data, 2, 2, 3).unwrap();

        assert_eq!((w, h), (2, 2));
        assert_eq!(rgba.len(), 16);
        assert_eq!(&rgba[8..12], &[30, 30, 30, 255]);
    }

    #[test]
    fn test_empty_buffer_is_capture_failure() {
        let err = to_rgba(PixelFormat::Yuyv, &[], 640, 480, 1280).unwrap_err();
        assert!(matches!(err, ScanError::CaptureFailure(_)));
    }

    #[test]
    fn test_truncated_buffer_is_capture_failure() {
        let err = to_rgba(PixelFormat::Yuyv, &[0u8; 100], 640, 480, 1280).unwrap_err();
        assert!(matches!(err, ScanError::CaptureFailure(ref msg) if msg.contains("truncated")));
    }

    #[test]
    fn test_corrupt_mjpeg_is_capture_failure() {
        let err = to_rgba(PixelFormat::Mjpeg, &[0xFF, 0xD8, 0x00], 640, 480, 0).unwrap_err();
        assert!(matches!(err, ScanError::CaptureFailure(_)));
    }
}
