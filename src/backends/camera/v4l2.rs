// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 camera capture
//!
//! The camera is opened once per run. Every `capture()` starts a short
//! memory-mapped stream, skips a few warm-up frames and converts the next
//! buffer to RGBA. The stream is dropped again before returning, so no
//! buffers stay queued between poll ticks.

use super::FrameSource;
use super::format_converters;
use super::types::{CameraDevice, Frame, PixelFormat};
use crate::constants::capture as capture_consts;
use crate::errors::{ScanError, ScanResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// A V4L2 capture device acting as a frame source
pub struct V4l2Camera {
    device: Device,
    index: usize,
    name: String,
    format: Format,
    pixel_format: PixelFormat,
    warmup_frames: u32,
}

impl V4l2Camera {
    /// Open `/dev/video<index>` and negotiate a pixel format we can convert
    ///
    /// Fails with `DeviceUnavailable` if the node cannot be opened or the
    /// device offers no usable format.
    pub fn open(index: usize, warmup_frames: u32) -> ScanResult<Self> {
        let device = Device::new(index).map_err(|e| {
            ScanError::DeviceUnavailable(format!("cannot open /dev/video{}: {}", index, e))
        })?;

        let name = device
            .query_caps()
            .map(|caps| caps.card)
            .unwrap_or_else(|_| format!("video{}", index));

        let format = negotiate_format(&device).ok_or_else(|| {
            ScanError::DeviceUnavailable(format!(
                "{} offers no supported pixel format (need one of MJPG, YUYV, UYVY, RGB3, GREY)",
                name
            ))
        })?;

        let pixel_format = PixelFormat::from_fourcc(&format.fourcc.repr).ok_or_else(|| {
            ScanError::DeviceUnavailable(format!("{} switched to unsupported format", name))
        })?;

        info!(
            camera = index,
            name = %name,
            width = format.width,
            height = format.height,
            format = %pixel_format,
            "Opened V4L2 camera"
        );

        Ok(Self {
            device,
            index,
            name,
            format,
            pixel_format,
            warmup_frames,
        })
    }
}

impl FrameSource for V4l2Camera {
    fn capture(&mut self) -> ScanResult<Frame> {
        let start = Instant::now();

        let mut stream = MmapStream::with_buffers(
            &self.device,
            Type::VideoCapture,
            capture_consts::STREAM_BUFFER_COUNT,
        )
        .map_err(|e| ScanError::CaptureFailure(format!("failed to start stream: {}", e)))?;
        stream.set_timeout(capture_consts::DEQUEUE_TIMEOUT);

        for skipped in 0..self.warmup_frames {
            if let Err(e) = stream.next() {
                warn!(camera = self.index, skipped, error = %e, "Warm-up frame failed");
            }
        }

        let (buf, meta) = stream
            .next()
            .map_err(|e| ScanError::CaptureFailure(format!("failed to dequeue frame: {}", e)))?;

        let used = (meta.bytesused as usize).min(buf.len());
        if used == 0 {
            return Err(ScanError::CaptureFailure(
                "camera returned an empty buffer".to_string(),
            ));
        }

        let (rgba, width, height) = format_converters::to_rgba(
            self.pixel_format,
            &buf[..used],
            self.format.width,
            self.format.height,
            self.format.stride,
        )?;

        debug!(
            camera = self.index,
            sequence = meta.sequence,
            bytes = used,
            elapsed_ms = start.elapsed().as_millis(),
            "Captured frame"
        );

        Ok(Frame {
            width,
            height,
            stride: width * 4,
            data: Arc::from(rgba.into_boxed_slice()),
            captured_at: Instant::now(),
        })
    }

    fn describe(&self) -> String {
        format!("camera {} ({})", self.index, self.name)
    }
}

/// Pick the first preferred FourCC the device advertises and apply it
fn negotiate_format(device: &Device) -> Option<Format> {
    let current = device.format().ok()?;

    let advertised: Vec<FourCC> = device
        .enum_formats()
        .map(|formats| formats.into_iter().map(|desc| desc.fourcc).collect())
        .unwrap_or_default();

    for fourcc in capture_consts::PREFERRED_FOURCCS {
        let fourcc = FourCC::new(fourcc);
        if !advertised.contains(&fourcc) {
            continue;
        }

        let mut wanted = current;
        wanted.fourcc = fourcc;
        match device.set_format(&wanted) {
            Ok(applied) if applied.fourcc == fourcc => return Some(applied),
            Ok(applied) => {
                debug!(requested = ?fourcc, got = ?applied.fourcc, "Driver rejected format")
            }
            Err(e) => debug!(requested = ?fourcc, error = %e, "Could not set format"),
        }
    }

    // Fall back to whatever the device is already set to, if we can read it
    PixelFormat::from_fourcc(&current.fourcc.repr).map(|_| current)
}

/// Enumerate V4L2 video capture nodes
pub fn list_cameras() -> Vec<CameraDevice> {
    let mut cameras = Vec::new();

    for node in v4l::context::enum_devices() {
        let index = node.index();
        let path = node.path().to_string_lossy().to_string();

        let Ok(device) = Device::new(index) else {
            debug!(path = %path, "Skipping node that cannot be opened");
            continue;
        };

        let formats: Vec<String> = match device.enum_formats() {
            Ok(formats) => formats
                .into_iter()
                .map(|desc| desc.fourcc.str().unwrap_or("????").to_string())
                .collect(),
            Err(_) => Vec::new(),
        };

        // Metadata nodes expose no capture formats
        if formats.is_empty() {
            continue;
        }

        let name = node
            .name()
            .or_else(|| device.query_caps().ok().map(|caps| caps.card))
            .unwrap_or_else(|| format!("video{}", index));

        cameras.push(CameraDevice {
            index,
            name,
            path,
            formats,
        });
    }

    cameras.sort_by_key(|c| c.index);
    cameras
}
