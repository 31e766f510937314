// SPDX-License-Identifier: GPL-3.0-only

//! Frame source abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │      Scanner        │  ← Poll loop with deadline
//! └──────────┬──────────┘
//!            │ capture()
//!            ▼
//! ┌─────────────────────┐
//! │  FrameSource Trait  │  ← "give me one frame"
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐  ┌─────────┐
//!   │ V4L2 │  │  Image  │
//!   └──────┘  └─────────┘
//! ```

pub mod format_converters;
pub mod types;
pub mod v4l2;

pub use types::*;
pub use v4l2::{V4l2Camera, list_cameras};

use crate::errors::ScanResult;
use std::path::Path;
use tracing::info;

/// Something that can produce one frame on request
///
/// Sources are moved onto a blocking worker for each poll tick, hence `Send`.
pub trait FrameSource: Send {
    /// Capture a single frame
    ///
    /// # Returns
    /// * `Ok(Frame)` - Frame captured and converted to RGBA
    /// * `Err(ScanError::CaptureFailure)` - Device present but no usable frame
    fn capture(&mut self) -> ScanResult<Frame>;

    /// Human readable name for logs
    fn describe(&self) -> String {
        "frame source".to_string()
    }
}

impl FrameSource for Box<dyn FrameSource> {
    fn capture(&mut self) -> ScanResult<Frame> {
        (**self).capture()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Capture one frame and optionally persist it
///
/// A failure to write the image comes back as `ScanError::Io`, never as a
/// capture failure, so callers can tell "no frame" from "frame, but not saved".
pub fn capture_frame<S>(source: &mut S, save_to: Option<&Path>) -> ScanResult<Frame>
where
    S: FrameSource + ?Sized,
{
    let frame = source.capture()?;

    if let Some(path) = save_to {
        frame.save(path)?;
        info!(path = %path.display(), "Image saved");
    }

    Ok(frame)
}
