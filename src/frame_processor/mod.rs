// SPDX-License-Identifier: GPL-3.0-only

//! Frame decoding
//!
//! A decoder turns one frame into the text payloads found in it. Finding
//! nothing is the normal case and yields an empty list, not an error.

pub mod qr_detector;

pub use qr_detector::QrDetector;

use crate::backends::camera::Frame;

/// Extracts text payloads from a frame
///
/// Decoders are moved onto a blocking worker for each poll tick, hence `Send`.
pub trait FrameDecoder: Send {
    /// Decode every code visible in `frame`, in detection order
    fn decode(&self, frame: &Frame) -> Vec<String>;
}

impl<F> FrameDecoder for F
where
    F: Fn(&Frame) -> Vec<String> + Send,
{
    fn decode(&self, frame: &Frame) -> Vec<String> {
        self(frame)
    }
}
