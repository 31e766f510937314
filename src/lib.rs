// SPDX-License-Identifier: GPL-3.0-only

//! qr-capture - scan a QR code from a webcam within a time limit
//!
//! The library polls a frame source, runs a QR decoder over every frame and
//! stops at the first payload or when the deadline passes. Each run is
//! recorded in an append-only CSV log.
//!
//! # Architecture
//!
//! - [`backends`]: frame sources (V4L2 cameras, image files)
//! - [`frame_processor`]: frame decoders (rqrr QR detection)
//! - [`scanner`]: the poll loop with timeout
//! - [`run_log`]: CSV run log
//! - [`config`]: user configuration
//!
//! # Example
//!
//! ```no_run
//! use qr_capture::{ImageFileSource, QrDetector, ScanSettings, scan_blocking};
//!
//! let source = ImageFileSource::open("code.png")?;
//! let outcome = scan_blocking(source, QrDetector::new(), ScanSettings::default())?;
//! println!("{:?}", outcome.payload());
//! # Ok::<(), qr_capture::ScanError>(())
//! ```

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod frame_processor;
pub mod run_log;
pub mod scanner;

// Re-export commonly used types
pub use backends::{Frame, FrameSource, ImageFileSource, V4l2Camera, capture_frame};
pub use config::Config;
pub use errors::{ScanError, ScanResult};
pub use frame_processor::{FrameDecoder, QrDetector};
pub use run_log::{RunEvent, RunLog, record_run};
pub use scanner::{ScanOutcome, ScanSettings, Scanner, scan_blocking};
