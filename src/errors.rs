// SPDX-License-Identifier: GPL-3.0-only

//! Error types for frame capture, decoding and run logging
//!
//! Only setup failures are fatal. Everything that can go wrong while the
//! poll loop is running is recovered locally: a failed grab is retried on
//! the next tick and a failed write is reported and skipped. "No QR code in
//! this frame" and "ran out of time" are not errors at all; they are an
//! empty payload list and [`crate::scanner::ScanOutcome::TimedOut`].

use std::fmt;

/// Result type alias using ScanError
pub type ScanResult<T> = Result<T, ScanError>;

/// Main error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// No camera device (or image file) to capture from
    DeviceUnavailable(String),
    /// Device present, but the grab failed or returned no data
    CaptureFailure(String),
    /// Writing an image, payload or log entry failed
    Io(String),
    /// Configuration could not be read or parsed
    Config(String),
}

impl ScanError {
    /// Whether this error should abort the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::DeviceUnavailable(_) | ScanError::Config(_))
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::DeviceUnavailable(msg) => write!(f, "Device unavailable: {}", msg),
            ScanError::CaptureFailure(msg) => write!(f, "Capture failed: {}", msg),
            ScanError::Io(msg) => write!(f, "I/O error: {}", msg),
            ScanError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ScanError {}

impl From<std::io::Error> for ScanError {
    fn from(err: std::io::Error) -> Self {
        ScanError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ScanError {
    fn from(err: toml::de::Error) -> Self {
        ScanError::Config(err.to_string())
    }
}
