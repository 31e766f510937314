// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Application name, used for config and picture directories
pub const APP_NAME: &str = "qr-capture";

/// Poll loop defaults
pub mod scan {
    use super::Duration;

    /// Default wall-clock budget for one scan
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default wait between successive capture attempts
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

    /// Default camera index (`/dev/video0`)
    pub const DEFAULT_CAMERA_INDEX: usize = 0;
}

/// QR detection tuning
pub mod detection {
    /// Frames are downscaled so their longest side is at most this many pixels.
    /// QR codes held up to a webcam are large enough to survive it.
    pub const DEFAULT_MAX_DIMENSION: u32 = 640;
}

/// V4L2 capture tuning
pub mod capture {
    use super::Duration;

    /// Number of mmap buffers requested from the driver
    pub const STREAM_BUFFER_COUNT: u32 = 4;

    /// Frames dropped after stream start while auto exposure settles
    pub const DEFAULT_WARMUP_FRAMES: u32 = 2;

    /// Upper bound for a single buffer dequeue
    pub const DEQUEUE_TIMEOUT: Duration = Duration::from_secs(2);

    /// Pixel formats we can convert, in order of preference
    pub const PREFERRED_FOURCCS: [&[u8; 4]; 5] = [b"MJPG", b"YUYV", b"UYVY", b"RGB3", b"GREY"];
}

/// Run log defaults
pub mod run_log {
    /// Default run log file, relative to the working directory
    pub const DEFAULT_LOG_FILE: &str = "runtime_log.csv";

    /// CSV header row
    pub const HEADER: [&str; 3] = ["Timestamp", "Event", "Message"];

    /// Timestamp format for log records
    pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
}

/// Supported file formats for image sources and snapshots
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Default log filter when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_LOG_LEVEL: &str = "warn";
