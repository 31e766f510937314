// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Read from a TOML file. Every field is optional; missing ones take the
//! defaults in [`crate::constants`]. Command-line flags override whatever
//! the file says.
//!
//! ```toml
//! camera = 1
//! timeout_secs = 15.0
//! poll_interval_ms = 100
//! log_file = "/var/log/qr-capture/runs.csv"
//! ```

use crate::constants::{self, capture, detection, run_log, scan};
use crate::errors::{ScanError, ScanResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// V4L2 camera index
    pub camera: usize,
    /// Scan timeout in seconds
    pub timeout_secs: f64,
    /// Wait between capture attempts in milliseconds
    pub poll_interval_ms: u64,
    /// Run log location
    pub log_file: PathBuf,
    /// Save every captured frame here
    pub snapshot: Option<PathBuf>,
    /// Longest frame side fed to the QR detector (0 = full size)
    pub max_dimension: u32,
    /// Frames dropped after stream start on each capture
    pub warmup_frames: u32,
    /// Log filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: scan::DEFAULT_CAMERA_INDEX,
            timeout_secs: scan::DEFAULT_TIMEOUT.as_secs_f64(),
            poll_interval_ms: scan::DEFAULT_POLL_INTERVAL.as_millis() as u64,
            log_file: PathBuf::from(run_log::DEFAULT_LOG_FILE),
            snapshot: None,
            max_dimension: detection::DEFAULT_MAX_DIMENSION,
            warmup_frames: capture::DEFAULT_WARMUP_FRAMES,
            log_level: constants::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> ScanResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScanError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Resolve the configuration for this run
    ///
    /// An explicit path must exist. Without one, the per-user file is used
    /// if present, otherwise the defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> ScanResult<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_path() {
            Some(path) if path.is_file() => {
                info!(path = %path.display(), "Using configuration file");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// Scan timeout; zero, negative and NaN yield zero, huge values saturate
    pub fn timeout(&self) -> Duration {
        if self.timeout_secs.is_nan() || self.timeout_secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.timeout_secs).unwrap_or(Duration::MAX)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// `$XDG_CONFIG_HOME/qr-capture/config.toml`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(constants::APP_NAME).join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_timeout_is_zero() {
        let config = Config {
            timeout_secs: -3.0,
            ..Config::default()
        };
        assert_eq!(config.timeout(), Duration::ZERO);
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let config = Config {
            timeout_secs: 1e30,
            ..Config::default()
        };
        assert_eq!(config.timeout(), Duration::MAX);

        let config = Config {
            timeout_secs: f64::NAN,
            ..Config::default()
        };
        assert_eq!(config.timeout(), Duration::ZERO);
    }

    #[test]
    fn test_fractional_timeout() {
        let config = Config {
            timeout_secs: 1.5,
            ..Config::default()
        };
        assert_eq!(config.timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        if let Some(path) = default_path() {
            assert!(path.ends_with("qr-capture/config.toml"));
        }
    }
}
