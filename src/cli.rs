// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Scanning for a QR code with a timeout
//! - Listing available cameras
//! - Taking a single snapshot

use crate::ScanArgs;
use chrono::Local;
use qr_capture::backends::camera::list_cameras as enumerate_cameras;
use qr_capture::constants::{self, scan};
use qr_capture::{
    Config, FrameSource, ImageFileSource, QrDetector, RunLog, ScanSettings, V4l2Camera,
    capture_frame, record_run,
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Scan for a QR code and record the run
pub fn run_scan(config: &Config, args: ScanArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(output) = &args.output {
        println!("Output file: {}", output.display());
    } else {
        println!("No output file provided, will only log result.");
    }

    let mut config = config.clone();
    if let Some(secs) = args.timeout {
        config.timeout_secs = secs;
    }
    let timeout = resolve_timeout(config.timeout());
    println!("Timeout set to: {} seconds", timeout.as_secs_f64());

    let poll_interval = match args.interval {
        Some(secs) => Duration::try_from_secs_f64(secs).unwrap_or_else(|_| {
            warn!(interval = secs, "Invalid poll interval, using default");
            scan::DEFAULT_POLL_INTERVAL
        }),
        None => config.poll_interval(),
    };

    let settings = ScanSettings {
        poll_interval,
        timeout,
        snapshot_path: args.snapshot.or_else(|| config.snapshot.clone()),
    };
    let log = RunLog::new(args.log_file.unwrap_or_else(|| config.log_file.clone()));
    let camera = args.camera.unwrap_or(config.camera);
    let decoder = QrDetector::with_max_dimension(config.max_dimension);

    let outcome = record_run(
        &log,
        || {
            let source = open_source(&config, camera, args.image.as_deref())?;
            println!("Using {}", source.describe());
            Ok(source)
        },
        decoder,
        settings,
    )?;

    println!("QR code data: {}", outcome.payload().unwrap_or("None"));

    match outcome.payload() {
        Some(payload) => {
            println!("QR code detected.");
            match &args.output {
                Some(path) => save_payload(path, payload),
                None => println!("No output file specified. QR code data not saved."),
            }
        }
        None => println!("No QR code detected within timeout."),
    }

    Ok(())
}

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for camera in &cameras {
        println!("  [{}] {} ({})", camera.index, camera.name, camera.path);
        if !camera.formats.is_empty() {
            println!("      Formats: {}", camera.formats.join(", "));
        }
        println!();
    }

    Ok(())
}

/// Capture one frame and save it
pub fn take_snapshot(
    config: &Config,
    camera: Option<usize>,
    image: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut source = open_source(config, camera.unwrap_or(config.camera), image.as_deref())?;
    println!("Using {}", source.describe());

    let path = output.unwrap_or_else(|| {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        get_default_snapshot_dir().join(format!("snapshot_{}.png", timestamp))
    });

    println!("Capturing...");
    let frame = capture_frame(&mut source, Some(&path))?;
    println!(
        "Snapshot saved: {} ({}x{})",
        path.display(),
        frame.width,
        frame.height
    );

    Ok(())
}

/// A zero timeout (from a non-positive setting) falls back to the default
fn resolve_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        println!(
            "Timeout must be a positive number. Using default of {} seconds.",
            scan::DEFAULT_TIMEOUT.as_secs()
        );
        return scan::DEFAULT_TIMEOUT;
    }
    timeout
}

fn open_source(
    config: &Config,
    camera: usize,
    image: Option<&Path>,
) -> qr_capture::ScanResult<Box<dyn FrameSource>> {
    Ok(match image {
        Some(path) => Box::new(ImageFileSource::open(path)?),
        None => Box::new(V4l2Camera::open(camera, config.warmup_frames)?),
    })
}

fn save_payload(path: &Path, payload: &str) {
    if path.exists() {
        println!("Warning: Overwriting existing file {}", path.display());
    }
    match std::fs::write(path, payload) {
        Ok(()) => println!("Data saved to {}", path.display()),
        Err(e) => eprintln!("Error writing {}: {}", path.display(), e),
    }
}

/// Get default snapshot directory
fn get_default_snapshot_dir() -> PathBuf {
    dirs::picture_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join(constants::APP_NAME)
}
