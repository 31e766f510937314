// SPDX-License-Identifier: GPL-3.0-only

use clap::{Args, Parser, Subcommand};
use qr_capture::Config;
use qr_capture::constants::DEFAULT_LOG_LEVEL;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "qr-capture")]
#[command(about = "Scan a QR code using a webcam")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    #[command(flatten)]
    scan: ScanArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options for the default scan command
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Camera index to use (from 'qr-capture list')
    #[arg(short, long)]
    pub camera: Option<usize>,

    /// Scan a static image instead of a camera
    #[arg(short, long, conflicts_with = "camera")]
    pub image: Option<PathBuf>,

    /// Timeout in seconds for QR code detection (default: 10)
    #[arg(short, long, allow_negative_numbers = true)]
    pub timeout: Option<f64>,

    /// Seconds between capture attempts (default: 0.2)
    #[arg(long)]
    pub interval: Option<f64>,

    /// File to save the QR code data to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Save every captured frame to this image path
    #[arg(long)]
    pub snapshot: Option<PathBuf>,

    /// Run log location (default: runtime_log.csv)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Configuration file (default: ~/.config/qr-capture/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available cameras
    List,

    /// Capture a single frame and save it
    Snapshot {
        /// Camera index to use (from 'qr-capture list')
        #[arg(short, long)]
        camera: Option<usize>,

        /// Use a static image instead of a camera
        #[arg(short, long, conflicts_with = "camera")]
        image: Option<PathBuf>,

        /// Output file path (default: ~/Pictures/qr-capture/snapshot_TIMESTAMP.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config errors are reported after logging is up
    let config = Config::load_or_default(cli.scan.config.as_deref());
    let default_filter = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=qr_capture=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&default_filter)),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let config = config?;

    match cli.command {
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Snapshot {
            camera,
            image,
            output,
        }) => cli::take_snapshot(&config, camera, image, output),
        None => cli::run_scan(&config, cli.scan),
    }
}
