// SPDX-License-Identifier: GPL-3.0-only

//! Poll loop with timeout
//!
//! The scanner repeatedly grabs a frame and tries to decode it until a
//! payload is found or the deadline passes:
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            ▼                              │ sleep(min(interval, remaining))
//!   ┌─────────────────┐  no code / capture  │
//!   │     Polling     │─────── failure ─────┘
//!   └────────┬────────┘
//!     payload│   deadline passed
//!            ▼          ▼
//!      Done(Success)  Done(TimedOut)
//! ```
//!
//! Capture and decode are blocking calls, so each tick runs them on a
//! blocking worker and waits for it no longer than the deadline. A worker
//! still busy at the deadline is detached; the loop returns regardless.

use crate::backends::camera::{Frame, FrameSource};
use crate::errors::{ScanError, ScanResult};
use crate::frame_processor::FrameDecoder;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Stand-in deadline for timeouts too large to represent as an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Poll loop timing and side effects
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSettings {
    /// Wait between successive capture attempts
    pub poll_interval: Duration,
    /// Wall-clock budget for the whole scan
    pub timeout: Duration,
    /// Save every captured frame here (overwritten each tick)
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            poll_interval: crate::constants::scan::DEFAULT_POLL_INTERVAL,
            timeout: crate::constants::scan::DEFAULT_TIMEOUT,
            snapshot_path: None,
        }
    }
}

/// Final state of a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A frame contained at least one QR code
    Decoded {
        /// First payload found
        payload: String,
        /// Every payload in the winning frame, in detection order
        payloads: Vec<String>,
        /// Capture attempts made, including the successful one
        attempts: u32,
        elapsed: Duration,
    },
    /// The deadline passed without a decode
    TimedOut {
        /// Capture attempts made
        attempts: u32,
        /// Attempts whose capture failed
        failed_captures: u32,
        elapsed: Duration,
    },
}

impl ScanOutcome {
    /// The decoded payload, or `None` on timeout
    pub fn payload(&self) -> Option<&str> {
        match self {
            ScanOutcome::Decoded { payload, .. } => Some(payload),
            ScanOutcome::TimedOut { .. } => None,
        }
    }

    /// Number of capture attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            ScanOutcome::Decoded { attempts, .. } | ScanOutcome::TimedOut { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Time from start of the scan until it finished
    pub fn elapsed(&self) -> Duration {
        match self {
            ScanOutcome::Decoded { elapsed, .. } | ScanOutcome::TimedOut { elapsed, .. } => {
                *elapsed
            }
        }
    }
}

/// Result of a single poll tick
#[derive(Debug)]
enum TickResult {
    /// Frame decoded to one or more payloads
    Decoded(Vec<String>),
    /// Frame captured, no code in it
    Empty,
    /// No frame this tick
    CaptureFailed(ScanError),
}

/// Poll loop over a frame source and a decoder
pub struct Scanner<S, D> {
    source: S,
    decoder: D,
    settings: ScanSettings,
}

impl<S, D> Scanner<S, D>
where
    S: FrameSource + 'static,
    D: FrameDecoder + 'static,
{
    pub fn new(source: S, decoder: D, settings: ScanSettings) -> Self {
        Self {
            source,
            decoder,
            settings,
        }
    }

    /// Run the poll loop until a payload is found or the deadline passes
    ///
    /// Consumes the scanner: if a tick is still blocked in the device when
    /// the deadline hits, the source is left with the detached worker.
    ///
    /// A zero timeout returns `TimedOut` without attempting any capture.
    pub async fn run(self) -> ScanOutcome {
        let Scanner {
            source,
            decoder,
            settings,
        } = self;

        let start = Instant::now();
        let deadline = start
            .checked_add(settings.timeout)
            .unwrap_or_else(|| start + FAR_FUTURE);
        let mut worker = Some((source, decoder));
        let mut attempts = 0u32;
        let mut failed_captures = 0u32;

        info!(
            timeout_ms = settings.timeout.as_millis(),
            interval_ms = settings.poll_interval.as_millis(),
            "Starting QR scan"
        );

        loop {
            if Instant::now() >= deadline {
                break;
            }

            let Some((mut source, decoder)) = worker.take() else {
                break;
            };
            attempts += 1;

            let snapshot = settings.snapshot_path.clone();
            let task = tokio::task::spawn_blocking(move || {
                let result = run_tick(&mut source, &decoder, snapshot);
                (source, decoder, result)
            });

            match tokio::time::timeout_at(deadline, task).await {
                Err(_) => {
                    warn!(attempt = attempts, "Capture still running at deadline, abandoning it");
                    break;
                }
                Ok(Err(e)) => {
                    warn!(attempt = attempts, error = %e, "Poll tick panicked, stopping scan");
                    break;
                }
                Ok(Ok((source, decoder, result))) => {
                    worker = Some((source, decoder));

                    match result {
                        TickResult::Decoded(payloads) => {
                            let elapsed = start.elapsed();
                            info!(
                                attempt = attempts,
                                count = payloads.len(),
                                elapsed_ms = elapsed.as_millis(),
                                "QR code detected"
                            );
                            let payload = payloads[0].clone();
                            return ScanOutcome::Decoded {
                                payload,
                                payloads,
                                attempts,
                                elapsed,
                            };
                        }
                        TickResult::Empty => {
                            debug!(attempt = attempts, "No QR code in frame");
                        }
                        TickResult::CaptureFailed(e) => {
                            failed_captures += 1;
                            warn!(attempt = attempts, error = %e, "No image captured");
                        }
                    }
                }
            }

            // Never sleep past the deadline
            let wake = Instant::now()
                .checked_add(settings.poll_interval)
                .map_or(deadline, |wake| wake.min(deadline));
            tokio::time::sleep_until(wake).await;
        }

        let elapsed = start.elapsed();
        if attempts > 0 && failed_captures == attempts {
            warn!(attempts, "Frame source produced no frames before the deadline");
        }
        info!(
            attempts,
            failed_captures,
            elapsed_ms = elapsed.as_millis(),
            "No QR code detected within the timeout period"
        );

        ScanOutcome::TimedOut {
            attempts,
            failed_captures,
            elapsed,
        }
    }
}

/// Capture, optionally snapshot, and decode one frame
fn run_tick<S, D>(source: &mut S, decoder: &D, snapshot: Option<PathBuf>) -> TickResult
where
    S: FrameSource + ?Sized,
    D: FrameDecoder + ?Sized,
{
    let frame: Frame = match source.capture() {
        Ok(frame) => frame,
        Err(e) => return TickResult::CaptureFailed(e),
    };

    if let Some(path) = snapshot
        && let Err(e) = frame.save(&path)
    {
        warn!(path = %path.display(), error = %e, "Failed to save snapshot");
    }

    let payloads = decoder.decode(&frame);
    if payloads.is_empty() {
        TickResult::Empty
    } else {
        TickResult::Decoded(payloads)
    }
}

/// Run a scan to completion on a current-thread runtime
///
/// For callers that are not already inside a Tokio runtime. The runtime is
/// shut down without waiting for an abandoned capture to finish.
pub fn scan_blocking<S, D>(source: S, decoder: D, settings: ScanSettings) -> ScanResult<ScanOutcome>
where
    S: FrameSource + 'static,
    D: FrameDecoder + 'static,
{
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    let outcome = runtime.block_on(Scanner::new(source, decoder, settings).run());
    runtime.shutdown_background();
    Ok(outcome)
}
