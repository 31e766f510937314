// SPDX-License-Identifier: GPL-3.0-only

//! Append-only CSV record of scan runs
//!
//! Every run appends a `start` record, a `result` record with the payload
//! (or a note that none was found), and a `complete` record. The header is
//! written only when the file is empty, so several runs can share one log.

use crate::backends::camera::FrameSource;
use crate::constants::run_log::{HEADER, TIMESTAMP_FORMAT};
use crate::errors::ScanResult;
use crate::frame_processor::FrameDecoder;
use crate::scanner::{ScanOutcome, ScanSettings, scan_blocking};
use chrono::Local;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Kind of run log record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    /// Scan started
    Start,
    /// Scan produced a payload (or reported that none was found)
    Result,
    /// Scan finished
    Complete,
}

impl RunEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunEvent::Start => "start",
            RunEvent::Result => "result",
            RunEvent::Complete => "complete",
        }
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a run log file
///
/// Holds only the path; the file is opened for each append.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped record
    ///
    /// Creates the file and its parent directories as needed.
    pub fn append(&self, event: RunEvent, message: &str) -> ScanResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut buf = String::new();
        if file.metadata()?.len() == 0 {
            buf.push_str(&csv_row(&HEADER));
        }

        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        buf.push_str(&csv_row(&[&timestamp, event.as_str(), message]));

        file.write_all(buf.as_bytes())?;
        debug!(path = %self.path.display(), event = %event, "Appended run log record");
        Ok(())
    }

    /// Append, reporting a failed write instead of returning it
    fn append_or_warn(&self, event: RunEvent, message: &str) {
        if let Err(e) = self.append(event, message) {
            warn!(path = %self.path.display(), event = %event, error = %e, "Failed to write run log record");
        }
    }
}

/// Open a source, scan it and record the run
///
/// Writes `start` before the source is opened. A source that cannot be
/// opened gets a `complete` record saying the scan was aborted and its
/// error is returned. Otherwise the run ends with a `result` record and a
/// `complete` record. Log write failures never fail the scan.
pub fn record_run<S, D, F>(
    log: &RunLog,
    open: F,
    decoder: D,
    settings: ScanSettings,
) -> ScanResult<ScanOutcome>
where
    S: FrameSource + 'static,
    D: FrameDecoder + 'static,
    F: FnOnce() -> ScanResult<S>,
{
    log.append_or_warn(
        RunEvent::Start,
        &format!(
            "Scan started with timeout of {} seconds",
            settings.timeout.as_secs_f64()
        ),
    );

    let outcome = open().and_then(|source| scan_blocking(source, decoder, settings));
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            log.append_or_warn(RunEvent::Complete, &format!("Scan aborted: {}", e));
            return Err(e);
        }
    };

    let result = match outcome.payload() {
        Some(payload) => format!("QR code detected: {}", payload),
        None => "No QR code detected within timeout.".to_string(),
    };
    log.append_or_warn(RunEvent::Result, &result);
    log.append_or_warn(
        RunEvent::Complete,
        &format!(
            "Scan complete after {} attempts in {:.2} seconds",
            outcome.attempts(),
            outcome.elapsed().as_secs_f64()
        ),
    );

    Ok(outcome)
}

fn csv_row(fields: &[&str]) -> String {
    let mut row = fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",");
    row.push_str("\r\n");
    row
}

/// Quote a field if it contains a separator, quote or line break
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
