// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the poll loop

use qr_capture::{Frame, FrameSource, ScanError, ScanOutcome, ScanResult, ScanSettings, Scanner};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

/// Source that always hands out a small blank frame
struct BlankSource {
    captures: Arc<AtomicU32>,
}

impl BlankSource {
    fn new() -> (Self, Arc<AtomicU32>) {
        let captures = Arc::new(AtomicU32::new(0));
        (
            Self {
                captures: Arc::clone(&captures),
            },
            captures,
        )
    }
}

impl FrameSource for BlankSource {
    fn capture(&mut self) -> ScanResult<Frame> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        Frame::from_rgba(4, 4, vec![255; 4 * 4 * 4])
    }
}

/// Source whose device never delivers a frame
struct BrokenSource;

impl FrameSource for BrokenSource {
    fn capture(&mut self) -> ScanResult<Frame> {
        Err(ScanError::CaptureFailure("no data".to_string()))
    }
}

/// Source that blocks far longer than any test deadline
struct StuckSource;

impl FrameSource for StuckSource {
    fn capture(&mut self) -> ScanResult<Frame> {
        std::thread::sleep(Duration::from_secs(2));
        Frame::from_rgba(1, 1, vec![0; 4])
    }
}

fn settings(timeout_ms: u64, interval_ms: u64) -> ScanSettings {
    ScanSettings {
        poll_interval: Duration::from_millis(interval_ms),
        timeout: Duration::from_millis(timeout_ms),
        snapshot_path: None,
    }
}

#[tokio::test]
async fn test_stub_decoder_hit_on_first_tick() {
    let (source, captures) = BlankSource::new();
    let decoder = |_: &Frame| vec!["HELLO".to_string()];

    let outcome = Scanner::new(source, decoder, settings(2000, 50)).run().await;

    assert_eq!(outcome.payload(), Some("HELLO"));
    assert_eq!(outcome.attempts(), 1);
    assert_eq!(captures.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_first_payload_wins() {
    let (source, _) = BlankSource::new();
    let decoder = |_: &Frame| vec!["first".to_string(), "second".to_string()];

    let outcome = Scanner::new(source, decoder, settings(1000, 50)).run().await;

    match outcome {
        ScanOutcome::Decoded {
            payload, payloads, ..
        } => {
            assert_eq!(payload, "first");
            assert_eq!(payloads, vec!["first", "second"]);
        }
        other => panic!("expected a decode, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_decoder_waits_for_deadline() {
    let (source, captures) = BlankSource::new();
    let decoder = |_: &Frame| Vec::<String>::new();
    let timeout = Duration::from_millis(300);
    let interval = Duration::from_millis(50);

    let start = Instant::now();
    let outcome = Scanner::new(source, decoder, settings(300, 50)).run().await;
    let elapsed = start.elapsed();

    assert_eq!(outcome.payload(), None);
    assert!(elapsed >= timeout, "returned early after {:?}", elapsed);
    // Generous slack for slow CI machines
    assert!(elapsed < timeout + interval + Duration::from_millis(500));
    assert!(captures.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn test_failing_source_times_out() {
    let decoder = |_: &Frame| vec!["never".to_string()];

    let start = Instant::now();
    let outcome = Scanner::new(BrokenSource, decoder, settings(250, 50)).run().await;

    assert_eq!(outcome.payload(), None);
    assert!(start.elapsed() < Duration::from_millis(250 + 50 + 500));
    match outcome {
        ScanOutcome::TimedOut {
            attempts,
            failed_captures,
            ..
        } => {
            assert!(attempts >= 1);
            assert_eq!(attempts, failed_captures);
        }
        other => panic!("expected a timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_zero_timeout_makes_no_attempts() {
    let (source, captures) = BlankSource::new();
    let decoder = |_: &Frame| vec!["HELLO".to_string()];

    let outcome = Scanner::new(source, decoder, settings(0, 50)).run().await;

    assert_eq!(outcome.payload(), None);
    assert_eq!(outcome.attempts(), 0);
    assert_eq!(captures.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_interval_longer_than_timeout_is_clamped() {
    let (source, _) = BlankSource::new();
    let decoder = |_: &Frame| Vec::<String>::new();

    let start = Instant::now();
    let outcome = Scanner::new(source, decoder, settings(200, 5000)).run().await;

    assert_eq!(outcome.attempts(), 1);
    assert!(start.elapsed() < Duration::from_millis(1500));
}

#[tokio::test]
async fn test_blocked_capture_is_abandoned_at_deadline() {
    let decoder = |_: &Frame| vec!["late".to_string()];

    let start = Instant::now();
    let outcome = Scanner::new(StuckSource, decoder, settings(200, 50)).run().await;

    assert_eq!(outcome.payload(), None);
    assert!(start.elapsed() < Duration::from_millis(1500));
}

#[tokio::test]
async fn test_snapshot_failure_does_not_stop_decode() {
    let dir = tempfile::tempdir().unwrap();
    // Unsupported extension makes every save fail
    let snapshot = dir.path().join("frame.unknown");
    let (source, _) = BlankSource::new();
    let decoder = |_: &Frame| vec!["HELLO".to_string()];

    let settings = ScanSettings {
        snapshot_path: Some(snapshot.clone()),
        ..settings(1000, 50)
    };
    let outcome = Scanner::new(source, decoder, settings).run().await;

    assert_eq!(outcome.payload(), Some("HELLO"));
    assert!(!snapshot.exists());
}

#[tokio::test]
async fn test_snapshot_written_each_tick() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("last.png");
    let (source, _) = BlankSource::new();
    let decoder = |_: &Frame| vec!["HELLO".to_string()];

    let settings = ScanSettings {
        snapshot_path: Some(snapshot.clone()),
        ..settings(1000, 50)
    };
    Scanner::new(source, decoder, settings).run().await;

    assert!(snapshot.exists());
}

#[test]
fn test_scan_blocking_outside_runtime() {
    let (source, _) = BlankSource::new();
    let decoder = |_: &Frame| vec!["HELLO".to_string()];

    let outcome = qr_capture::scan_blocking(source, decoder, settings(1000, 50)).unwrap();
    assert_eq!(outcome.payload(), Some("HELLO"));
}

#[test]
fn test_scan_blocking_returns_while_capture_is_stuck() {
    let decoder = |_: &Frame| vec!["late".to_string()];

    let start = Instant::now();
    let outcome = qr_capture::scan_blocking(StuckSource, decoder, settings(200, 50)).unwrap();

    assert_eq!(outcome.payload(), None);
    assert!(start.elapsed() < Duration::from_millis(1500));
}

#[tokio::test]
async fn test_unbounded_timeout_does_not_overflow() {
    let (source, _) = BlankSource::new();
    let decoder = |_: &Frame| vec!["X".to_string()];
    let settings = ScanSettings {
        timeout: Duration::MAX,
        ..settings(0, 1)
    };

    let outcome = Scanner::new(source, decoder, settings).run().await;

    assert_eq!(outcome.payload(), Some("X"));
}

#[tokio::test]
async fn test_unbounded_interval_sleeps_until_deadline() {
    let (source, _) = BlankSource::new();
    let decoder = |_: &Frame| Vec::<String>::new();
    let settings = ScanSettings {
        poll_interval: Duration::MAX,
        ..settings(200, 0)
    };

    let start = Instant::now();
    let outcome = Scanner::new(source, decoder, settings).run().await;

    assert_eq!(outcome.payload(), None);
    assert_eq!(outcome.attempts(), 1);
    assert!(start.elapsed() < Duration::from_millis(1500));
}
