mod common;

use click_pilot::error::{EngineError, EngineResult};
use click_pilot::input::{SharedInput, SharedSleeper};
use click_pilot::vision::{CaptureBackend, MatchOptions, ScreenRegion, SharedCapture};
use click_pilot::watcher::{ScreenWatcher, WatcherConfig, WatcherStatus};
use common::{noise_frame, FakeCapture, InputOp, MockInput, RecordingSleeper};
use image::{imageops, RgbaImage};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

/// Capture that fails a fixed number of grabs before recovering.
struct FlakyCapture {
    frame: RgbaImage,
    failures_left: usize,
}

impl CaptureBackend for FlakyCapture {
    fn grab_region(&mut self, _region: &ScreenRegion) -> EngineResult<RgbaImage> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            return Err(EngineError::Capture("synthetic grab failure".into()));
        }
        Ok(self.frame.clone())
    }
}

struct Fixture {
    watcher: ScreenWatcher,
    mock: MockInput,
    template_path: PathBuf,
    _dir: tempfile::TempDir,
}

fn fixture_with_capture(capture: SharedCapture, frame: &RgbaImage) -> Fixture {
    let dir = tempdir().unwrap();
    let template = imageops::crop_imm(frame, 13, 6, 8, 8).to_image();
    let template_path = dir.path().join("target.png");
    template.save(&template_path).unwrap();

    let mock = MockInput::default();
    let input: SharedInput = Arc::new(Mutex::new(mock.clone()));
    let sleeper: SharedSleeper = Arc::new(RecordingSleeper::default());
    let watcher = ScreenWatcher::new(capture, input, sleeper);

    Fixture {
        watcher,
        mock,
        template_path,
        _dir: dir,
    }
}

fn fixture() -> Fixture {
    let frame = noise_frame(50, 40);
    let capture: SharedCapture = Arc::new(Mutex::new(FakeCapture::new(frame.clone())));
    fixture_with_capture(capture, &frame)
}

fn config(fixture: &Fixture) -> WatcherConfig {
    WatcherConfig {
        template_path: fixture.template_path.clone(),
        region: ScreenRegion::new(200, 300, 50, 40),
        poll_interval_ms: 500,
        auto_click: false,
        click_offset: None,
        match_options: MatchOptions::default(),
    }
}

#[test]
fn start_polls_immediately_and_records_the_match() {
    let fixture = fixture();
    fixture.watcher.start(config(&fixture)).unwrap();

    let status = fixture.watcher.status();
    assert!(status.running);
    assert!(status.last_check_ms.is_some());
    assert!(status.error.is_none());

    let found = status.last_match.expect("template is present in the frame");
    assert_eq!((found.x, found.y), (213, 306));
    assert_eq!(found.score, Some(1.0));

    // No auto-click configured, so the pointer was never touched.
    assert!(fixture.mock.ops().is_empty());
}

#[test]
fn starting_twice_is_a_usage_error() {
    let fixture = fixture();
    fixture.watcher.start(config(&fixture)).unwrap();
    let err = fixture.watcher.start(config(&fixture)).unwrap_err();
    assert!(matches!(err, EngineError::WatcherAlreadyRunning));
}

#[test]
fn stop_resets_to_idle() {
    let fixture = fixture();
    fixture.watcher.start(config(&fixture)).unwrap();
    fixture.watcher.stop();

    let status = fixture.watcher.status();
    assert!(!status.running);
    assert!(status.last_check_ms.is_none());
    assert!(status.last_match.is_none());

    // A fresh start is allowed after stop.
    fixture.watcher.start(config(&fixture)).unwrap();
    assert!(fixture.watcher.is_running());
}

#[test]
fn auto_click_moves_to_the_offset_match_point() {
    let fixture = fixture();
    let mut cfg = config(&fixture);
    cfg.auto_click = true;
    cfg.click_offset = Some((2, 3));
    fixture.watcher.start(cfg).unwrap();

    assert_eq!(fixture.mock.position(), (215, 309));
    let ops = fixture.mock.ops();
    assert!(matches!(ops.last(), Some(InputOp::Click(_))));
}

#[test]
fn poll_errors_are_captured_and_cleared_on_recovery() {
    let frame = noise_frame(50, 40);
    let capture: SharedCapture = Arc::new(Mutex::new(FlakyCapture {
        frame: frame.clone(),
        failures_left: 1,
    }));
    let fixture = fixture_with_capture(capture, &frame);

    fixture.watcher.start(config(&fixture)).unwrap();

    let status = fixture.watcher.status();
    assert!(status.running);
    assert!(status.last_check_ms.is_some(), "last_check is unconditional");
    assert!(status.last_match.is_none());
    let error = status.error.expect("first poll failed");
    assert!(error.contains("synthetic grab failure"));

    // Next poll succeeds: the error clears and the match lands.
    fixture.watcher.poll_once();
    let status = fixture.watcher.status();
    assert!(status.error.is_none());
    assert!(status.last_match.is_some());
}

#[test]
fn missing_template_surfaces_through_the_status() {
    let fixture = fixture();
    let mut cfg = config(&fixture);
    cfg.template_path = fixture._dir.path().join("gone.png");
    fixture.watcher.start(cfg).unwrap();

    let status = fixture.watcher.status();
    assert!(status.running);
    assert!(status.error.is_some());
}

#[test]
fn status_listener_fires_on_every_poll() {
    let mut fixture = fixture();
    let events: Arc<Mutex<Vec<WatcherStatus>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    fixture
        .watcher
        .set_status_listener(Arc::new(move |status| {
            sink.lock().unwrap().push(status);
        }));

    fixture.watcher.start(config(&fixture)).unwrap();
    fixture.watcher.poll_once();
    fixture.watcher.stop();

    let events = events.lock().unwrap();
    assert!(events.len() >= 3);
    assert!(!events.last().unwrap().running);
}
