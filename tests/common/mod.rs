#![allow(dead_code)]

use click_pilot::error::{EngineError, EngineResult};
use click_pilot::input::{InputBackend, Sleeper};
use click_pilot::settings::ClickButton;
use click_pilot::vision::{CaptureBackend, ScreenRegion};
use image::RgbaImage;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOp {
    Click(ClickButton),
    MoveTo(i32, i32),
    KeyPress(String),
}

#[derive(Default)]
pub struct MockInputState {
    pub position: (i32, i32),
    pub ops: Vec<InputOp>,
    pub fail_clicks: bool,
}

/// Recording input backend. Cloning shares the underlying state so a test
/// can keep a handle for assertions while the engine owns the backend.
#[derive(Clone, Default)]
pub struct MockInput {
    state: Arc<Mutex<MockInputState>>,
}

impl MockInput {
    pub fn at(x: i32, y: i32) -> Self {
        let mock = Self::default();
        mock.state.lock().unwrap().position = (x, y);
        mock
    }

    pub fn fail_clicks(&self) {
        self.state.lock().unwrap().fail_clicks = true;
    }

    pub fn ops(&self) -> Vec<InputOp> {
        self.state.lock().unwrap().ops.clone()
    }

    pub fn clicks(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter(|op| matches!(op, InputOp::Click(_)))
            .count()
    }

    pub fn moves(&self) -> Vec<(i32, i32)> {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter_map(|op| match op {
                InputOp::MoveTo(x, y) => Some((*x, *y)),
                _ => None,
            })
            .collect()
    }

    pub fn key_presses(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter_map(|op| match op {
                InputOp::KeyPress(key) => Some(key.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self) -> (i32, i32) {
        self.state.lock().unwrap().position
    }

    pub fn set_cursor(&self, x: i32, y: i32) {
        self.state.lock().unwrap().position = (x, y);
    }
}

impl InputBackend for MockInput {
    fn click(&mut self, button: ClickButton) -> EngineResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_clicks {
            return Err(EngineError::Input("mock click failure".into()));
        }
        state.ops.push(InputOp::Click(button));
        Ok(())
    }

    fn position(&mut self) -> EngineResult<(i32, i32)> {
        Ok(self.state.lock().unwrap().position)
    }

    fn set_position(&mut self, x: i32, y: i32) -> EngineResult<()> {
        let mut state = self.state.lock().unwrap();
        state.position = (x, y);
        state.ops.push(InputOp::MoveTo(x, y));
        Ok(())
    }

    fn press_key(&mut self, key: &str) -> EngineResult<()> {
        self.state
            .lock()
            .unwrap()
            .ops
            .push(InputOp::KeyPress(key.to_string()));
        Ok(())
    }
}

/// Sleeper that records requested durations instead of blocking, so tests
/// can assert delay ranges without wall-clock waits.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sleeps.lock().unwrap().clear();
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Capture backend serving a fixed frame for any requested region.
pub struct FakeCapture {
    pub frame: RgbaImage,
}

impl FakeCapture {
    pub fn new(frame: RgbaImage) -> Self {
        Self { frame }
    }
}

impl CaptureBackend for FakeCapture {
    fn grab_region(&mut self, _region: &ScreenRegion) -> EngineResult<RgbaImage> {
        Ok(self.frame.clone())
    }
}

/// Deterministic high-contrast RGBA test frame. Each pixel is a hash of its
/// coordinates, so misaligned windows mismatch on almost every pixel while
/// an exact crop still matches perfectly.
pub fn noise_frame(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let h = x
            .wrapping_mul(2_654_435_761)
            .wrapping_add(y.wrapping_mul(2_246_822_519))
            .wrapping_add(x.wrapping_mul(y).wrapping_mul(83_492_791));
        image::Rgba([(h >> 16) as u8, (h >> 8) as u8, h as u8, 255])
    })
}
