use crate::error::{EngineError, EngineResult};
use crate::input::{SharedInput, SharedSleeper};
use crate::motion::smooth_move_to;
use crate::settings::ClickButton;
use crate::vision::{find_image, MatchOptions, ScreenRegion, SharedCapture};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Floor for the polling interval regardless of configuration.
const MIN_POLL_INTERVAL_MS: u64 = 250;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    pub template_path: PathBuf,
    pub region: ScreenRegion,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default)]
    pub auto_click: bool,
    /// Offset applied to the match point before clicking.
    #[serde(default)]
    pub click_offset: Option<(i32, i32)>,
    #[serde(default)]
    pub match_options: MatchOptions,
}

fn default_poll_interval() -> u64 {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchMatch {
    pub x: i32,
    pub y: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    pub at_ms: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_check_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_match: Option<WatchMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WatcherStatus {
    fn idle() -> Self {
        Self {
            running: false,
            last_check_ms: None,
            last_match: None,
            error: None,
        }
    }
}

pub type WatcherListener = Arc<dyn Fn(WatcherStatus) + Send + Sync>;

struct WatcherShared {
    running: AtomicBool,
    config: Mutex<Option<WatcherConfig>>,
    status: Mutex<WatcherStatus>,
}

/// Polls the template matcher on an interval and optionally clicks the
/// match point through the motion synthesizer.
#[derive(Clone)]
pub struct ScreenWatcher {
    capture: SharedCapture,
    input: SharedInput,
    sleeper: SharedSleeper,
    shared: Arc<WatcherShared>,
    listener: Option<WatcherListener>,
}

impl ScreenWatcher {
    pub fn new(capture: SharedCapture, input: SharedInput, sleeper: SharedSleeper) -> Self {
        Self {
            capture,
            input,
            sleeper,
            shared: Arc::new(WatcherShared {
                running: AtomicBool::new(false),
                config: Mutex::new(None),
                status: Mutex::new(WatcherStatus::idle()),
            }),
            listener: None,
        }
    }

    pub fn set_status_listener(&mut self, listener: WatcherListener) {
        self.listener = Some(listener);
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Begin watching. Performs one poll immediately; subsequent polls are
    /// driven by [`ScreenWatcher::run`].
    pub fn start(&self, config: WatcherConfig) -> EngineResult<()> {
        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::WatcherAlreadyRunning);
        }

        *self.shared.config.lock().unwrap() = Some(config);
        {
            let mut status = self.shared.status.lock().unwrap();
            *status = WatcherStatus::idle();
            status.running = true;
        }

        self.poll_once();
        self.emit_status();
        Ok(())
    }

    /// Re-poll until stopped, spacing polls by the configured interval with
    /// a 250 ms floor.
    pub fn run(&self) {
        while self.is_running() {
            let interval = {
                let config = self.shared.config.lock().unwrap();
                config
                    .as_ref()
                    .map(|c| c.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
                    .unwrap_or(MIN_POLL_INTERVAL_MS)
            };
            self.sleeper.sleep(Duration::from_millis(interval));
            if !self.is_running() {
                break;
            }
            self.poll_once();
        }
    }

    /// Cancel the polling loop and reset to idle status.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        *self.shared.config.lock().unwrap() = None;
        *self.shared.status.lock().unwrap() = WatcherStatus::idle();
        self.emit_status();
    }

    pub fn status(&self) -> WatcherStatus {
        self.shared.status.lock().unwrap().clone()
    }

    /// One poll: match the template, stamp `last_check`, record the match
    /// and optionally click it. Errors are captured into the status and
    /// cleared again by the next successful poll.
    pub fn poll_once(&self) {
        let config = match self.shared.config.lock().unwrap().clone() {
            Some(config) => config,
            None => return,
        };

        let now = crate::now_ms();
        let found = {
            let mut capture = self.capture.lock().unwrap();
            find_image(
                &mut *capture,
                &config.region,
                &config.template_path,
                &config.match_options,
            )
        };

        {
            let mut status = self.shared.status.lock().unwrap();
            status.last_check_ms = Some(now);
            match &found {
                Ok(result) => {
                    if let (true, Some(x), Some(y)) = (result.found, result.x, result.y) {
                        status.last_match = Some(WatchMatch {
                            x,
                            y,
                            score: result.score,
                            at_ms: now,
                        });
                    }
                    status.error = None;
                }
                Err(e) => status.error = Some(e.to_string()),
            }
        }

        if let Ok(result) = &found {
            if config.auto_click {
                if let (true, Some(x), Some(y)) = (result.found, result.x, result.y) {
                    if let Err(e) = self.click_at(x, y, &config) {
                        self.shared.status.lock().unwrap().error = Some(e.to_string());
                    }
                }
            }
        }

        self.emit_status();
    }

    fn click_at(&self, x: i32, y: i32, config: &WatcherConfig) -> EngineResult<()> {
        let (offset_x, offset_y) = config.click_offset.unwrap_or((0, 0));
        let mut input = self.input.lock().unwrap();
        smooth_move_to(&mut *input, &*self.sleeper, x + offset_x, y + offset_y)?;
        input.click(ClickButton::Left)
    }

    fn emit_status(&self) {
        if let Some(listener) = &self.listener {
            listener(self.status());
        }
    }
}
