use crate::error::{EngineError, EngineResult};
use crate::hotkey::{parse_hotkey, HotkeyTable};
use crate::input::{SharedInput, SharedSleeper};
use crate::settings::{ClickMode, ClickerSettings, RotationConfig};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DOUBLE_CLICK_GAP: Duration = Duration::from_millis(10);
const RANDOM_MODE_DELAY_MULTIPLIER: u64 = 2;
const BURST_IDLE_POLL: Duration = Duration::from_millis(10);
const ROTATION_IDLE_POLL: Duration = Duration::from_millis(100);

/// Whether the click key currently has the mode clicking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngagementState {
    Idle,
    Engaged,
}

/// Toggling intent of the click key, kept separate from the scheduling loop
/// so the transition is testable on its own. Flipped from the hotkey
/// listener, read at tick boundaries.
#[derive(Clone, Default)]
pub struct Engagement {
    engaged: Arc<AtomicBool>,
}

impl Engagement {
    pub fn toggle(&self) -> EngagementState {
        if self.engaged.fetch_xor(true, Ordering::SeqCst) {
            EngagementState::Idle
        } else {
            EngagementState::Engaged
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.engaged.store(false, Ordering::SeqCst);
    }
}

/// Cooperative cancellation for the rotation loop. Set once by `stop`,
/// observed at iteration boundaries only; an in-flight key press is never
/// interrupted.
#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Snapshot pushed to the host on every state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickerStatus {
    pub running: bool,
    pub mode: ClickMode,
    pub settings: ClickerSettings,
}

pub type StatusListener = Arc<dyn Fn(ClickerStatus) + Send + Sync>;

struct Session {
    mode: ClickMode,
    settings: ClickerSettings,
    cancel: CancelToken,
}

struct EngineShared {
    running: AtomicBool,
    engagement: Engagement,
    pending_presses: AtomicUsize,
    session: Mutex<Session>,
}

/// Owns the click-mode state machines. One session at a time; settings are
/// replaced atomically on each start and the hotkey table is cleared and
/// re-bound for the session.
#[derive(Clone)]
pub struct ClickerEngine {
    input: SharedInput,
    sleeper: SharedSleeper,
    hotkeys: HotkeyTable,
    shared: Arc<EngineShared>,
    listener: Option<StatusListener>,
}

impl ClickerEngine {
    pub fn new(input: SharedInput, sleeper: SharedSleeper, hotkeys: HotkeyTable) -> Self {
        Self {
            input,
            sleeper,
            hotkeys,
            shared: Arc::new(EngineShared {
                running: AtomicBool::new(false),
                engagement: Engagement::default(),
                pending_presses: AtomicUsize::new(0),
                session: Mutex::new(Session {
                    mode: ClickMode::default(),
                    settings: ClickerSettings::default(),
                    cancel: CancelToken::default(),
                }),
            }),
            listener: None,
        }
    }

    pub fn set_status_listener(&mut self, listener: StatusListener) {
        self.listener = Some(listener);
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Begin a clicking session. Binds the stop key and the mode's click
    /// key after clearing every previous registration.
    pub fn start(&self, settings: ClickerSettings) -> EngineResult<()> {
        settings.validate()?;
        let stop_hotkey = parse_hotkey(&settings.stop_key).ok_or_else(|| {
            EngineError::InvalidSettings(format!("unknown stop key '{}'", settings.stop_key))
        })?;
        let click_hotkey = parse_hotkey(&settings.click_key).ok_or_else(|| {
            EngineError::InvalidSettings(format!("unknown click key '{}'", settings.click_key))
        })?;

        if self
            .shared
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::AlreadyRunning);
        }

        let mode = settings.mode;
        self.shared.engagement.reset();
        self.shared.pending_presses.store(0, Ordering::SeqCst);
        {
            let mut session = self.shared.session.lock().unwrap();
            session.mode = mode;
            session.settings = settings;
            session.cancel = CancelToken::default();
        }

        self.hotkeys.unregister_all();

        let engine = self.clone();
        self.hotkeys.register(stop_hotkey, move || engine.stop());

        match mode {
            ClickMode::Burst => {
                let shared = self.shared.clone();
                self.hotkeys.register(click_hotkey, move || {
                    shared.pending_presses.fetch_add(1, Ordering::SeqCst);
                });
            }
            _ => {
                let engagement = self.shared.engagement.clone();
                self.hotkeys.register(click_hotkey, move || {
                    let state = engagement.toggle();
                    tracing::info!(
                        "{mode} mode: {}",
                        if state == EngagementState::Engaged {
                            "ON"
                        } else {
                            "OFF"
                        }
                    );
                });
            }
        }

        self.emit_status();
        Ok(())
    }

    /// Stop the session. Idempotent: cancels the rotation loop, drops every
    /// queued press, releases all hotkeys and pushes a stopped status.
    pub fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        self.shared.session.lock().unwrap().cancel.cancel();
        self.shared.engagement.reset();
        self.shared.pending_presses.store(0, Ordering::SeqCst);
        self.hotkeys.unregister_all();
        self.emit_status();
    }

    pub fn status(&self) -> ClickerStatus {
        let session = self.shared.session.lock().unwrap();
        ClickerStatus {
            running: self.is_running(),
            mode: session.mode,
            settings: session.settings.clone(),
        }
    }

    /// Drive the session until stopped by the stop key or [`ClickerEngine::stop`].
    pub fn run(&self) {
        while self.is_running() {
            self.tick();
        }
    }

    /// One scheduled evaluation of the active mode followed by its delay.
    /// Rescheduling happens after the click work completes, so slow clicks
    /// stretch the period instead of overlapping ticks.
    pub fn tick(&self) {
        let (mode, settings, cancel) = {
            let session = self.shared.session.lock().unwrap();
            (session.mode, session.settings.clone(), session.cancel.clone())
        };

        match mode {
            ClickMode::Toggle | ClickMode::Hold => {
                if self.shared.engagement.is_engaged() {
                    self.perform_click(&settings);
                }
                self.sleep_uniform(settings.min_delay_ms, settings.max_delay_ms);
            }
            ClickMode::Double => {
                if self.shared.engagement.is_engaged() {
                    self.perform_double_click(&settings);
                }
                self.sleep_uniform(settings.min_delay_ms, settings.max_delay_ms);
            }
            ClickMode::Random => {
                if self.shared.engagement.is_engaged() {
                    self.perform_click(&settings);
                }
                // Doubled spacing dampens the detectable periodicity.
                let delay =
                    rand::thread_rng().gen_range(settings.min_delay_ms..=settings.max_delay_ms);
                self.sleeper
                    .sleep(Duration::from_millis(delay * RANDOM_MODE_DELAY_MULTIPLIER));
            }
            ClickMode::Burst => {
                let pending = self.shared.pending_presses.swap(0, Ordering::SeqCst);
                if pending == 0 {
                    self.sleeper.sleep(BURST_IDLE_POLL);
                } else {
                    for _ in 0..pending {
                        if !self.is_running() {
                            break;
                        }
                        self.perform_burst(&settings);
                    }
                }
            }
            ClickMode::Rotation => self.rotation_cycle(&settings, &cancel),
        }
    }

    fn perform_click(&self, settings: &ClickerSettings) {
        if let Err(e) = self.input.lock().unwrap().click(settings.button) {
            tracing::error!("error performing click: {e}");
        }
    }

    fn perform_double_click(&self, settings: &ClickerSettings) {
        let result = (|| -> EngineResult<()> {
            self.input.lock().unwrap().click(settings.button)?;
            self.sleeper.sleep(DOUBLE_CLICK_GAP);
            self.input.lock().unwrap().click(settings.button)?;
            Ok(())
        })();
        if let Err(e) = result {
            tracing::error!("error performing double click: {e}");
        }
    }

    /// Fire one queued burst: `burst_count` clicks with a uniform delay
    /// between each and none after the last.
    fn perform_burst(&self, settings: &ClickerSettings) {
        for i in 0..settings.burst_count {
            if !self.is_running() {
                break;
            }
            self.perform_click(settings);
            if i + 1 < settings.burst_count {
                self.sleep_uniform(settings.min_delay_ms, settings.max_delay_ms);
            }
        }
    }

    /// One full traversal of the ability keys, or a short idle recheck when
    /// the rotation is toggled off. Disengagement, cancellation and engine
    /// stop are all observed at iteration boundaries.
    fn rotation_cycle(&self, settings: &ClickerSettings, cancel: &CancelToken) {
        if !self.shared.engagement.is_engaged() {
            self.sleeper.sleep(ROTATION_IDLE_POLL);
            return;
        }

        let config = RotationConfig::resolve(settings.rotation.as_ref());
        let mut abilities = config.ability_keys.clone();
        if config.shuffle_rotation {
            abilities.shuffle(&mut rand::thread_rng());
        }

        for ability in &abilities {
            if !self.shared.engagement.is_engaged() || cancel.is_cancelled() || !self.is_running()
            {
                break;
            }
            if let Err(e) = self.input.lock().unwrap().press_key(ability) {
                tracing::error!("error pressing ability key '{ability}': {e}");
            }
            self.sleep_uniform(config.min_ability_delay_ms, config.max_ability_delay_ms);
        }

        let roll = rand::thread_rng().gen_range(0.0..100.0);
        if config.pause_chance > 0 && roll < f64::from(config.pause_chance) && !cancel.is_cancelled()
        {
            let pause = rand::thread_rng().gen_range(config.pause_min_ms..=config.pause_max_ms);
            tracing::debug!("rotation micro break for {pause}ms");
            self.sleeper.sleep(Duration::from_millis(pause));
        }
    }

    fn sleep_uniform(&self, min_ms: u64, max_ms: u64) {
        let delay = rand::thread_rng().gen_range(min_ms..=max_ms);
        self.sleeper.sleep(Duration::from_millis(delay));
    }

    fn emit_status(&self) {
        if let Some(listener) = &self.listener {
            listener(self.status());
        }
    }
}
