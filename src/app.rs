use crate::clicker::{ClickerEngine, ClickerStatus};
use crate::error::EngineResult;
use crate::hotkey::HotkeyTable;
use crate::input::{EnigoBackend, SharedInput, SharedSleeper, ThreadSleeper};
use crate::motion::smooth_move_to;
use crate::recorder::{RecordedSequence, RecordingController};
use crate::settings::ClickerSettings;
use crate::store::SequenceStore;
use crate::vision::{
    self, ColorSpec, MatchOptions, MatchResult, ScreenCapture, ScreenRegion, SharedCapture,
};
use crate::watcher::{ScreenWatcher, WatcherConfig, WatcherStatus};
use image::RgbaImage;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Status pushed back to the host whenever a component changes state.
#[derive(Debug, Clone)]
pub enum StatusEvent {
    Clicker(ClickerStatus),
    Recording { recording: bool },
    Watcher(WatcherStatus),
}

pub type StatusCallback = Arc<dyn Fn(StatusEvent) + Send + Sync>;

/// Command facade over the automation components. The host (a terminal
/// host here, a window host in a larger build) issues every command through
/// this struct and receives pushes through the single status callback.
pub struct AutomationApp {
    hotkeys: HotkeyTable,
    input: SharedInput,
    sleeper: SharedSleeper,
    capture: SharedCapture,
    clicker: ClickerEngine,
    recorder: RecordingController,
    watcher: ScreenWatcher,
}

impl AutomationApp {
    pub fn new(
        input: SharedInput,
        capture: SharedCapture,
        sleeper: SharedSleeper,
        store: SequenceStore,
        status: Option<StatusCallback>,
    ) -> Self {
        let hotkeys = HotkeyTable::new();

        let mut clicker = ClickerEngine::new(input.clone(), sleeper.clone(), hotkeys.clone());
        let mut recorder =
            RecordingController::new(input.clone(), sleeper.clone(), hotkeys.clone(), store);
        let mut watcher = ScreenWatcher::new(capture.clone(), input.clone(), sleeper.clone());

        if let Some(callback) = status {
            let cb = callback.clone();
            clicker.set_status_listener(Arc::new(move |s| cb(StatusEvent::Clicker(s))));
            let cb = callback.clone();
            recorder.set_status_listener(Arc::new(move |recording| {
                cb(StatusEvent::Recording { recording })
            }));
            let cb = callback;
            watcher.set_status_listener(Arc::new(move |s| cb(StatusEvent::Watcher(s))));
        }

        Self {
            hotkeys,
            input,
            sleeper,
            capture,
            clicker,
            recorder,
            watcher,
        }
    }

    /// Wire the real OS backends and the platform-default sequence store.
    pub fn with_system_backends(status: Option<StatusCallback>) -> EngineResult<Self> {
        let input: SharedInput = Arc::new(Mutex::new(EnigoBackend::new()?));
        let capture: SharedCapture = Arc::new(Mutex::new(ScreenCapture));
        let sleeper: SharedSleeper = Arc::new(ThreadSleeper);
        let store = SequenceStore::new(SequenceStore::default_dir());
        Ok(Self::new(input, capture, sleeper, store, status))
    }

    /// The shared hotkey table, so the host can spawn the global listener.
    pub fn hotkeys(&self) -> &HotkeyTable {
        &self.hotkeys
    }

    pub fn start_clicker(&self, settings: ClickerSettings) -> EngineResult<()> {
        self.clicker.start(settings)
    }

    /// Drive the clicker loop on the calling thread until stopped.
    pub fn run_clicker(&self) {
        self.clicker.run();
    }

    pub fn stop_clicker(&self) {
        self.clicker.stop();
    }

    pub fn clicker_status(&self) -> ClickerStatus {
        self.clicker.status()
    }

    pub fn start_recording(&self) {
        self.recorder.start_recording();
    }

    pub fn stop_recording(&self) -> RecordedSequence {
        self.recorder.stop_recording()
    }

    pub fn play_sequence(&self, sequence: &RecordedSequence) -> EngineResult<()> {
        self.recorder.play_sequence(sequence)
    }

    pub fn cancel_playback(&self) {
        self.recorder.cancel_playback();
    }

    pub fn save_sequence(&self, sequence: &RecordedSequence) -> anyhow::Result<()> {
        self.recorder.save_sequence(sequence)
    }

    pub fn load_sequences(&self) -> Vec<RecordedSequence> {
        self.recorder.load_sequences()
    }

    pub fn delete_sequence(&self, name: &str) -> anyhow::Result<()> {
        self.recorder.delete_sequence(name)
    }

    pub fn capture_region(&self, region: &ScreenRegion) -> EngineResult<RgbaImage> {
        self.capture.lock().unwrap().grab_region(region)
    }

    pub fn find_color(&self, region: &ScreenRegion, color: &ColorSpec) -> EngineResult<MatchResult> {
        let mut capture = self.capture.lock().unwrap();
        vision::find_color(&mut *capture, region, color)
    }

    pub fn find_image(
        &self,
        region: &ScreenRegion,
        template_path: &Path,
        options: &MatchOptions,
    ) -> EngineResult<MatchResult> {
        let mut capture = self.capture.lock().unwrap();
        vision::find_image(&mut *capture, region, template_path, options)
    }

    pub fn start_watcher(&self, config: WatcherConfig) -> EngineResult<()> {
        self.watcher.start(config)
    }

    /// Drive the watcher polling loop on the calling thread until stopped.
    pub fn run_watcher(&self) {
        self.watcher.run();
    }

    pub fn stop_watcher(&self) {
        self.watcher.stop();
    }

    pub fn watcher_status(&self) -> WatcherStatus {
        self.watcher.status()
    }

    /// Humanized cursor move to an absolute point.
    pub fn move_mouse(&self, x: i32, y: i32) -> EngineResult<()> {
        let mut input = self.input.lock().unwrap();
        smooth_move_to(&mut *input, &*self.sleeper, x, y)
    }
}
