use crate::error::{EngineError, EngineResult};
use crate::hotkey::{parse_hotkey, Hotkey, HotkeyTable};
use crate::input::{SharedInput, SharedSleeper};
use crate::motion::smooth_move_to;
use crate::settings::ClickButton;
use crate::store::SequenceStore;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Hotkey sampled while a recording session is active.
pub const DEFAULT_RECORD_HOTKEY: &str = "Ctrl+Shift+R";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Click,
    Move,
}

/// One captured pointer action. Immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedAction {
    pub kind: ActionKind,
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button: Option<ClickButton>,
    pub timestamp_ms: i64,
    /// Elapsed time since the previous recorded action, zero for the first.
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedSequence {
    pub name: String,
    pub actions: Vec<RecordedAction>,
    pub created_ms: i64,
}

pub type RecordingListener = Arc<dyn Fn(bool) + Send + Sync>;

struct RecorderShared {
    recording: AtomicBool,
    playing: AtomicBool,
    playback_cancelled: AtomicBool,
    started_at_ms: AtomicI64,
    actions: Mutex<Vec<RecordedAction>>,
}

/// Captures timestamped pointer actions behind a hotkey and replays stored
/// sequences through the motion synthesizer.
pub struct RecordingController {
    input: SharedInput,
    sleeper: SharedSleeper,
    hotkeys: HotkeyTable,
    store: SequenceStore,
    record_hotkey: Hotkey,
    shared: Arc<RecorderShared>,
    listener: Option<RecordingListener>,
}

impl RecordingController {
    pub fn new(
        input: SharedInput,
        sleeper: SharedSleeper,
        hotkeys: HotkeyTable,
        store: SequenceStore,
    ) -> Self {
        let record_hotkey =
            parse_hotkey(DEFAULT_RECORD_HOTKEY).expect("default record hotkey parses");
        Self {
            input,
            sleeper,
            hotkeys,
            store,
            record_hotkey,
            shared: Arc::new(RecorderShared {
                recording: AtomicBool::new(false),
                playing: AtomicBool::new(false),
                playback_cancelled: AtomicBool::new(false),
                started_at_ms: AtomicI64::new(0),
                actions: Mutex::new(Vec::new()),
            }),
            listener: None,
        }
    }

    pub fn set_status_listener(&mut self, listener: RecordingListener) {
        self.listener = Some(listener);
    }

    /// Override the capture hotkey. Takes effect on the next
    /// [`RecordingController::start_recording`].
    pub fn set_record_hotkey(&mut self, hotkey: Hotkey) {
        self.record_hotkey = hotkey;
    }

    pub fn is_recording(&self) -> bool {
        self.shared.recording.load(Ordering::SeqCst)
    }

    pub fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::SeqCst)
    }

    /// Begin a capture session. No-ops when one is already active.
    pub fn start_recording(&self) {
        if self.shared.recording.swap(true, Ordering::SeqCst) {
            return;
        }

        self.shared.actions.lock().unwrap().clear();
        self.shared
            .started_at_ms
            .store(crate::now_ms(), Ordering::SeqCst);

        let shared = self.shared.clone();
        let input = self.input.clone();
        self.hotkeys.register(self.record_hotkey, move || {
            if !shared.recording.load(Ordering::SeqCst) {
                return;
            }
            let position = input.lock().unwrap().position();
            match position {
                Ok((x, y)) => {
                    let now = crate::now_ms();
                    let mut actions = shared.actions.lock().unwrap();
                    let delay_ms = actions
                        .last()
                        .map(|prev| (now - prev.timestamp_ms).max(0) as u64)
                        .unwrap_or(0);
                    actions.push(RecordedAction {
                        kind: ActionKind::Click,
                        x,
                        y,
                        button: Some(ClickButton::Left),
                        timestamp_ms: now,
                        delay_ms,
                    });
                }
                Err(e) => tracing::error!("failed to record click position: {e}"),
            }
        });

        self.notify(true);
        tracing::info!(
            "recording started; press {DEFAULT_RECORD_HOTKEY} to capture click positions"
        );
    }

    /// End the capture session and return it as a sequence named by the stop
    /// timestamp. Safe to call without a prior start.
    pub fn stop_recording(&self) -> RecordedSequence {
        self.shared.recording.store(false, Ordering::SeqCst);
        self.hotkeys.unregister(&self.record_hotkey);

        let actions = self.shared.actions.lock().unwrap().clone();
        let sequence = RecordedSequence {
            name: format!(
                "Recording {}",
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            actions,
            created_ms: self.shared.started_at_ms.load(Ordering::SeqCst),
        };

        self.notify(false);
        tracing::info!("recording stopped; captured {} actions", sequence.actions.len());
        sequence
    }

    /// Replay a sequence. Sleeps each action's recorded delay, then moves
    /// (and clicks) through the motion synthesizer. Cancellation is
    /// cooperative and checked before each action.
    pub fn play_sequence(&self, sequence: &RecordedSequence) -> EngineResult<()> {
        if self
            .shared
            .playing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::AlreadyPlaying);
        }
        self.shared.playback_cancelled.store(false, Ordering::SeqCst);

        tracing::info!(
            "playing sequence '{}' with {} actions",
            sequence.name,
            sequence.actions.len()
        );
        let result = self.play_actions(&sequence.actions);
        self.shared.playing.store(false, Ordering::SeqCst);
        result
    }

    fn play_actions(&self, actions: &[RecordedAction]) -> EngineResult<()> {
        for action in actions {
            if self.shared.playback_cancelled.load(Ordering::SeqCst) {
                break;
            }

            if action.delay_ms > 0 {
                self.sleeper.sleep(Duration::from_millis(action.delay_ms));
            }

            let mut input = self.input.lock().unwrap();
            smooth_move_to(&mut *input, &*self.sleeper, action.x, action.y)?;
            if action.kind == ActionKind::Click {
                input.click(action.button.unwrap_or_default())?;
            }
        }
        Ok(())
    }

    /// Request a cooperative stop of the playback in flight.
    pub fn cancel_playback(&self) {
        self.shared.playback_cancelled.store(true, Ordering::SeqCst);
    }

    pub fn save_sequence(&self, sequence: &RecordedSequence) -> anyhow::Result<()> {
        self.store.save(sequence)
    }

    pub fn load_sequences(&self) -> Vec<RecordedSequence> {
        self.store.load()
    }

    pub fn delete_sequence(&self, name: &str) -> anyhow::Result<()> {
        self.store.delete(name)
    }

    fn notify(&self, recording: bool) {
        if let Some(listener) = &self.listener {
            listener(recording);
        }
    }
}
