pub mod app;
pub mod clicker;
pub mod error;
pub mod hotkey;
pub mod input;
pub mod logging;
pub mod motion;
pub mod recorder;
pub mod settings;
pub mod store;
pub mod vision;
pub mod watcher;

/// Milliseconds since the Unix epoch, used for action timestamps and
/// watcher bookkeeping.
pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
