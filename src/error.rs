use std::path::PathBuf;
use thiserror::Error;

/// Failures surfaced by the automation engine.
///
/// Loop-internal input/capture failures are logged where they occur and do
/// not bubble up through these variants; only user-invoked operations return
/// them.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("clicker is already running")]
    AlreadyRunning,
    #[error("screen watcher is already running")]
    WatcherAlreadyRunning,
    #[error("a sequence is already playing")]
    AlreadyPlaying,
    #[error("template image not found at {}", .0.display())]
    TemplateNotFound(PathBuf),
    #[error("invalid settings: {0}")]
    InvalidSettings(String),
    #[error("input backend failure: {0}")]
    Input(String),
    #[error("screen capture failure: {0}")]
    Capture(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
