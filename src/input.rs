use crate::error::{EngineError, EngineResult};
use crate::settings::ClickButton;
use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings as EnigoSettings};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Capability boundary over the OS input driver: button clicks, cursor
/// queries/placement and key presses. The engine never talks to the driver
/// directly, which keeps every loop testable against a recording mock.
pub trait InputBackend: Send {
    fn click(&mut self, button: ClickButton) -> EngineResult<()>;
    fn position(&mut self) -> EngineResult<(i32, i32)>;
    fn set_position(&mut self, x: i32, y: i32) -> EngineResult<()>;
    fn press_key(&mut self, key: &str) -> EngineResult<()>;
}

/// Suspension primitive used by every cooperative loop. Production code
/// sleeps the thread; tests record the requested durations instead.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub type SharedInput = Arc<Mutex<dyn InputBackend>>;
pub type SharedSleeper = Arc<dyn Sleeper>;

/// System input driver backed by enigo.
pub struct EnigoBackend {
    enigo: Enigo,
}

impl EnigoBackend {
    pub fn new() -> EngineResult<Self> {
        let enigo = Enigo::new(&EnigoSettings::default())
            .map_err(|e| EngineError::Input(e.to_string()))?;
        Ok(Self { enigo })
    }
}

impl InputBackend for EnigoBackend {
    fn click(&mut self, button: ClickButton) -> EngineResult<()> {
        let button = match button {
            ClickButton::Left => Button::Left,
            ClickButton::Right => Button::Right,
            ClickButton::Middle => Button::Middle,
        };
        self.enigo
            .button(button, Direction::Click)
            .map_err(|e| EngineError::Input(e.to_string()))
    }

    fn position(&mut self) -> EngineResult<(i32, i32)> {
        self.enigo
            .location()
            .map_err(|e| EngineError::Input(e.to_string()))
    }

    fn set_position(&mut self, x: i32, y: i32) -> EngineResult<()> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(|e| EngineError::Input(e.to_string()))
    }

    fn press_key(&mut self, key: &str) -> EngineResult<()> {
        let key = parse_send_key(key)?;
        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| EngineError::Input(e.to_string()))
    }
}

/// Map a key symbol from the settings file ("1", "h", "f5", "space") to an
/// injectable key.
fn parse_send_key(symbol: &str) -> EngineResult<Key> {
    let trimmed = symbol.trim();
    let lower = trimmed.to_ascii_lowercase();
    let key = match lower.as_str() {
        "enter" | "return" => Key::Return,
        "esc" | "escape" => Key::Escape,
        "tab" => Key::Tab,
        "space" => Key::Space,
        "backspace" => Key::Backspace,
        "f1" => Key::F1,
        "f2" => Key::F2,
        "f3" => Key::F3,
        "f4" => Key::F4,
        "f5" => Key::F5,
        "f6" => Key::F6,
        "f7" => Key::F7,
        "f8" => Key::F8,
        "f9" => Key::F9,
        "f10" => Key::F10,
        "f11" => Key::F11,
        "f12" => Key::F12,
        _ => {
            let mut chars = trimmed.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Key::Unicode(c),
                _ => {
                    return Err(EngineError::Input(format!(
                        "unsupported key symbol '{trimmed}'"
                    )))
                }
            }
        }
    };
    Ok(key)
}
