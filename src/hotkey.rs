use rdev::{listen, EventType, Key};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotkey {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Hotkey {
    /// A plain unmodified key.
    pub fn bare(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
            alt: false,
        }
    }
}

/// Parse a hotkey string like "Ctrl+Shift+R" or "esc" into a [`Hotkey`].
pub fn parse_hotkey(s: &str) -> Option<Hotkey> {
    let mut ctrl = false;
    let mut shift = false;
    let mut alt = false;
    let mut key: Option<Key> = None;

    for part in s.split('+') {
        let upper = part.trim().to_ascii_uppercase();
        match upper.as_str() {
            "CTRL" | "CONTROL" => ctrl = true,
            "SHIFT" => shift = true,
            "ALT" => alt = true,
            "" => {}
            _ => {
                if let Some(k) = parse_key(&upper) {
                    key = Some(k);
                } else {
                    return None;
                }
            }
        }
    }

    key.map(|k| Hotkey {
        key: k,
        ctrl,
        shift,
        alt,
    })
}

fn parse_key(upper: &str) -> Option<Key> {
    match upper {
        "SPACE" => Some(Key::Space),
        "TAB" => Some(Key::Tab),
        "ENTER" | "RETURN" => Some(Key::Return),
        "ESC" | "ESCAPE" => Some(Key::Escape),
        "DELETE" => Some(Key::Delete),
        "BACKSPACE" => Some(Key::Backspace),
        "HOME" => Some(Key::Home),
        "END" => Some(Key::End),
        "PAGEUP" => Some(Key::PageUp),
        "PAGEDOWN" => Some(Key::PageDown),
        "LEFT" | "LEFTARROW" => Some(Key::LeftArrow),
        "RIGHT" | "RIGHTARROW" => Some(Key::RightArrow),
        "UP" | "UPARROW" => Some(Key::UpArrow),
        "DOWN" | "DOWNARROW" => Some(Key::DownArrow),
        _ if upper.len() > 1 && upper.starts_with('F') => match upper[1..].parse::<u8>().ok() {
            Some(1) => Some(Key::F1),
            Some(2) => Some(Key::F2),
            Some(3) => Some(Key::F3),
            Some(4) => Some(Key::F4),
            Some(5) => Some(Key::F5),
            Some(6) => Some(Key::F6),
            Some(7) => Some(Key::F7),
            Some(8) => Some(Key::F8),
            Some(9) => Some(Key::F9),
            Some(10) => Some(Key::F10),
            Some(11) => Some(Key::F11),
            Some(12) => Some(Key::F12),
            _ => None,
        },
        _ if upper.len() == 1 => {
            let c = upper.chars().next().unwrap();
            if c.is_ascii_digit() {
                Some(match c {
                    '0' => Key::Num0,
                    '1' => Key::Num1,
                    '2' => Key::Num2,
                    '3' => Key::Num3,
                    '4' => Key::Num4,
                    '5' => Key::Num5,
                    '6' => Key::Num6,
                    '7' => Key::Num7,
                    '8' => Key::Num8,
                    '9' => Key::Num9,
                    _ => return None,
                })
            } else if c.is_ascii_alphabetic() {
                Some(match c {
                    'A' => Key::KeyA,
                    'B' => Key::KeyB,
                    'C' => Key::KeyC,
                    'D' => Key::KeyD,
                    'E' => Key::KeyE,
                    'F' => Key::KeyF,
                    'G' => Key::KeyG,
                    'H' => Key::KeyH,
                    'I' => Key::KeyI,
                    'J' => Key::KeyJ,
                    'K' => Key::KeyK,
                    'L' => Key::KeyL,
                    'M' => Key::KeyM,
                    'N' => Key::KeyN,
                    'O' => Key::KeyO,
                    'P' => Key::KeyP,
                    'Q' => Key::KeyQ,
                    'R' => Key::KeyR,
                    'S' => Key::KeyS,
                    'T' => Key::KeyT,
                    'U' => Key::KeyU,
                    'V' => Key::KeyV,
                    'W' => Key::KeyW,
                    'X' => Key::KeyX,
                    'Y' => Key::KeyY,
                    'Z' => Key::KeyZ,
                    _ => return None,
                })
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Modifier state at the time a key went down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
}

impl Modifiers {
    fn satisfies(&self, hotkey: &Hotkey) -> bool {
        (!hotkey.ctrl || self.ctrl) && (!hotkey.shift || self.shift) && (!hotkey.alt || self.alt)
    }
}

type Callback = Arc<dyn Fn() + Send + Sync>;

struct Binding {
    hotkey: Hotkey,
    callback: Callback,
}

/// The single global hotkey table shared by the clicker engine, the recorder
/// and the host. Whoever registered last owns a given key: `register` is an
/// upsert, and the engine clears the whole table on every session start.
///
/// Callbacks are invoked outside the table lock, so a callback is free to
/// unregister bindings (the stop key does exactly that). Callbacks run on
/// the listener thread and must only flip shared flags; they must not block.
#[derive(Clone, Default)]
pub struct HotkeyTable {
    bindings: Arc<Mutex<Vec<Binding>>>,
}

impl HotkeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, hotkey: Hotkey, callback: impl Fn() + Send + Sync + 'static) {
        let mut bindings = self.bindings.lock().unwrap();
        bindings.retain(|b| b.hotkey != hotkey);
        bindings.push(Binding {
            hotkey,
            callback: Arc::new(callback),
        });
    }

    pub fn unregister(&self, hotkey: &Hotkey) {
        self.bindings.lock().unwrap().retain(|b| b.hotkey != *hotkey);
    }

    pub fn unregister_all(&self) {
        self.bindings.lock().unwrap().clear();
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.lock().unwrap().is_empty()
    }

    /// Deliver a key press to every matching binding. Used by the listener
    /// thread and directly by tests.
    pub fn dispatch(&self, key: Key, modifiers: Modifiers) {
        let matching: Vec<Callback> = {
            let bindings = self.bindings.lock().unwrap();
            bindings
                .iter()
                .filter(|b| b.hotkey.key == key && modifiers.satisfies(&b.hotkey))
                .map(|b| b.callback.clone())
                .collect()
        };
        for callback in matching {
            callback();
        }
    }

    /// Spawn the global key listener. Tracks modifier state and feeds every
    /// key press through [`HotkeyTable::dispatch`]; restarts the listener
    /// after a short delay if the backend fails.
    pub fn spawn_listener(&self) {
        let table = self.clone();
        tracing::debug!("starting global hotkey listener");
        thread::spawn(move || loop {
            let table_listen = table.clone();
            let mut modifiers = Modifiers::default();

            let result = listen(move |event| match event.event_type {
                EventType::KeyPress(k) => {
                    match k {
                        Key::ControlLeft | Key::ControlRight => modifiers.ctrl = true,
                        Key::ShiftLeft | Key::ShiftRight => modifiers.shift = true,
                        Key::Alt | Key::AltGr => modifiers.alt = true,
                        _ => {}
                    }
                    table_listen.dispatch(k, modifiers);
                }
                EventType::KeyRelease(k) => match k {
                    Key::ControlLeft | Key::ControlRight => modifiers.ctrl = false,
                    Key::ShiftLeft | Key::ShiftRight => modifiers.shift = false,
                    Key::Alt | Key::AltGr => modifiers.alt = false,
                    _ => {}
                },
                _ => {}
            });

            match result {
                Ok(()) => tracing::warn!("hotkey listener exited unexpectedly; restarting shortly"),
                Err(e) => tracing::warn!("hotkey listener failed: {:?}; retrying shortly", e),
            }

            thread::sleep(Duration::from_millis(500));
        });
    }
}
