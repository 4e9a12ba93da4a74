use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickMode {
    Toggle,
    Hold,
    Double,
    Random,
    Burst,
    Rotation,
}

impl Default for ClickMode {
    fn default() -> Self {
        ClickMode::Hold
    }
}

impl std::fmt::Display for ClickMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClickMode::Toggle => write!(f, "toggle"),
            ClickMode::Hold => write!(f, "hold"),
            ClickMode::Double => write!(f, "double"),
            ClickMode::Random => write!(f, "random"),
            ClickMode::Burst => write!(f, "burst"),
            ClickMode::Rotation => write!(f, "rotation"),
        }
    }
}

impl ClickMode {
    /// Parse a mode name as used on the command line and in settings files.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "toggle" => Some(ClickMode::Toggle),
            "hold" => Some(ClickMode::Hold),
            "double" => Some(ClickMode::Double),
            "random" => Some(ClickMode::Random),
            "burst" => Some(ClickMode::Burst),
            "rotation" => Some(ClickMode::Rotation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickButton {
    Left,
    Right,
    Middle,
}

impl Default for ClickButton {
    fn default() -> Self {
        ClickButton::Left
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickerSettings {
    #[serde(default)]
    pub mode: ClickMode,
    /// Minimum delay between ticks in milliseconds.
    #[serde(default = "default_min_delay")]
    pub min_delay_ms: u64,
    /// Maximum delay between ticks in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// Clicks fired per press in burst mode.
    #[serde(default = "default_burst_count")]
    pub burst_count: u32,
    /// Hotkey that engages/disengages the active mode.
    #[serde(default = "default_click_key")]
    pub click_key: String,
    /// Hotkey that force-stops the running session.
    #[serde(default = "default_stop_key")]
    pub stop_key: String,
    #[serde(default)]
    pub button: ClickButton,
    /// Overrides for rotation mode. Missing fields fall back to the
    /// built-in rotation defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<RotationConfig>,
}

fn default_min_delay() -> u64 {
    1
}

fn default_max_delay() -> u64 {
    5
}

fn default_burst_count() -> u32 {
    10
}

fn default_click_key() -> String {
    "h".into()
}

fn default_stop_key() -> String {
    "esc".into()
}

impl Default for ClickerSettings {
    fn default() -> Self {
        Self {
            mode: ClickMode::default(),
            min_delay_ms: default_min_delay(),
            max_delay_ms: default_max_delay(),
            burst_count: default_burst_count(),
            click_key: default_click_key(),
            stop_key: default_stop_key(),
            button: ClickButton::default(),
            rotation: None,
        }
    }
}

impl ClickerSettings {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &str) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject settings that would put the engine in an invalid runtime state.
    pub fn validate(&self) -> EngineResult<()> {
        if self.min_delay_ms == 0 || self.max_delay_ms == 0 {
            return Err(EngineError::InvalidSettings(
                "delays must be positive".into(),
            ));
        }
        if self.min_delay_ms > self.max_delay_ms {
            return Err(EngineError::InvalidSettings(
                "minimum delay cannot be greater than maximum delay".into(),
            ));
        }
        if self.burst_count == 0 {
            return Err(EngineError::InvalidSettings(
                "burst count must be at least 1".into(),
            ));
        }
        if self.click_key.trim().is_empty() || self.stop_key.trim().is_empty() {
            return Err(EngineError::InvalidSettings(
                "key names cannot be empty".into(),
            ));
        }
        if self.click_key.eq_ignore_ascii_case(&self.stop_key) {
            return Err(EngineError::InvalidSettings(
                "click key and stop key must differ".into(),
            ));
        }
        if let Some(rotation) = &self.rotation {
            rotation.validate()?;
        }
        Ok(())
    }
}

/// Ability-rotation overrides. Every field has a sensible default so a host
/// may send a partial config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotationConfig {
    #[serde(default = "default_ability_keys")]
    pub ability_keys: Vec<String>,
    #[serde(default = "default_min_ability_delay")]
    pub min_ability_delay_ms: u64,
    #[serde(default = "default_max_ability_delay")]
    pub max_ability_delay_ms: u64,
    #[serde(default = "default_shuffle_rotation")]
    pub shuffle_rotation: bool,
    /// Chance in percent of inserting a longer pause after a full rotation.
    #[serde(default = "default_pause_chance")]
    pub pause_chance: u8,
    #[serde(default = "default_pause_min")]
    pub pause_min_ms: u64,
    #[serde(default = "default_pause_max")]
    pub pause_max_ms: u64,
}

fn default_ability_keys() -> Vec<String> {
    ["1", "2", "3", "4", "5", "6"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_min_ability_delay() -> u64 {
    800
}

fn default_max_ability_delay() -> u64 {
    1400
}

fn default_shuffle_rotation() -> bool {
    true
}

fn default_pause_chance() -> u8 {
    15
}

fn default_pause_min() -> u64 {
    1500
}

fn default_pause_max() -> u64 {
    3200
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            ability_keys: default_ability_keys(),
            min_ability_delay_ms: default_min_ability_delay(),
            max_ability_delay_ms: default_max_ability_delay(),
            shuffle_rotation: default_shuffle_rotation(),
            pause_chance: default_pause_chance(),
            pause_min_ms: default_pause_min(),
            pause_max_ms: default_pause_max(),
        }
    }
}

impl RotationConfig {
    /// Return a config ready for the rotation loop. An empty ability-key
    /// list always falls back to the built-in default set.
    pub fn resolve(overrides: Option<&RotationConfig>) -> RotationConfig {
        let mut resolved = overrides.cloned().unwrap_or_default();
        if resolved.ability_keys.is_empty() {
            resolved.ability_keys = default_ability_keys();
        }
        resolved
    }

    fn validate(&self) -> EngineResult<()> {
        if self.min_ability_delay_ms > self.max_ability_delay_ms {
            return Err(EngineError::InvalidSettings(
                "minimum ability delay cannot be greater than maximum".into(),
            ));
        }
        if self.pause_chance > 100 {
            return Err(EngineError::InvalidSettings(
                "pause chance is a percentage between 0 and 100".into(),
            ));
        }
        if self.pause_min_ms > self.pause_max_ms {
            return Err(EngineError::InvalidSettings(
                "minimum pause cannot be greater than maximum pause".into(),
            ));
        }
        Ok(())
    }
}
