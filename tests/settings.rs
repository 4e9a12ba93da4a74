use click_pilot::error::EngineError;
use click_pilot::settings::{ClickButton, ClickMode, ClickerSettings, RotationConfig};
use tempfile::tempdir;

#[test]
fn defaults_match_the_documented_profile() {
    let settings = ClickerSettings::default();
    assert_eq!(settings.mode, ClickMode::Hold);
    assert_eq!(settings.min_delay_ms, 1);
    assert_eq!(settings.max_delay_ms, 5);
    assert_eq!(settings.burst_count, 10);
    assert_eq!(settings.click_key, "h");
    assert_eq!(settings.stop_key, "esc");
    assert_eq!(settings.button, ClickButton::Left);
    assert!(settings.rotation.is_none());
    assert!(settings.validate().is_ok());
}

#[test]
fn validate_rejects_inverted_delays() {
    let settings = ClickerSettings {
        min_delay_ms: 10,
        max_delay_ms: 5,
        ..Default::default()
    };
    assert!(matches!(
        settings.validate(),
        Err(EngineError::InvalidSettings(_))
    ));
}

#[test]
fn validate_rejects_zero_delay_and_zero_burst() {
    let settings = ClickerSettings {
        min_delay_ms: 0,
        ..Default::default()
    };
    assert!(settings.validate().is_err());

    let settings = ClickerSettings {
        burst_count: 0,
        ..Default::default()
    };
    assert!(settings.validate().is_err());
}

#[test]
fn validate_rejects_colliding_keys() {
    let settings = ClickerSettings {
        click_key: "esc".into(),
        stop_key: "esc".into(),
        ..Default::default()
    };
    assert!(settings.validate().is_err());
}

#[test]
fn partial_json_fills_missing_fields_with_defaults() {
    let settings: ClickerSettings =
        serde_json::from_str(r#"{"mode": "burst", "burst_count": 3}"#).unwrap();
    assert_eq!(settings.mode, ClickMode::Burst);
    assert_eq!(settings.burst_count, 3);
    assert_eq!(settings.min_delay_ms, 1);
    assert_eq!(settings.click_key, "h");
}

#[test]
fn load_missing_file_returns_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clicker.json");
    let settings = ClickerSettings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(settings.mode, ClickMode::Hold);
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clicker.json");

    let settings = ClickerSettings {
        mode: ClickMode::Rotation,
        min_delay_ms: 2,
        max_delay_ms: 9,
        click_key: "g".into(),
        rotation: Some(RotationConfig {
            ability_keys: vec!["1".into(), "2".into()],
            shuffle_rotation: false,
            ..Default::default()
        }),
        ..Default::default()
    };
    settings.save(path.to_str().unwrap()).unwrap();

    let loaded = ClickerSettings::load(path.to_str().unwrap()).unwrap();
    assert_eq!(loaded.mode, ClickMode::Rotation);
    assert_eq!(loaded.max_delay_ms, 9);
    let rotation = loaded.rotation.expect("rotation survives the round trip");
    assert_eq!(rotation.ability_keys, vec!["1", "2"]);
    assert!(!rotation.shuffle_rotation);
}

#[test]
fn rotation_resolve_without_overrides_uses_defaults() {
    let resolved = RotationConfig::resolve(None);
    assert_eq!(resolved.ability_keys, vec!["1", "2", "3", "4", "5", "6"]);
    assert_eq!(resolved.min_ability_delay_ms, 800);
    assert_eq!(resolved.max_ability_delay_ms, 1400);
    assert!(resolved.shuffle_rotation);
    assert_eq!(resolved.pause_chance, 15);
}

#[test]
fn rotation_resolve_substitutes_empty_ability_keys() {
    let overrides = RotationConfig {
        ability_keys: Vec::new(),
        min_ability_delay_ms: 100,
        max_ability_delay_ms: 200,
        ..Default::default()
    };
    let resolved = RotationConfig::resolve(Some(&overrides));
    // An empty key set falls back to the built-in rotation, not to no-op.
    assert_eq!(resolved.ability_keys, vec!["1", "2", "3", "4", "5", "6"]);
    assert_eq!(resolved.min_ability_delay_ms, 100);
    assert_eq!(resolved.max_ability_delay_ms, 200);
}

#[test]
fn rotation_partial_json_gets_field_defaults() {
    let rotation: RotationConfig = serde_json::from_str(r#"{"pause_chance": 40}"#).unwrap();
    assert_eq!(rotation.pause_chance, 40);
    assert_eq!(rotation.pause_min_ms, 1500);
    assert_eq!(rotation.pause_max_ms, 3200);
    assert_eq!(rotation.ability_keys.len(), 6);
}

#[test]
fn mode_parse_accepts_known_names_only() {
    assert_eq!(ClickMode::parse("Burst"), Some(ClickMode::Burst));
    assert_eq!(ClickMode::parse("rotation"), Some(ClickMode::Rotation));
    assert_eq!(ClickMode::parse("warp"), None);
}
