//! Configuration file tests.

use tempfile::TempDir;
use vidscribe::storage::{load_config_from, save_config_to, AppConfig, ConfigError};

#[test]
fn test_missing_file_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let config = load_config_from(&dir.path().join("config.toml")).unwrap();

    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = AppConfig::default();
    config.sync.descriptions_enabled = false;
    config.sync.poll_interval_ms = 500;
    config.narration.rate = 1.25;
    config.narration.preferred_voice = Some("Samantha".to_string());
    config.services.descriptions_url = "https://api.example.com/descriptions".to_string();

    save_config_to(&path, &config).unwrap();
    let loaded = load_config_from(&path).unwrap();

    assert!(!loaded.sync.descriptions_enabled);
    assert_eq!(loaded.sync.poll_interval_ms, 500);
    assert_eq!(loaded.narration.rate, 1.25);
    assert_eq!(loaded.narration.preferred_voice.as_deref(), Some("Samantha"));
    assert_eq!(
        loaded.services.descriptions_url,
        "https://api.example.com/descriptions"
    );
}

#[test]
fn test_invalid_file_is_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[sync\npoll_interval_ms = ").unwrap();

    let result = load_config_from(&path);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}
