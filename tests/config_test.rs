//! Tests for layered settings

use std::collections::HashMap;

use config::Environment;
use tempfile::TempDir;

use bfsviz::application::ApplicationError;
use bfsviz::config::Settings;

fn no_env() -> Environment {
    Settings::env_source().source(Some(HashMap::new()))
}

#[test]
fn given_partial_config_file_when_loading_then_missing_keys_keep_defaults() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bfsviz.toml");
    std::fs::write(&path, "[pacing]\ndecay = 0.9\n").unwrap();

    // Act
    let settings = Settings::load_from(Some(&path), no_env()).unwrap();

    // Assert
    assert_eq!(settings.pacing.decay, 0.9);
    assert_eq!(settings.pacing.warmup_nodes, 4);
    assert_eq!(settings.layout.x_step, 1.4);
}

#[test]
fn given_file_and_env_when_loading_then_env_wins() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bfsviz.toml");
    std::fs::write(&path, "scene_dir = \"/from/file\"\n[layout]\ny_spacing = 1.0\n").unwrap();
    let env = Settings::env_source().source(Some(HashMap::from([(
            "BFSVIZ_LAYOUT__Y_SPACING".to_string(),
            "0.75".to_string(),
        )])));

    let settings = Settings::load_from(Some(&path), env).unwrap();

    assert_eq!(settings.layout.y_spacing, 0.75);
    assert_eq!(settings.scene_dir.to_string_lossy(), "/from/file");
}

#[test]
fn given_missing_config_file_when_loading_then_defaults() {
    let temp = TempDir::new().unwrap();

    let settings = Settings::load_from(Some(&temp.path().join("absent.toml")), no_env()).unwrap();

    assert_eq!(settings.pacing, Settings::default().pacing);
}

#[test]
fn given_malformed_config_file_when_loading_then_config_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bfsviz.toml");
    std::fs::write(&path, "[layout\nx_step = 2").unwrap();

    let result = Settings::load_from(Some(&path), no_env());

    assert!(matches!(result, Err(ApplicationError::Config { .. })));
}
