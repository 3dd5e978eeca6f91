// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use facecam::Config;
use facecam::config::SourceKind;
use facecam::errors::ConfigError;
use std::path::PathBuf;

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("facecam-config-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_config_default() {
    let config = Config::default();

    assert_eq!(config.camera.source, SourceKind::V4l2);
    assert_eq!(config.camera.rotation, 180);
    assert_eq!(config.recording.main_fps, 30);
    assert_eq!(config.recording.face_fps, 3);
    assert!(config.face.model_path.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_gives_defaults() {
    let dir = temp_dir();
    let config = Config::load(Some(&dir.join("absent.json"))).unwrap();
    assert_eq!(config, Config::default());
    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_partial_file_fills_in_defaults() {
    let dir = temp_dir();
    let path = dir.join("config.json");
    std::fs::write(
        &path,
        r#"{ "camera": { "source": "pattern", "width": 640, "height": 480 } }"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.camera.source, SourceKind::Pattern);
    assert_eq!(config.camera.width, 640);
    assert_eq!(config.camera.device, "/dev/video0");
    assert_eq!(config.recording, Default::default());
    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_save_then_load() {
    let dir = temp_dir();
    let path = dir.join("nested").join("config.json");
    let mut config = Config::default();
    config.recording.face_fps = 5;
    config.output.root = dir.join("out");

    config.save(&path).unwrap();
    assert_eq!(Config::load(Some(&path)).unwrap(), config);
    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_malformed_file_is_an_error() {
    let dir = temp_dir();
    let path = dir.join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        Config::load(Some(&path)),
        Err(ConfigError::Parse { .. })
    ));
    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn test_invalid_values_rejected() {
    let mut config = Config::default();
    config.recording.main_fps = 0;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = Config::default();
    config.camera.rotation = 45;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.recording.jpeg_quality = 0;
    assert!(config.validate().is_err());
}
