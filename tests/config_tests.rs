// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use virtualcam::{CameraConfig, CameraError, PixelFormat};

#[test]
fn test_config_default() {
    // Test that default config can be created and used as is
    let config = CameraConfig::default();

    assert_eq!((config.width, config.height), (1280, 720));
    assert_eq!(config.fps, 30.0);
    assert_eq!(config.format, PixelFormat::Rgb, "RGB should be the default format");
    assert!(config.backend.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_json_round_trip() {
    let config = CameraConfig::new(640, 480, 24.0)
        .with_format(PixelFormat::Uyvy)
        .with_backend("pipewire")
        .with_print_fps(true)
        .with_option("node_name", serde_json::json!("studio"));

    let json = config.to_json().unwrap();
    assert!(json.contains("\"UYVY\""));
    assert_eq!(CameraConfig::from_json(&json).unwrap(), config);
}

#[test]
fn test_config_unset_fields_are_omitted() {
    // Optional fields only appear when set
    let json = CameraConfig::default().to_json().unwrap();
    assert!(!json.contains("device"));
    assert!(!json.contains("backend"));
    assert!(!json.contains("options"));
}

#[test]
fn test_config_save_and_load() {
    let dir = std::env::temp_dir().join(format!("virtualcam-config-test-{}", std::process::id()));
    let path = dir.join("nested").join("config.json");
    let config = CameraConfig::new(320, 240, 15.0).with_device("/dev/video7");

    config.save(&path).unwrap();
    let loaded = CameraConfig::load(&path).unwrap();
    std::fs::remove_dir_all(&dir).ok();

    assert_eq!(loaded, config);
}

#[test]
fn test_config_load_errors_are_configuration_errors() {
    let missing = std::env::temp_dir().join("virtualcam-does-not-exist.json");
    let err = CameraConfig::load(&missing).unwrap_err();
    assert!(matches!(err, CameraError::Configuration(_)));

    let err = CameraConfig::from_json("{\"fps\": \"fast\"}").unwrap_err();
    assert!(matches!(err, CameraError::Configuration(_)));
}

#[test]
fn test_config_default_path() {
    // Not every CI environment has a config dir; only check the shape
    if let Some(path) = CameraConfig::default_path() {
        assert!(path.ends_with("virtualcam/config.json"));
    }
}
