// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use gst_vr::config::Settings;
use gst_vr::constants::{SceneShape, arcball};
use gst_vr::errors::VrError;

#[test]
fn test_settings_default() {
    // Test that default settings match the camera defaults
    let settings = Settings::default();

    assert_eq!(settings.arcball.center_distance, arcball::CENTER_DISTANCE);
    assert_eq!(settings.arcball.zoom_step, 0.95);
    assert_eq!(settings.projection.fov, 60.0);
    assert_eq!(settings.compositor.shape, SceneShape::Sphere);
}

#[test]
fn test_settings_json_round_trip() {
    let settings = Settings::default();
    let json = settings.to_json().unwrap();
    assert_eq!(Settings::from_json(&json).unwrap(), settings);
}

#[test]
fn test_partial_settings_keep_defaults() {
    // Only the fields present in the file change
    let settings =
        Settings::from_json(r#"{"arcball": {"theta": 4.5}, "compositor": {"shape": "Plane"}}"#)
            .unwrap();

    assert_eq!(settings.arcball.theta, 4.5);
    assert_eq!(settings.arcball.phi, arcball::PHI);
    assert_eq!(settings.compositor.shape, SceneShape::Plane);
    assert_eq!(settings.compositor.sphere_stacks, 100);
}

#[test]
fn test_invalid_settings_are_config_errors() {
    let err = Settings::from_json("{ not json").unwrap_err();
    assert!(matches!(err, VrError::Config(_)));
}

#[test]
fn test_out_of_range_values_are_rejected() {
    let cases = [
        r#"{"arcball": {"zoom_step": 1.5}}"#,
        r#"{"arcball": {"zoom_step": 0.0}}"#,
        r#"{"arcball": {"min_fov": 120.0, "max_fov": 50.0}}"#,
        r#"{"arcball": {"max_fov": 200.0}}"#,
        r#"{"projection": {"znear": 10.0, "zfar": 1.0}}"#,
        r#"{"compositor": {"sphere_stacks": 4294967295}}"#,
        r#"{"compositor": {"sphere_slices": 0}}"#,
        r#"{"compositor": {"sphere_radius": -1.0}}"#,
    ];
    for text in cases {
        let err = Settings::from_json(text).unwrap_err();
        assert!(matches!(err, VrError::Config(_)), "{} gave {:?}", text, err);
    }
}

#[test]
fn test_validate_accepts_defaults() {
    assert!(Settings::default().validate().is_ok());

    // Equal bounds pin the zoom
    let mut settings = Settings::default();
    settings.arcball.min_fov = 70.0;
    settings.arcball.max_fov = 70.0;
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_save_and_load() {
    let path = std::env::temp_dir().join(format!("gst-vr-settings-{}.json", std::process::id()));

    let mut settings = Settings::default();
    settings.projection.fov = 75.0;
    settings.save(&path).unwrap();

    let loaded = Settings::load(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded, settings);
}

#[test]
fn test_missing_file_is_io_error() {
    let path = std::env::temp_dir().join("gst-vr-does-not-exist.json");
    assert!(matches!(Settings::load(&path), Err(VrError::Io(_))));
}
