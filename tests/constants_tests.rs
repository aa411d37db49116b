// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use gst_vr::constants::{SceneShape, arcball, hmd, projection, uniforms};

#[test]
fn test_scene_shape_values() {
    // Sphere and plane
    assert_eq!(SceneShape::ALL.len(), 2);
    assert_eq!(SceneShape::default(), SceneShape::Sphere);
}

#[test]
fn test_scene_shape_display_names() {
    // Test that all shapes have non-empty display names that parse back
    for shape in SceneShape::ALL {
        let name = shape.display_name();
        assert!(!name.is_empty());
        assert_eq!(SceneShape::from_name(name), Some(shape));
    }
}

#[test]
fn test_zoom_step_shrinks() {
    assert!(arcball::ZOOM_STEP > 0.0 && arcball::ZOOM_STEP < 1.0);
    assert!(arcball::MIN_FOV < arcball::MAX_FOV);
}

#[test]
fn test_projection_planes() {
    assert!(projection::ZNEAR > 0.0);
    assert!(projection::ZFAR > projection::ZNEAR);
    assert!(hmd::EYE_FOV > 0.0 && hmd::EYE_FOV < 180.0);
}

#[test]
fn test_uniform_names_match_shader_contract() {
    assert_eq!(uniforms::MVP, "mvp");
    assert_eq!(uniforms::SCREEN_SIZE, "screen_size");
    assert_eq!(uniforms::TEXTURE, "texture");
}
