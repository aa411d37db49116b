// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the arcball camera

use glam::Vec3;
use gst_vr::camera::{ArcballCamera, Camera};
use gst_vr::math;
use gst_vr::navigation::NavigationEvent;
use std::f32::consts::{FRAC_PI_2, PI};

fn release(camera: &mut ArcballCamera, button: i32) {
    camera.navigation_event(&NavigationEvent::MouseButtonPress {
        button,
        x: 0.0,
        y: 0.0,
    });
    camera.navigation_event(&NavigationEvent::MouseButtonRelease {
        button,
        x: 0.0,
        y: 0.0,
    });
}

#[test]
fn test_theta_update_across_pole_is_dropped() {
    // theta stays put while phi still moves
    for theta0 in [1.05 * PI, 1.5 * PI, 1.95 * PI] {
        for dy in [-4000.0, 4000.0] {
            let mut camera = ArcballCamera::new();
            camera.set_theta(theta0);
            let phi0 = camera.phi();
            let dx = 25.0;

            camera.rotate(dx, dy);

            let candidate = (camera.theta() + (dy * camera.rotation_speed() as f64) as f32) as f64
                / std::f64::consts::PI;
            if candidate > 1.0 && candidate < 2.0 {
                continue;
            }
            assert_eq!(camera.theta(), theta0, "theta0 = {}, dy = {}", theta0, dy);
            let expected_phi = phi0 + (dx * camera.rotation_speed() as f64) as f32;
            assert_eq!(camera.phi(), expected_phi);
        }
    }
}

#[test]
fn test_theta_update_inside_range_is_applied() {
    let mut camera = ArcballCamera::new();
    camera.set_theta(1.5 * PI);
    camera.rotate(0.0, 100.0);
    assert!((camera.theta() - (1.5 * PI + 100.0 * camera.rotation_speed())).abs() < 1e-6);
}

#[test]
fn test_default_theta_rejects_vertical_drag() {
    // π/2 is outside (π, 2π), so only phi moves until theta is reset
    let mut camera = ArcballCamera::new();
    camera.rotate(10.0, 10.0);
    assert_eq!(camera.theta(), FRAC_PI_2);
}

#[test]
fn test_update_view_is_idempotent() {
    let mut camera = ArcballCamera::new();
    camera.set_theta(1.3 * PI);
    camera.rotate(12.0, -7.0);

    camera.update_view();
    let first = math::to_float_array(&camera.view_projection());
    camera.update_view();
    let second = math::to_float_array(&camera.view_projection());

    let first_bits: Vec<u32> = first.iter().map(|f| f.to_bits()).collect();
    let second_bits: Vec<u32> = second.iter().map(|f| f.to_bits()).collect();
    assert_eq!(first_bits, second_bits);
}

#[test]
fn test_zoom_converges_to_bounds() {
    let mut camera = ArcballCamera::new();
    assert_eq!(camera.fov(), 60.0);
    let (min_fov, max_fov) = camera.fov_bounds();

    for button in [4, 6].into_iter().cycle().take(60) {
        release(&mut camera, button);
        assert!(camera.fov() >= min_fov);
    }
    assert_eq!(camera.fov(), 45.0);

    for button in [5, 7].into_iter().cycle().take(60) {
        release(&mut camera, button);
        assert!(camera.fov() <= max_fov);
    }
    assert_eq!(camera.fov(), 110.0);
}

#[test]
fn test_zoom_changes_view() {
    let mut camera = ArcballCamera::new();
    let before = camera.view_projection();
    release(&mut camera, 4);
    assert_ne!(camera.view_projection(), before);
}

#[test]
fn test_other_buttons_do_nothing() {
    let mut camera = ArcballCamera::new();
    let before = camera.view_projection();
    release(&mut camera, 2);
    release(&mut camera, 3);
    assert_eq!(camera.view_projection(), before);
    assert_eq!(camera.fov(), 60.0);
}

#[test]
fn test_translate_clamps_at_zero() {
    let mut camera = ArcballCamera::new();
    assert_eq!(camera.center_distance(), 0.8);

    camera.translate(-1000.0);
    assert_eq!(camera.center_distance(), 0.0);
    assert_eq!(camera.radius(), 1.0);
}

#[test]
fn test_translate_moves_eye_outward() {
    let mut camera = ArcballCamera::new();
    let before = camera.state().position.eye.length();
    camera.translate(10.0);
    assert!(camera.state().position.eye.length() > before);
}

#[test]
fn test_eye_position_formula() {
    let mut camera = ArcballCamera::new();
    camera.set_theta(FRAC_PI_2);
    camera.set_phi(FRAC_PI_2);
    camera.set_center_distance(0.0);

    let position = camera.state().position;
    assert!(position.eye.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-5));
    assert!(position.eye_right.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
}

#[test]
fn test_view_projection_derivation() {
    let mut camera = ArcballCamera::new();
    camera.set_theta(1.25 * PI);
    camera.set_phi(0.3);

    let state = camera.state();
    let projection = math::perspective(
        state.projection.fov,
        state.projection.aspect,
        state.projection.znear,
        state.projection.zfar,
    );
    let view = math::look_at(state.position.eye, state.position.center, state.position.up);
    let view_fix = math::negate_component(&math::inverse(&view), 3, 2);
    let expected = math::multiply(&view_fix, &projection);

    assert_eq!(camera.view_projection(), expected);
}

#[test]
fn test_view_projection_golden_values() {
    // Row-major values worked out by hand for theta = 1.25π, phi = 0.3,
    // center_distance 0.8, fov 60, aspect 4/3, znear 0.01, zfar 1000
    let expected: [f32; 16] = [
        -0.383892, 1.170043, 0.675538, 0.675525, //
        0.000000, 1.224745, -0.707121, -0.707107, //
        1.241019, 0.361937, 0.208969, 0.208964, //
        0.000000, 0.000000, 2.205585, 2.225541,
    ];

    let mut camera = ArcballCamera::new();
    camera.set_theta(1.25 * PI);
    camera.set_phi(0.3);

    let actual = math::to_float_array(&camera.view_projection());
    for (index, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert!(
            (a - e).abs() < 1e-4,
            "value {} is {}, expected {}",
            index,
            a,
            e
        );
    }
}

#[test]
fn test_aspect_change_updates_view() {
    let mut camera = ArcballCamera::new();
    let before = camera.view_projection();
    camera.set_aspect(16.0 / 9.0);
    assert_eq!(camera.state().projection.aspect, 16.0 / 9.0);
    assert_ne!(camera.view_projection(), before);
}
