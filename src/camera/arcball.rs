// SPDX-License-Identifier: GPL-3.0-only

//! Arcball camera
//!
//! The eye orbits `center` on a sphere described by a polar angle `theta`,
//! an azimuth `phi` and a radius. The radius is `exp(center_distance)`, so
//! a linear scroll accumulator gives an even zoom feel.
//!
//! Dragging with button 1 rotates. Wheel buttons change the field of view
//! between `min_fov` and `max_fov`. Theta is kept strictly inside
//! `(π, 2π)`; an update that would leave that range is dropped while the
//! phi part of the same drag still applies.

use super::{Camera, CameraState};
use crate::config::{ArcballSettings, ProjectionSettings};
use crate::constants::arcball;
use crate::math;
use crate::navigation::{ButtonRole, NavigationEvent};
use glam::Vec3;
use std::f64::consts::PI;
use tracing::{debug, trace};

/// Orbit camera driven by pointer drag and wheel buttons
#[derive(Debug, Clone)]
pub struct ArcballCamera {
    state: CameraState,
    center_distance: f32,
    scroll_speed: f32,
    rotation_speed: f32,
    theta: f32,
    phi: f32,
    zoom_step: f32,
    min_fov: f32,
    max_fov: f32,
}

impl Default for ArcballCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl ArcballCamera {
    pub fn new() -> Self {
        let mut camera = Self {
            state: CameraState::default(),
            center_distance: arcball::CENTER_DISTANCE,
            scroll_speed: arcball::SCROLL_SPEED,
            rotation_speed: arcball::ROTATION_SPEED,
            theta: arcball::THETA,
            phi: arcball::PHI,
            zoom_step: arcball::ZOOM_STEP,
            min_fov: arcball::MIN_FOV,
            max_fov: arcball::MAX_FOV,
        };
        camera.update_view();
        camera
    }

    /// Build from loaded settings
    pub fn from_settings(arcball: &ArcballSettings, projection: &ProjectionSettings) -> Self {
        let mut camera = Self::new();
        camera.center_distance = arcball.center_distance.max(0.0);
        camera.scroll_speed = arcball.scroll_speed;
        camera.rotation_speed = arcball.rotation_speed;
        camera.theta = arcball.theta;
        camera.phi = arcball.phi;
        camera.zoom_step = arcball.zoom_step;
        camera.min_fov = arcball.min_fov;
        camera.max_fov = arcball.max_fov;
        camera.state.projection.fov = projection.fov;
        camera.state.projection.znear = projection.znear;
        camera.state.projection.zfar = projection.zfar;
        camera.update_view();
        camera
    }

    /// Move along the view axis
    ///
    /// The distance accumulator never goes below zero, which keeps the
    /// radius at or above one.
    pub fn translate(&mut self, z: f32) {
        let new_val = self.center_distance + z * self.scroll_speed;
        self.center_distance = new_val.max(0.0);

        debug!(center_distance = self.center_distance, "Arcball translate");
        self.update_view();
    }

    /// Rotate by a pointer delta
    pub fn rotate(&mut self, dx: f64, dy: f64) {
        let delta_theta = (dy * self.rotation_speed as f64) as f32;
        let delta_phi = (dx * self.rotation_speed as f64) as f32;

        self.phi += delta_phi;

        // π < θ < 2π, both ends excluded, to stay off the poles
        let next_theta_pi = (self.theta + delta_theta) as f64 / PI;
        if next_theta_pi > 1.0 && next_theta_pi < 2.0 {
            self.theta += delta_theta;
        } else {
            trace!(next_theta_pi, "Dropping theta update at pole");
        }

        debug!(
            theta_pi = self.theta as f64 / PI,
            phi_pi = self.phi as f64 / PI,
            "Arcball rotate"
        );
        self.update_view();
    }

    /// Orbit radius, `exp(center_distance)`
    pub fn radius(&self) -> f32 {
        (self.center_distance as f64).exp() as f32
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    pub fn phi(&self) -> f32 {
        self.phi
    }

    pub fn center_distance(&self) -> f32 {
        self.center_distance
    }

    pub fn scroll_speed(&self) -> f32 {
        self.scroll_speed
    }

    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    pub fn zoom_step(&self) -> f32 {
        self.zoom_step
    }

    pub fn fov(&self) -> f32 {
        self.state.projection.fov
    }

    pub fn fov_bounds(&self) -> (f32, f32) {
        (self.min_fov, self.max_fov)
    }

    pub fn set_theta(&mut self, theta: f32) {
        self.theta = theta;
        self.update_view();
    }

    pub fn set_phi(&mut self, phi: f32) {
        self.phi = phi;
        self.update_view();
    }

    pub fn set_center_distance(&mut self, center_distance: f32) {
        self.center_distance = center_distance.max(0.0);
        self.update_view();
    }

    pub fn set_scroll_speed(&mut self, scroll_speed: f32) {
        self.scroll_speed = scroll_speed;
        self.update_view();
    }

    pub fn set_rotation_speed(&mut self, rotation_speed: f32) {
        self.rotation_speed = rotation_speed;
        self.update_view();
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.state.projection.fov = fov;
        self.update_view();
    }

    fn zoom_in(&mut self) {
        let projection = &mut self.state.projection;
        if projection.fov > self.min_fov {
            projection.fov = (projection.fov * self.zoom_step).max(self.min_fov);
            debug!(fov = projection.fov, "Arcball zoom in");
            self.update_view();
        }
    }

    fn zoom_out(&mut self) {
        let projection = &mut self.state.projection;
        if projection.fov < self.max_fov {
            projection.fov = (projection.fov / self.zoom_step).min(self.max_fov);
            debug!(fov = projection.fov, "Arcball zoom out");
            self.update_view();
        }
    }
}

impl Camera for ArcballCamera {
    fn state(&self) -> &CameraState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CameraState {
        &mut self.state
    }

    fn update_view(&mut self) {
        let radius = (self.center_distance as f64).exp() as f32;
        let theta = self.theta as f64;
        let phi = self.phi as f64;
        let r = radius as f64;

        let position = &mut self.state.position;
        position.eye = Vec3::new(
            (r * theta.sin() * phi.cos()) as f32,
            (r * -theta.cos()) as f32,
            (r * theta.sin() * phi.sin()) as f32,
        );
        position.eye_right = Vec3::new(
            (r * theta.sin() * phi.cos() * -1.0) as f32,
            (r * -theta.cos() * -1.0) as f32,
            (r * theta.sin() * phi.sin() * -1.0) as f32,
        );

        let projection = &self.state.projection;
        let projection_matrix =
            math::perspective(projection.fov, projection.aspect, projection.znear, projection.zfar);

        let view = math::look_at(position.eye, position.center, position.up);

        // the look-at rows need inverting, and one sign flipped, to match
        // the handedness the shaders expect
        let view_inverted = math::inverse(&view);
        let view_fix = math::negate_component(&view_inverted, 3, 2);

        trace!(radius, fov = projection.fov, "Arcball update view");
        let view_projection = math::multiply(&view_fix, &projection_matrix);
        self.state.set_view_projection(view_projection);
    }

    fn navigation_event(&mut self, event: &NavigationEvent) {
        match event {
            NavigationEvent::MouseMove { x, y } => {
                let dx = x - self.state.input.cursor_last_x;
                let dy = y - self.state.input.cursor_last_y;

                if self.state.input.pressed_button == Some(1) {
                    debug!(dx, dy, "Rotating");
                    self.rotate(dx, dy);
                }
                self.state.input.cursor_last_x = *x;
                self.state.input.cursor_last_y = *y;
            }
            NavigationEvent::MouseButtonRelease { button, x, y } => {
                self.state.input.pressed_button = None;

                match ButtonRole::from_id(*button) {
                    ButtonRole::Primary => {
                        self.state.input.cursor_last_x = *x;
                        self.state.input.cursor_last_y = *y;
                    }
                    ButtonRole::ScrollUp => self.zoom_in(),
                    ButtonRole::ScrollDown => self.zoom_out(),
                    ButtonRole::Other => {}
                }
            }
            NavigationEvent::MouseButtonPress { button, .. } => {
                self.state.input.pressed_button = Some(*button);
            }
            NavigationEvent::KeyPress { .. } | NavigationEvent::KeyRelease { .. } => {}
        }
    }
}
