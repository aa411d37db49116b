// SPDX-License-Identifier: GPL-3.0-only

//! Free-fly camera
//!
//! WASD moves in the horizontal plane, Space and Shift move vertically,
//! Q and E turn. Dragging with button 1 looks around. Held keys are
//! applied once per frame from [`Camera::poll`], so `update_view` stays a
//! pure function of the current state.

use super::{Camera, CameraState};
use crate::constants::wasd;
use crate::navigation::{ButtonRole, NavigationEvent};
use glam::Vec3;
use tracing::debug;

/// Movement requested by the held keys
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MovementState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
}

impl MovementState {
    /// Derive from a list of held key names
    pub fn from_keys(keys: &[String]) -> Self {
        let mut movement = Self::default();
        for key in keys {
            match key.to_ascii_lowercase().as_str() {
                "w" => movement.forward = true,
                "s" => movement.backward = true,
                "a" => movement.left = true,
                "d" => movement.right = true,
                "space" => movement.up = true,
                "shift_l" => movement.down = true,
                "q" => movement.rotate_left = true,
                "e" => movement.rotate_right = true,
                _ => {}
            }
        }
        movement
    }

    const fn to_direction(positive: bool, negative: bool) -> f32 {
        match (positive, negative) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        }
    }

    /// (forward, right, up) velocity in units of the move speed
    pub const fn velocity(&self) -> (f32, f32, f32) {
        (
            Self::to_direction(self.forward, self.backward),
            Self::to_direction(self.right, self.left),
            Self::to_direction(self.up, self.down),
        )
    }

    pub const fn rotation_velocity(&self) -> f32 {
        Self::to_direction(self.rotate_right, self.rotate_left)
    }

    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

/// Keyboard-driven camera using the plain look-at derivation
#[derive(Debug, Clone)]
pub struct WasdCamera {
    state: CameraState,
    yaw: f32,
    pitch: f32,
    move_speed: f32,
    rotation_speed: f32,
}

impl Default for WasdCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl WasdCamera {
    /// Camera at the default eye position, looking toward the origin
    pub fn new() -> Self {
        let mut camera = Self {
            state: CameraState::default(),
            yaw: std::f32::consts::PI,
            pitch: 0.0,
            move_speed: wasd::MOVE_SPEED,
            rotation_speed: wasd::ROTATION_SPEED,
        };
        camera.update_view();
        camera
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.cos() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.state.position.world_up).normalize()
    }

    /// Turn by a pointer delta, pitch clamped to avoid flipping over
    pub fn look(&mut self, dx: f64, dy: f64) {
        self.yaw -= (dx * self.rotation_speed as f64) as f32;
        self.pitch = (self.pitch - (dy * self.rotation_speed as f64) as f32)
            .clamp(-wasd::PITCH_LIMIT, wasd::PITCH_LIMIT);
        self.update_view();
    }
}

impl Camera for WasdCamera {
    fn state(&self) -> &CameraState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CameraState {
        &mut self.state
    }

    fn update_view(&mut self) {
        let forward = self.forward();
        let right = self.right();
        let position = &mut self.state.position;
        position.center = position.eye + forward;
        position.right = right;
        position.up = right.cross(forward).normalize();
        self.state.update_view_mvp();
    }

    fn navigation_event(&mut self, event: &NavigationEvent) {
        match event {
            NavigationEvent::KeyPress { key } => self.state.press_key(key),
            NavigationEvent::KeyRelease { key } => self.state.release_key(key),
            NavigationEvent::MouseButtonPress { button, .. } => {
                self.state.input.pressed_button = Some(*button);
            }
            NavigationEvent::MouseButtonRelease { button, x, y } => {
                self.state.input.pressed_button = None;
                if ButtonRole::from_id(*button) == ButtonRole::Primary {
                    self.state.input.cursor_last_x = *x;
                    self.state.input.cursor_last_y = *y;
                }
            }
            NavigationEvent::MouseMove { x, y } => {
                let dx = x - self.state.input.cursor_last_x;
                let dy = y - self.state.input.cursor_last_y;
                if self.state.input.pressed_button == Some(1) {
                    self.look(dx, dy);
                }
                self.state.input.cursor_last_x = *x;
                self.state.input.cursor_last_y = *y;
            }
        }
    }

    fn poll(&mut self) {
        let movement = MovementState::from_keys(&self.state.input.pressed_keys);
        if movement.is_idle() {
            return;
        }

        let (fwd, right_dir, up_dir) = movement.velocity();
        let displacement = self.forward() * fwd * self.move_speed
            + self.right() * right_dir * self.move_speed
            + self.state.position.world_up * up_dir * self.move_speed;

        self.state.position.eye += displacement;
        self.yaw -= movement.rotation_velocity() * self.rotation_speed;
        debug!(eye = ?self.state.position.eye, yaw = self.yaw, "Free-fly move");
        self.update_view();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(camera: &mut WasdCamera, key: &str) {
        camera.navigation_event(&NavigationEvent::KeyPress { key: key.into() });
    }

    #[test]
    fn test_default_looks_down_negative_z() {
        let camera = WasdCamera::new();
        assert!(camera.forward().abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(camera.right().abs_diff_eq(Vec3::X, 1e-6));
    }

    #[test]
    fn test_held_forward_key_moves_once_per_poll() {
        let mut camera = WasdCamera::new();
        let start = camera.state().position.eye;

        press(&mut camera, "w");
        // idempotent until polled
        camera.update_view();
        assert_eq!(camera.state().position.eye, start);

        camera.poll();
        let moved = camera.state().position.eye;
        assert!((moved.z - (start.z - wasd::MOVE_SPEED)).abs() < 1e-6);

        camera.navigation_event(&NavigationEvent::KeyRelease { key: "w".into() });
        camera.poll();
        assert_eq!(camera.state().position.eye, moved);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let mut camera = WasdCamera::new();
        let start = camera.state().position.eye;
        press(&mut camera, "a");
        press(&mut camera, "d");
        camera.poll();
        assert_eq!(camera.state().position.eye, start);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = WasdCamera::new();
        camera.look(0.0, -1.0e6);
        assert_eq!(camera.pitch(), wasd::PITCH_LIMIT);
        camera.look(0.0, 1.0e6);
        assert_eq!(camera.pitch(), -wasd::PITCH_LIMIT);
    }
}
