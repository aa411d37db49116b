// SPDX-License-Identifier: GPL-3.0-only

//! Camera models
//!
//! Every camera keeps a [`CameraState`] and recomputes its
//! `view_projection` synchronously whenever its state changes. The scene
//! reads the matrix right before each draw, so no change is ever deferred
//! past the next frame.
//!
//! Three variants are provided:
//! - [`arcball::ArcballCamera`]: orbit around the center, drag to rotate,
//!   wheel to zoom
//! - [`hmd::HmdCamera`]: orientation from a head tracker, one matrix per eye
//! - [`wasd::WasdCamera`]: free-fly, keys to move and drag to look

pub mod arcball;
pub mod hmd;
pub mod wasd;

pub use arcball::ArcballCamera;
pub use hmd::{HeadTracker, HmdCamera, StaticTracker};
pub use wasd::WasdCamera;

use crate::constants::projection;
use crate::errors::VrResult;
use crate::math;
use crate::navigation::NavigationEvent;
use glam::{Mat4, Vec3};
use tracing::debug;

/// Projection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub znear: f32,
    pub zfar: f32,
    pub is_orthographic: bool,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov: projection::FOV,
            aspect: projection::ASPECT,
            znear: projection::ZNEAR,
            zfar: projection::ZFAR,
            is_orthographic: false,
        }
    }
}

impl Projection {
    /// Perspective or orthographic matrix for the current parameters
    pub fn matrix(&self) -> Mat4 {
        if self.is_orthographic {
            math::ortho(
                -self.aspect,
                self.aspect,
                1.0,
                -1.0,
                self.znear,
                self.zfar,
            )
        } else {
            math::perspective(self.fov, self.aspect, self.znear, self.zfar)
        }
    }
}

/// Camera placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPosition {
    pub eye: Vec3,
    /// Mirrored eye for stereo rendering
    pub eye_right: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    pub world_up: Vec3,
    pub right: Vec3,
}

impl Default for CameraPosition {
    fn default() -> Self {
        Self {
            eye: Vec3::Z,
            eye_right: Vec3::NEG_Z,
            center: Vec3::ZERO,
            up: Vec3::Y,
            world_up: Vec3::Y,
            right: Vec3::X,
        }
    }
}

/// Pointer and keyboard state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputState {
    /// Button currently held, if any
    pub pressed_button: Option<i32>,
    /// Held keys, in press order
    pub pressed_keys: Vec<String>,
    pub cursor_last_x: f64,
    pub cursor_last_y: f64,
}

/// State shared by every camera variant
#[derive(Debug, Clone, PartialEq)]
pub struct CameraState {
    pub projection: Projection,
    pub position: CameraPosition,
    pub input: InputState,
    view_projection: Mat4,
}

impl Default for CameraState {
    fn default() -> Self {
        let mut state = Self {
            projection: Projection::default(),
            position: CameraPosition::default(),
            input: InputState::default(),
            view_projection: Mat4::IDENTITY,
        };
        state.update_view_mvp();
        state
    }
}

impl CameraState {
    /// Current view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.view_projection
    }

    /// Store a freshly derived view-projection matrix
    ///
    /// Only camera implementations call this, from their `update_view`.
    pub fn set_view_projection(&mut self, view_projection: Mat4) {
        self.view_projection = view_projection;
    }

    /// Plain `look_at` followed by the projection
    pub fn update_view_mvp(&mut self) {
        let view = Mat4::look_at_rh(
            self.position.eye,
            self.position.center,
            self.position.up,
        );
        self.view_projection = math::multiply(&view, &self.projection.matrix());
    }

    /// Record a key as held. Repeated presses keep the original position.
    pub fn press_key(&mut self, key: &str) {
        if !self.input.pressed_keys.iter().any(|k| k == key) {
            self.input.pressed_keys.push(key.to_string());
        }
        self.log_pressed_keys();
    }

    /// Forget a held key
    pub fn release_key(&mut self, key: &str) {
        self.input.pressed_keys.retain(|k| k != key);
        self.log_pressed_keys();
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.input.pressed_keys.iter().any(|k| k == key)
    }

    pub fn log_pressed_keys(&self) {
        debug!(keys = ?self.input.pressed_keys, "Pressed keys");
    }
}

/// A camera driven by navigation events
///
/// `Send` lets a filter move between streaming threads; there is no
/// internal locking, so callers hold exclusive access.
pub trait Camera: Send {
    fn state(&self) -> &CameraState;

    fn state_mut(&mut self) -> &mut CameraState;

    /// Recompute `view_projection` from the current state. Idempotent.
    fn update_view(&mut self);

    /// Apply one input event
    fn navigation_event(&mut self, event: &NavigationEvent);

    /// Check that any backing device is present
    fn ensure_ready(&self) -> VrResult<()> {
        Ok(())
    }

    /// Refresh externally driven state before a draw
    fn poll(&mut self) {}

    /// New aspect ratio after a caps change
    fn set_aspect(&mut self, aspect: f32) {
        self.state_mut().projection.aspect = aspect;
        self.update_view();
    }

    fn view_projection(&self) -> Mat4 {
        self.state().view_projection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_matches_projection_defaults() {
        let state = CameraState::default();
        assert_eq!(state.projection.fov, 60.0);
        assert_eq!(state.position.eye, Vec3::Z);
        assert!(state.view_projection().is_finite());
        assert_ne!(state.view_projection(), Mat4::IDENTITY);
    }

    #[test]
    fn test_key_list_keeps_press_order_without_duplicates() {
        let mut state = CameraState::default();
        state.press_key("w");
        state.press_key("a");
        state.press_key("w");
        assert_eq!(state.input.pressed_keys, vec!["w", "a"]);

        state.release_key("w");
        assert_eq!(state.input.pressed_keys, vec!["a"]);
        assert!(!state.is_key_pressed("w"));
        assert!(state.is_key_pressed("a"));
    }

    #[test]
    fn test_orthographic_flag_switches_matrix() {
        let mut state = CameraState::default();
        let perspective = state.view_projection();
        state.projection.is_orthographic = true;
        state.update_view_mvp();
        assert_ne!(perspective, state.view_projection());
        // no perspective divide: bottom row stays (0, 0, 0, 1)
        let vp = state.view_projection();
        assert_eq!(vp.row(3), glam::Vec4::W);
    }
}
