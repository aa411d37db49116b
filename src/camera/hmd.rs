// SPDX-License-Identifier: GPL-3.0-only

//! Head-tracked stereo camera
//!
//! The head sits at `center` and looks along -Z, rotated by the orientation
//! the tracker reports. The two eyes are offset by half the interpupillary
//! distance along the rotated right axis. The left eye doubles as the mono
//! `view_projection` the scene renders with.

use super::{Camera, CameraState};
use crate::constants::hmd;
use crate::errors::{VrError, VrResult};
use crate::navigation::NavigationEvent;
use glam::{Mat4, Quat, Vec3};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Source of head orientation
///
/// Implementations wrap the actual device I/O. `orientation` is called
/// once per frame on the rendering thread and must not block. A tracker
/// is shared, so every camera rebuilt for the same device reads it.
pub trait HeadTracker: Send + Sync {
    /// Whether a device is attached and delivering poses
    fn is_attached(&self) -> bool;

    /// Latest head orientation
    fn orientation(&self) -> Quat;
}

/// Tracker with a fixed orientation
///
/// Used for offline rendering and for exercising the HMD path without
/// hardware.
#[derive(Debug, Clone, Copy)]
pub struct StaticTracker {
    attached: bool,
    orientation: Quat,
}

impl StaticTracker {
    pub fn new(orientation: Quat) -> Self {
        Self {
            attached: true,
            orientation,
        }
    }

    /// Tracker whose device never showed up
    pub fn detached() -> Self {
        Self {
            attached: false,
            orientation: Quat::IDENTITY,
        }
    }

    /// Looking `degrees` to the left of straight ahead
    pub fn from_yaw_degrees(degrees: f32) -> Self {
        Self::new(Quat::from_rotation_y(degrees.to_radians()))
    }
}

impl HeadTracker for StaticTracker {
    fn is_attached(&self) -> bool {
        self.attached
    }

    fn orientation(&self) -> Quat {
        self.orientation
    }
}

/// Stereo camera following a [`HeadTracker`]
pub struct HmdCamera {
    state: CameraState,
    tracker: Arc<dyn HeadTracker>,
    orientation: Quat,
    ipd: f32,
    left: Mat4,
    right: Mat4,
}

impl HmdCamera {
    pub fn new(tracker: Arc<dyn HeadTracker>) -> Self {
        let mut state = CameraState::default();
        state.projection.fov = hmd::EYE_FOV;
        state.position.center = Vec3::ZERO;

        let mut camera = Self {
            state,
            tracker,
            orientation: Quat::IDENTITY,
            ipd: hmd::IPD,
            left: Mat4::IDENTITY,
            right: Mat4::IDENTITY,
        };
        camera.update_view();
        camera
    }

    pub fn ipd(&self) -> f32 {
        self.ipd
    }

    pub fn set_ipd(&mut self, ipd: f32) {
        self.ipd = ipd;
        self.update_view();
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    /// View-projection for the left eye
    pub fn left_view_projection(&self) -> Mat4 {
        self.left
    }

    /// View-projection for the right eye
    pub fn right_view_projection(&self) -> Mat4 {
        self.right
    }

    fn eye_view(&self, eye: Vec3) -> Mat4 {
        Mat4::from_quat(self.orientation.conjugate()) * Mat4::from_translation(-eye)
    }
}

impl Camera for HmdCamera {
    fn state(&self) -> &CameraState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CameraState {
        &mut self.state
    }

    fn update_view(&mut self) {
        let head = self.state.position.center;
        let right = self.orientation * Vec3::X;
        let up = self.orientation * Vec3::Y;
        let half_ipd = self.ipd * 0.5;

        let position = &mut self.state.position;
        position.right = right;
        position.up = up;
        position.eye = head - right * half_ipd;
        position.eye_right = head + right * half_ipd;
        let (eye_left, eye_right) = (position.eye, position.eye_right);

        let projection = self.state.projection.matrix();
        self.left = projection * self.eye_view(eye_left);
        self.right = projection * self.eye_view(eye_right);

        trace!(orientation = ?self.orientation, "HMD update view");
        self.state.set_view_projection(self.left);
    }

    fn navigation_event(&mut self, event: &NavigationEvent) {
        // the head drives the view; keys are only tracked
        match event {
            NavigationEvent::KeyPress { key } => self.state.press_key(key),
            NavigationEvent::KeyRelease { key } => self.state.release_key(key),
            _ => {}
        }
    }

    fn ensure_ready(&self) -> VrResult<()> {
        if self.tracker.is_attached() {
            Ok(())
        } else {
            warn!("HMD tracker is not attached");
            Err(VrError::DeviceUnavailable(
                "head tracker reported no device".into(),
            ))
        }
    }

    fn poll(&mut self) {
        if !self.tracker.is_attached() {
            return;
        }
        let orientation = self.tracker.orientation();
        if orientation != self.orientation {
            debug!(?orientation, "HMD orientation changed");
            self.orientation = orientation;
            self.update_view();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn test_detached_tracker_is_unavailable() {
        let camera = HmdCamera::new(Arc::new(StaticTracker::detached()));
        assert!(matches!(
            camera.ensure_ready(),
            Err(VrError::DeviceUnavailable(_))
        ));
    }

    #[test]
    fn test_eyes_are_one_ipd_apart() {
        let camera = HmdCamera::new(Arc::new(StaticTracker::new(Quat::IDENTITY)));
        let position = camera.state().position;
        assert!((position.eye.distance(position.eye_right) - hmd::IPD).abs() < 1e-6);
        assert!(position.eye.x < position.eye_right.x);
        assert_eq!(camera.view_projection(), camera.left_view_projection());
        assert_ne!(camera.left_view_projection(), camera.right_view_projection());
    }

    #[test]
    fn test_poll_applies_tracker_orientation() {
        let mut camera = HmdCamera::new(Arc::new(StaticTracker::from_yaw_degrees(90.0)));
        assert!(camera.ensure_ready().is_ok());
        camera.set_ipd(0.0);
        camera.poll();

        // turned 90° left, a point on -X is straight ahead
        let ahead = camera.view_projection() * Vec4::new(-5.0, 0.0, 0.0, 1.0);
        assert!((ahead.x / ahead.w).abs() < 1e-5);
        assert!((ahead.y / ahead.w).abs() < 1e-5);
        assert!(ahead.w > 0.0);
    }
}
