// SPDX-License-Identifier: GPL-3.0-only

use crate::constants::{MAX_SPHERE_SEGMENTS, SceneShape, arcball, projection};
use crate::errors::{VrError, VrResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Arcball camera defaults
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArcballSettings {
    /// Orbit distance accumulator, radius is `exp(center_distance)`
    pub center_distance: f32,
    pub scroll_speed: f32,
    pub rotation_speed: f32,
    /// Polar angle in radians
    pub theta: f32,
    /// Azimuth in radians
    pub phi: f32,
    /// Field of view factor per wheel step
    pub zoom_step: f32,
    pub min_fov: f32,
    pub max_fov: f32,
}

impl Default for ArcballSettings {
    fn default() -> Self {
        Self {
            center_distance: arcball::CENTER_DISTANCE,
            scroll_speed: arcball::SCROLL_SPEED,
            rotation_speed: arcball::ROTATION_SPEED,
            theta: arcball::THETA,
            phi: arcball::PHI,
            zoom_step: arcball::ZOOM_STEP,
            min_fov: arcball::MIN_FOV,
            max_fov: arcball::MAX_FOV,
        }
    }
}

/// Projection defaults
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionSettings {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for ProjectionSettings {
    fn default() -> Self {
        Self {
            fov: projection::FOV,
            znear: projection::ZNEAR,
            zfar: projection::ZFAR,
        }
    }
}

/// What the compositor projects onto
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorSettings {
    pub shape: SceneShape,
    pub sphere_radius: f32,
    pub sphere_stacks: u32,
    pub sphere_slices: u32,
}

impl Default for CompositorSettings {
    fn default() -> Self {
        Self {
            shape: SceneShape::default(),
            sphere_radius: 1.0,
            sphere_stacks: 100,
            sphere_slices: 100,
        }
    }
}

/// All tunable defaults, loadable from a JSON file
///
/// Missing fields take their default, so a file may set only what it
/// changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub arcball: ArcballSettings,
    pub projection: ProjectionSettings,
    pub compositor: CompositorSettings,
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> VrResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&text)?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Parse and validate settings
    pub fn from_json(text: &str) -> VrResult<Self> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values the cameras and mesh builders cannot work with
    pub fn validate(&self) -> VrResult<()> {
        let arcball = &self.arcball;
        if !(arcball.zoom_step > 0.0 && arcball.zoom_step < 1.0) {
            return Err(invalid(format!(
                "arcball.zoom_step must be in (0, 1), got {}",
                arcball.zoom_step
            )));
        }
        if !valid_fov(arcball.min_fov) || !valid_fov(arcball.max_fov) {
            return Err(invalid(format!(
                "arcball fov bounds must be in (0, 180), got {}..{}",
                arcball.min_fov, arcball.max_fov
            )));
        }
        if arcball.min_fov > arcball.max_fov {
            return Err(invalid(format!(
                "arcball.min_fov {} is above max_fov {}",
                arcball.min_fov, arcball.max_fov
            )));
        }

        let projection = &self.projection;
        if !valid_fov(projection.fov) {
            return Err(invalid(format!(
                "projection.fov must be in (0, 180), got {}",
                projection.fov
            )));
        }
        if !(projection.znear > 0.0 && projection.zfar > projection.znear) {
            return Err(invalid(format!(
                "projection needs 0 < znear < zfar, got {} and {}",
                projection.znear, projection.zfar
            )));
        }

        let compositor = &self.compositor;
        if !(compositor.sphere_radius > 0.0 && compositor.sphere_radius.is_finite()) {
            return Err(invalid(format!(
                "compositor.sphere_radius must be positive, got {}",
                compositor.sphere_radius
            )));
        }
        for (name, count) in [
            ("sphere_stacks", compositor.sphere_stacks),
            ("sphere_slices", compositor.sphere_slices),
        ] {
            if count == 0 || count > MAX_SPHERE_SEGMENTS {
                return Err(invalid(format!(
                    "compositor.{} must be in 1..={}, got {}",
                    name, MAX_SPHERE_SEGMENTS, count
                )));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> VrResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write settings as pretty JSON
    pub fn save(&self, path: &Path) -> VrResult<()> {
        std::fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }
}

fn valid_fov(fov: f32) -> bool {
    fov > 0.0 && fov < 180.0
}

fn invalid(msg: String) -> VrError {
    VrError::Config(msg)
}
