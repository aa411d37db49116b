// SPDX-License-Identifier: GPL-3.0-only

//! Crate-wide constants

use serde::{Deserialize, Serialize};

/// Arcball defaults
pub mod arcball {
    /// Exponentiated to get the orbit radius, so 0.8 is a radius of ~2.23
    pub const CENTER_DISTANCE: f32 = 0.8;
    pub const SCROLL_SPEED: f32 = 0.03;
    pub const ROTATION_SPEED: f32 = 0.002;
    /// Polar angle (radians)
    pub const THETA: f32 = std::f32::consts::FRAC_PI_2;
    /// Azimuth (radians)
    pub const PHI: f32 = std::f32::consts::FRAC_PI_2;
    pub const ZOOM_STEP: f32 = 0.95;
    pub const MIN_FOV: f32 = 45.0;
    pub const MAX_FOV: f32 = 110.0;
}

/// Projection defaults shared by every camera
pub mod projection {
    /// Vertical field of view in degrees
    pub const FOV: f32 = 60.0;
    pub const ASPECT: f32 = 4.0 / 3.0;
    pub const ZNEAR: f32 = 0.01;
    pub const ZFAR: f32 = 1000.0;
}

/// HMD defaults
pub mod hmd {
    /// Interpupillary distance in meters
    pub const IPD: f32 = 0.064;
    /// Per-eye vertical field of view in degrees
    pub const EYE_FOV: f32 = 90.0;
}

/// Free-fly camera defaults
pub mod wasd {
    pub const MOVE_SPEED: f32 = 0.1;
    pub const ROTATION_SPEED: f32 = 0.005;
    /// Pitch limit to avoid flipping over (radians)
    pub const PITCH_LIMIT: f32 = 1.4;
}

/// Uniform names shared with the shader assets
pub mod uniforms {
    pub const MVP: &str = "mvp";
    pub const SCREEN_SIZE: &str = "screen_size";
    pub const TEXTURE: &str = "texture";
}

/// Upper bound on sphere stacks and slices, keeps index math inside u32
pub const MAX_SPHERE_SEGMENTS: u32 = 4096;

/// Color the output texture is cleared to before every frame
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.0];

/// Texture unit the input frame is bound to
pub const INPUT_TEXTURE_UNIT: i32 = 0;

/// Key name that ends the stream when pressed in the compositor
pub const ESCAPE_KEY: &str = "Escape";

/// Geometry the compositor projects the input frame onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SceneShape {
    /// Equirectangular sphere seen from the inside (default)
    #[default]
    Sphere,
    /// Flat plane in front of the camera
    Plane,
}

impl SceneShape {
    /// All variants, in menu order
    pub const ALL: [SceneShape; 2] = [SceneShape::Sphere, SceneShape::Plane];

    /// Get display name for the shape
    pub fn display_name(&self) -> &'static str {
        match self {
            SceneShape::Sphere => "Sphere",
            SceneShape::Plane => "Plane",
        }
    }

    /// Parse a shape name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|shape| shape.display_name().eq_ignore_ascii_case(name))
    }
}
