// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the VR filters and the 3D support library
//!
//! Camera math never fails, so nothing here describes it. A theta update
//! that would cross a pole is dropped silently instead of being reported.

use std::fmt;

/// Result type alias using VrError
pub type VrResult<T> = Result<T, VrError>;

/// Shader stage a diagnostic belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => write!(f, "vertex"),
            StageKind::Fragment => write!(f, "fragment"),
        }
    }
}

/// Shader compile, link and usage errors
///
/// A failed compile or link never touches the program that was already
/// installed in a [`crate::shaders::Shader`].
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderError {
    /// Source text did not parse
    Parse { stage: StageKind, message: String },
    /// Source parsed but failed validation
    Validation { stage: StageKind, message: String },
    /// Module has no entry point for the requested stage
    MissingEntryPoint(StageKind),
    /// Stages compiled but could not be linked into a program
    Link(String),
    /// A program was used before any compile succeeded
    NotCompiled,
}

/// Main error type
#[derive(Debug, Clone, PartialEq)]
pub enum VrError {
    /// Shader resource failure
    Shader(ShaderError),
    /// Head tracking device never attached
    DeviceUnavailable(String),
    /// GPU device or command submission failure
    Gpu(String),
    /// Negotiated caps could not be used
    Caps(String),
    /// Navigation event could not be interpreted
    Event(String),
    /// Settings could not be loaded or saved
    Config(String),
    /// Filesystem errors
    Io(String),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Parse { stage, message } => {
                write!(f, "Failed to parse {} stage: {}", stage, message)
            }
            ShaderError::Validation { stage, message } => {
                write!(f, "Failed to validate {} stage: {}", stage, message)
            }
            ShaderError::MissingEntryPoint(stage) => {
                write!(f, "No {} entry point in shader source", stage)
            }
            ShaderError::Link(msg) => write!(f, "Failed to link program: {}", msg),
            ShaderError::NotCompiled => write!(f, "Shader has no compiled program"),
        }
    }
}

impl fmt::Display for VrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VrError::Shader(e) => write!(f, "Shader error: {}", e),
            VrError::DeviceUnavailable(msg) => write!(f, "HMD device unavailable: {}", msg),
            VrError::Gpu(msg) => write!(f, "GPU error: {}", msg),
            VrError::Caps(msg) => write!(f, "Caps error: {}", msg),
            VrError::Event(msg) => write!(f, "Navigation event error: {}", msg),
            VrError::Config(msg) => write!(f, "Configuration error: {}", msg),
            VrError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ShaderError {}
impl std::error::Error for VrError {}

impl From<ShaderError> for VrError {
    fn from(err: ShaderError) -> Self {
        VrError::Shader(err)
    }
}

impl From<std::io::Error> for VrError {
    fn from(err: std::io::Error) -> Self {
        VrError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for VrError {
    fn from(err: serde_json::Error) -> Self {
        VrError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_error_mentions_stage() {
        let err = ShaderError::Parse {
            stage: StageKind::Fragment,
            message: "expected `;`".into(),
        };
        let text = err.to_string();
        assert!(text.contains("fragment"));
        assert!(text.contains("expected `;`"));
    }

    #[test]
    fn test_shader_error_converts_into_vr_error() {
        let err: VrError = ShaderError::NotCompiled.into();
        assert_eq!(err, VrError::Shader(ShaderError::NotCompiled));
        assert!(err.to_string().starts_with("Shader error"));
    }
}
