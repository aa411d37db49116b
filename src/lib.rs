// SPDX-License-Identifier: GPL-3.0-only

//! VR video filters - lens warp and VR compositing for head-mounted displays
//!
//! This library provides two GPU video filters and the small 3D toolkit
//! they are built on.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`filters`]: `hmdwarp` and `vrcompositor` filter callbacks
//! - [`scene`]: camera plus ordered mesh/shader nodes, init and draw
//! - [`camera`]: arcball, HMD and free-fly cameras
//! - [`shaders`]: shader programs and the packaged WGSL stages
//! - [`mesh`]: plane, sphere and cube geometry
//! - [`gpu`]: the render context seam with wgpu and recording backends
//! - [`navigation`]: pointer and key input, cross-thread event queue
//! - [`math`]: matrix helpers
//! - [`config`]: JSON settings
//!
//! # Example
//!
//! ```ignore
//! let ctx = WgpuContext::new()?;
//! let mut compositor = VrCompositor::new(Settings::default());
//! compositor.set_caps(VideoSize::new(1920, 1080)?)?;
//! compositor.init_gl(&ctx)?;
//! compositor.filter_texture(&ctx, &input, &output);
//! ```

pub mod camera;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filters;
pub mod gpu;
pub mod math;
pub mod mesh;
pub mod navigation;
pub mod scene;
pub mod shaders;

// Re-export commonly used types
pub use camera::{ArcballCamera, Camera, HmdCamera, StaticTracker, WasdCamera};
pub use config::Settings;
pub use constants::SceneShape;
pub use errors::{ShaderError, VrError, VrResult};
pub use filters::{EventDisposition, GlFilter, HmdWarp, VideoSize, VrCompositor};
pub use gpu::{RecordingContext, RenderContext, UniformValue, WgpuContext};
pub use navigation::NavigationEvent;
pub use scene::{Node, ProjectionMode, Scene};
