// SPDX-License-Identifier: GPL-3.0-only

//! Video filter elements
//!
//! The element plumbing calls into a [`GlFilter`] in a fixed order:
//! caps are negotiated, GPU resources are set up once, then every buffer
//! is drawn from an input texture into an output texture. Navigation
//! events can arrive between draws. Stopping tears the GPU resources down.
//!
//! - [`HmdWarp`]: lens distortion for side-by-side frames
//! - [`VrCompositor`]: projects the frame onto a sphere or plane seen by a
//!   camera

mod hmd_warp;
mod vr_compositor;

pub use hmd_warp::HmdWarp;
pub use vr_compositor::VrCompositor;

use crate::errors::{VrError, VrResult};
use crate::gpu::RenderContext;
use crate::navigation::NavigationEvent;

/// Negotiated output size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSize {
    pub width: u32,
    pub height: u32,
}

impl VideoSize {
    pub fn new(width: u32, height: u32) -> VrResult<Self> {
        if width == 0 || height == 0 {
            return Err(VrError::Caps(format!(
                "invalid video size {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Read the size from negotiated raw video caps
    #[cfg(feature = "gst")]
    pub fn from_caps(caps: &gstreamer::CapsRef) -> VrResult<Self> {
        let info = gstreamer_video::VideoInfo::from_caps(caps)
            .map_err(|e| VrError::Caps(format!("failed to parse caps: {}", e)))?;
        Self::new(info.width(), info.height())
    }
}

/// What the element should do with a source-pad event after the filter saw it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// Pass the event on upstream
    Forward,
    /// Pass it on and end the stream
    EndOfStream,
}

/// Callbacks a GPU video filter implements
pub trait GlFilter<C: RenderContext> {
    /// Output caps were negotiated
    fn set_caps(&mut self, size: VideoSize) -> VrResult<()>;

    /// One-time GPU setup on the context's thread
    fn init_gl(&mut self, ctx: &C) -> VrResult<()>;

    /// Draw one frame. `input` is sampled, `output` is rendered into.
    fn filter_texture(&mut self, ctx: &C, input: &C::Texture, output: &C::Texture) -> bool;

    /// An event travelling upstream from the source pad
    fn src_event(&mut self, event: &NavigationEvent) -> EventDisposition;

    /// Release GPU resources. No draw is in flight while this runs.
    fn gl_stop(&mut self);

    /// Like [`GlFilter::src_event`], for events straight from the pipeline
    ///
    /// Anything that is not a navigation event is forwarded untouched.
    #[cfg(feature = "gst")]
    fn src_gst_event(&mut self, event: &gstreamer::EventRef) -> EventDisposition {
        match NavigationEvent::try_from(event) {
            Ok(navigation) => self.src_event(&navigation),
            Err(_) => EventDisposition::Forward,
        }
    }
}
