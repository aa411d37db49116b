// SPDX-License-Identifier: GPL-3.0-only

//! HMD lens warp
//!
//! Draws the input frame on a single plane through the `warp` fragment
//! stage. The plane is as wide as the frame's aspect ratio and is viewed
//! through a flat orthographic projection, so the camera never moves.

use super::{EventDisposition, GlFilter, VideoSize};
use crate::camera::ArcballCamera;
use crate::constants::uniforms;
use crate::errors::{VrError, VrResult};
use crate::gpu::{RenderContext, UniformValue};
use crate::mesh::{Mesh, MeshData};
use crate::navigation::NavigationEvent;
use crate::scene::{Node, ProjectionMode, Scene, SceneSetup};
use crate::shaders::{MVP_UV, Shader, WARP};
use tracing::{Span, debug, info, info_span, warn};

pub struct HmdWarp<C: RenderContext> {
    span: Span,
    size: Option<VideoSize>,
    scene: Option<Scene<C>>,
}

impl<C: RenderContext + 'static> Default for HmdWarp<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: RenderContext + 'static> HmdWarp<C> {
    pub fn new() -> Self {
        Self {
            span: info_span!("hmdwarp"),
            size: None,
            scene: None,
        }
    }

    /// Size from the last caps negotiation
    pub fn size(&self) -> Option<VideoSize> {
        self.size
    }

    pub fn scene(&self) -> Option<&Scene<C>> {
        self.scene.as_ref()
    }

    fn screen_size(size: VideoSize) -> UniformValue {
        UniformValue::Vec2([size.width as f32, size.height as f32])
    }
}

impl<C: RenderContext + 'static> GlFilter<C> for HmdWarp<C> {
    fn set_caps(&mut self, size: VideoSize) -> VrResult<()> {
        let _enter = self.span.enter();
        info!(width = size.width, height = size.height, "Caps negotiated");

        self.size = Some(size);
        if let Some(scene) = self.scene.as_mut() {
            scene.set_aspect(size.width, size.height);
            scene.set_node_uniform(uniforms::SCREEN_SIZE, Self::screen_size(size));
        }
        Ok(())
    }

    fn init_gl(&mut self, ctx: &C) -> VrResult<()> {
        let _enter = self.span.enter();
        if self.scene.is_some() {
            debug!("Warp scene already initialized");
            return Ok(());
        }
        let size = self
            .size
            .ok_or_else(|| VrError::Caps("GPU init before caps negotiation".into()))?;

        let screen_size = Self::screen_size(size);
        let mut scene: Scene<C> = Scene::new(
            Box::new(ArcballCamera::new()),
            ProjectionMode::Orthographic,
            Box::new(move |ctx: &C, setup: &SceneSetup| -> VrResult<Vec<Node<C>>> {
                let shader = Shader::from_assets(ctx, MVP_UV, WARP)?;
                let mesh = Mesh::upload(ctx, &MeshData::plane(setup.aspect));
                Ok(vec![
                    Node::new(mesh, shader).with_uniform(uniforms::SCREEN_SIZE, screen_size),
                ])
            }),
        );
        scene.set_aspect(size.width, size.height);
        scene.init(ctx).inspect_err(|e| {
            warn!(error = %e, "Warp scene init failed");
        })?;

        self.scene = Some(scene);
        Ok(())
    }

    fn filter_texture(&mut self, ctx: &C, input: &C::Texture, output: &C::Texture) -> bool {
        let _enter = self.span.enter();
        let Some(scene) = self.scene.as_mut() else {
            warn!("Frame before GPU init dropped");
            return false;
        };

        ctx.bind_texture(input);
        ctx.draw_to_texture(output, &mut || match scene.draw(ctx) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Warp draw failed");
                false
            }
        })
    }

    fn src_event(&mut self, event: &NavigationEvent) -> EventDisposition {
        let _enter = self.span.enter();
        debug!(?event, "Navigation event ignored");
        EventDisposition::Forward
    }

    fn gl_stop(&mut self) {
        let _enter = self.span.enter();
        if let Some(mut scene) = self.scene.take() {
            scene.delete();
            info!("Warp scene released");
        }
    }
}
