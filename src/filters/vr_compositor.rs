// SPDX-License-Identifier: GPL-3.0-only

//! VR compositor
//!
//! Projects the input frame onto a sphere (or a plane) and renders it from
//! a camera. Without a head tracker the camera is an arcball driven by
//! navigation events; with one it follows the tracked head. Pressing
//! Escape ends the stream.
//!
//! Navigation events produced on other threads go through
//! [`VrCompositor::navigation_sender`] and are applied, in arrival order,
//! right before the next frame is drawn.

use super::{EventDisposition, GlFilter, VideoSize};
use crate::camera::{ArcballCamera, Camera, HeadTracker, HmdCamera};
use crate::config::Settings;
use crate::constants::SceneShape;
use crate::errors::{VrError, VrResult};
use crate::gpu::RenderContext;
use crate::mesh::{Mesh, MeshData};
use crate::navigation::{NavigationEvent, NavigationQueue, NavigationSender};
use crate::scene::{Node, ProjectionMode, Scene, SceneSetup};
use crate::shaders::{MVP_UV, Shader, TEXTURE_UV};
use std::sync::Arc;
use tracing::{Span, debug, info, info_span, warn};

pub struct VrCompositor<C: RenderContext> {
    span: Span,
    settings: Settings,
    tracker: Option<Arc<dyn HeadTracker>>,
    queue: NavigationQueue,
    scene: Option<Scene<C>>,
    end_of_stream: bool,
    /// Set once the head tracker was found missing. Never cleared.
    device_error: Option<VrError>,
}

impl<C: RenderContext + 'static> Default for VrCompositor<C> {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl<C: RenderContext + 'static> VrCompositor<C> {
    /// Compositor with an arcball camera
    pub fn new(settings: Settings) -> Self {
        Self {
            span: info_span!("vrcompositor"),
            settings,
            tracker: None,
            queue: NavigationQueue::new(),
            scene: None,
            end_of_stream: false,
            device_error: None,
        }
    }

    /// Compositor whose camera follows `tracker`
    ///
    /// Every scene the compositor builds, including after a stop, gets an
    /// HMD camera reading this tracker.
    pub fn with_tracker(settings: Settings, tracker: Arc<dyn HeadTracker>) -> Self {
        let mut compositor = Self::new(settings);
        compositor.tracker = Some(tracker);
        compositor
    }

    /// Handle for queueing navigation events from another thread
    pub fn navigation_sender(&self) -> NavigationSender {
        self.queue.sender()
    }

    pub fn scene(&self) -> Option<&Scene<C>> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut Scene<C>> {
        self.scene.as_mut()
    }

    /// Whether a queued Escape press asked for end of stream
    pub fn end_of_stream_requested(&self) -> bool {
        self.end_of_stream
    }

    fn create_camera(&mut self) -> VrResult<Box<dyn Camera>> {
        if let Some(err) = &self.device_error {
            return Err(err.clone());
        }
        match &self.tracker {
            Some(tracker) => {
                let camera = HmdCamera::new(Arc::clone(tracker));
                if let Err(err) = camera.ensure_ready() {
                    self.device_error = Some(err.clone());
                    return Err(err);
                }
                info!("Using HMD camera");
                Ok(Box::new(camera))
            }
            None => {
                info!("Using arcball camera");
                Ok(Box::new(ArcballCamera::from_settings(
                    &self.settings.arcball,
                    &self.settings.projection,
                )))
            }
        }
    }

    fn build_scene(&mut self) -> VrResult<Scene<C>> {
        let camera = self.create_camera()?;
        let compositor = self.settings.compositor.clone();

        Ok(Scene::new(
            camera,
            ProjectionMode::Camera,
            Box::new(
                move |ctx: &C, setup: &SceneSetup| -> VrResult<Vec<Node<C>>> {
                    let shader = Shader::from_assets(ctx, MVP_UV, TEXTURE_UV)?;
                    let data = match compositor.shape {
                        SceneShape::Sphere => MeshData::sphere(
                            compositor.sphere_radius,
                            compositor.sphere_stacks,
                            compositor.sphere_slices,
                        ),
                        SceneShape::Plane => MeshData::plane(setup.aspect),
                    };
                    debug!(shape = compositor.shape.display_name(), "Building compositor scene");
                    Ok(vec![Node::new(Mesh::upload(ctx, &data), shader)])
                },
            ),
        ))
    }

    fn apply_event(&mut self, event: &NavigationEvent) -> EventDisposition {
        if let Some(scene) = self.scene.as_mut() {
            scene.navigation_event(event);
        }
        if event.is_escape_press() {
            info!("Escape pressed, ending stream");
            EventDisposition::EndOfStream
        } else {
            EventDisposition::Forward
        }
    }
}

impl<C: RenderContext + 'static> GlFilter<C> for VrCompositor<C> {
    fn set_caps(&mut self, size: VideoSize) -> VrResult<()> {
        let span = self.span.clone();
        let _enter = span.enter();
        info!(width = size.width, height = size.height, "Caps negotiated");

        if self.scene.is_none() {
            let scene = self.build_scene().inspect_err(|e| {
                warn!(error = %e, "Compositor scene creation failed");
            })?;
            self.scene = Some(scene);
        }
        if let Some(scene) = self.scene.as_mut() {
            scene.set_aspect(size.width, size.height);
        }
        Ok(())
    }

    fn init_gl(&mut self, ctx: &C) -> VrResult<()> {
        let _enter = self.span.enter();
        let scene = self
            .scene
            .as_mut()
            .ok_or_else(|| VrError::Caps("GPU init before caps negotiation".into()))?;
        scene.init(ctx)
    }

    fn filter_texture(&mut self, ctx: &C, input: &C::Texture, output: &C::Texture) -> bool {
        let span = self.span.clone();
        let _enter = span.enter();

        for event in self.queue.drain() {
            if self.apply_event(&event) == EventDisposition::EndOfStream {
                self.end_of_stream = true;
            }
        }

        let Some(scene) = self.scene.as_mut() else {
            warn!("Frame before GPU init dropped");
            return false;
        };

        ctx.bind_texture(input);
        ctx.draw_to_texture(output, &mut || match scene.draw(ctx) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Compositor draw failed");
                false
            }
        })
    }

    fn src_event(&mut self, event: &NavigationEvent) -> EventDisposition {
        let span = self.span.clone();
        let _enter = span.enter();
        self.apply_event(event)
    }

    fn gl_stop(&mut self) {
        let _enter = self.span.enter();
        if let Some(mut scene) = self.scene.take() {
            scene.delete();
            info!("Compositor scene released");
        }
    }
}
