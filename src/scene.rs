// SPDX-License-Identifier: GPL-3.0-only

//! Scene composite
//!
//! A scene owns one camera and an ordered list of nodes, each a mesh drawn
//! with a shader. The node list comes from a builder injected at
//! construction and is fixed once [`Scene::init`] has run; draw order is
//! insertion order.

use crate::camera::Camera;
use crate::constants::{CLEAR_COLOR, INPUT_TEXTURE_UNIT, uniforms};
use crate::errors::VrResult;
use crate::gpu::{RenderContext, UniformValue};
use crate::math;
use crate::mesh::Mesh;
use crate::navigation::NavigationEvent;
use crate::shaders::Shader;
use glam::Mat4;
use tracing::{debug, info, trace};

/// What the builder gets to know about the output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneSetup {
    pub width: u32,
    pub height: u32,
    pub aspect: f32,
}

/// One drawable: mesh, shader and the uniforms only this node uses
pub struct Node<C: RenderContext> {
    mesh: Mesh<C>,
    shader: Shader<C>,
    uniforms: Vec<(String, UniformValue)>,
}

impl<C: RenderContext> Node<C> {
    pub fn new(mesh: Mesh<C>, shader: Shader<C>) -> Self {
        Self {
            mesh,
            shader,
            uniforms: Vec::new(),
        }
    }

    pub fn with_uniform(mut self, name: &str, value: UniformValue) -> Self {
        self.set_uniform(name, value);
        self
    }

    /// Replace or add a per-node uniform
    pub fn set_uniform(&mut self, name: &str, value: UniformValue) {
        match self.uniforms.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value,
            None => self.uniforms.push((name.to_string(), value)),
        }
    }

    pub fn shader(&self) -> &Shader<C> {
        &self.shader
    }

    pub fn shader_mut(&mut self) -> &mut Shader<C> {
        &mut self.shader
    }

    pub fn mesh(&self) -> &Mesh<C> {
        &self.mesh
    }
}

/// Where the `mvp` uniform comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionMode {
    /// The camera's view-projection
    #[default]
    Camera,
    /// A flat orthographic projection fitted to the aspect ratio
    Orthographic,
}

/// Builds the node list on first init
pub type SceneBuilder<C> = Box<dyn Fn(&C, &SceneSetup) -> VrResult<Vec<Node<C>>> + Send>;

/// Camera plus ordered nodes
pub struct Scene<C: RenderContext> {
    camera: Box<dyn Camera>,
    mode: ProjectionMode,
    builder: SceneBuilder<C>,
    nodes: Vec<Node<C>>,
    width: u32,
    height: u32,
    initialized: bool,
}

impl<C: RenderContext> Scene<C> {
    pub fn new(camera: Box<dyn Camera>, mode: ProjectionMode, builder: SceneBuilder<C>) -> Self {
        Self {
            camera,
            mode,
            builder,
            nodes: Vec::new(),
            width: 0,
            height: 0,
            initialized: false,
        }
    }

    /// One-time GPU setup
    ///
    /// Fails without side effects when the camera's device is missing or
    /// the builder fails. Calling it again after success does nothing.
    pub fn init(&mut self, ctx: &C) -> VrResult<()> {
        if self.initialized {
            return Ok(());
        }

        self.camera.ensure_ready()?;

        let setup = SceneSetup {
            width: self.width,
            height: self.height,
            aspect: self.aspect(),
        };
        let nodes = (self.builder)(ctx, &setup)?;

        for node in &nodes {
            node.shader.bind(ctx)?;
            node.shader
                .upload_int(ctx, INPUT_TEXTURE_UNIT, uniforms::TEXTURE);
        }

        info!(nodes = nodes.len(), mode = ?self.mode, "Scene initialized");
        self.nodes = nodes;
        self.initialized = true;
        Ok(())
    }

    /// Clear, then draw every node in order
    pub fn draw(&mut self, ctx: &C) -> VrResult<()> {
        self.camera.poll();
        ctx.clear(CLEAR_COLOR);

        let mvp = self.mvp();
        for node in &self.nodes {
            node.shader.bind(ctx)?;
            node.shader.upload_matrix(ctx, &mvp, uniforms::MVP);
            for (name, value) in &node.uniforms {
                node.shader.upload(ctx, name, *value);
            }
            node.mesh.draw(ctx);
        }

        trace!(nodes = self.nodes.len(), "Scene drawn");
        Ok(())
    }

    fn mvp(&self) -> Mat4 {
        match self.mode {
            ProjectionMode::Camera => self.camera.view_projection(),
            ProjectionMode::Orthographic => {
                let aspect = self.aspect();
                math::ortho(-aspect, aspect, -1.0, 1.0, -1.0, 1.0)
            }
        }
    }

    pub fn navigation_event(&mut self, event: &NavigationEvent) {
        self.camera.navigation_event(event);
    }

    /// Output size changed
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        if height > 0 {
            let aspect = width as f32 / height as f32;
            debug!(width, height, aspect, "Scene aspect");
            self.camera.set_aspect(aspect);
        }
    }

    pub fn aspect(&self) -> f32 {
        self.camera.state().projection.aspect
    }

    /// Update a per-node uniform on every node that has it
    pub fn set_node_uniform(&mut self, name: &str, value: UniformValue) {
        for node in &mut self.nodes {
            if node.uniforms.iter().any(|(n, _)| n == name) {
                node.set_uniform(name, value);
            }
        }
    }

    pub fn camera(&self) -> &dyn Camera {
        self.camera.as_ref()
    }

    pub fn camera_mut(&mut self) -> &mut dyn Camera {
        self.camera.as_mut()
    }

    pub fn nodes(&self) -> &[Node<C>] {
        &self.nodes
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Release every node's GPU resources
    pub fn delete(&mut self) {
        for node in &mut self.nodes {
            node.shader.delete();
        }
        self.nodes.clear();
        self.initialized = false;
    }
}
