// SPDX-License-Identifier: GPL-3.0-only

//! Shader programs
//!
//! A [`Shader`] owns at most one linked program. Compiling replaces that
//! program only once the new one has linked, so a bad reload leaves the
//! last good program in place and rendering keeps going.
//!
//! The stage sources the filters use are packaged with the crate and
//! looked up by name with [`asset`].

mod reflect;

pub use reflect::{BindingSlot, ProgramLayout, StageModule, UniformSlot, compile_stage};

use crate::errors::{ShaderError, StageKind};
use crate::gpu::{RenderContext, UniformValue};
use crate::math;
use glam::{Mat4, Vec2};
use tracing::{debug, warn};

/// Vertex stage: `mvp` transform with texture coordinates
pub const MVP_UV: &str = "mvp_uv";
/// Fragment stage: plain texture lookup
pub const TEXTURE_UV: &str = "texture_uv";
/// Fragment stage: side-by-side lens distortion
pub const WARP: &str = "warp";

const MVP_UV_WGSL: &str = include_str!("assets/mvp_uv.wgsl");
const TEXTURE_UV_WGSL: &str = include_str!("assets/texture_uv.wgsl");
const WARP_WGSL: &str = include_str!("assets/warp.wgsl");

/// Source of a packaged shader stage
pub fn asset(name: &str) -> Option<&'static str> {
    match name {
        MVP_UV => Some(MVP_UV_WGSL),
        TEXTURE_UV => Some(TEXTURE_UV_WGSL),
        WARP => Some(WARP_WGSL),
        _ => None,
    }
}

/// A GPU program built from one vertex and one fragment stage
pub struct Shader<C: RenderContext> {
    program: Option<C::Program>,
}

impl<C: RenderContext> Default for Shader<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: RenderContext> Shader<C> {
    /// Shader with no program yet
    pub fn new() -> Self {
        Self { program: None }
    }

    /// Create and compile in one step
    pub fn from_sources(
        ctx: &C,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<Self, ShaderError> {
        let mut shader = Self::new();
        shader.compile(ctx, vertex_source, fragment_source)?;
        Ok(shader)
    }

    /// Create from two packaged stages, see [`asset`]
    pub fn from_assets(ctx: &C, vertex: &str, fragment: &str) -> Result<Self, ShaderError> {
        let vertex_source = asset(vertex).ok_or_else(|| ShaderError::Parse {
            stage: StageKind::Vertex,
            message: format!("no packaged shader named `{}`", vertex),
        })?;
        let fragment_source = asset(fragment).ok_or_else(|| ShaderError::Parse {
            stage: StageKind::Fragment,
            message: format!("no packaged shader named `{}`", fragment),
        })?;
        Self::from_sources(ctx, vertex_source, fragment_source)
    }

    /// Compile both stages and link them
    ///
    /// On any failure the current program, if there is one, is kept and the
    /// diagnostic is returned.
    pub fn compile(
        &mut self,
        ctx: &C,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<(), ShaderError> {
        let vertex = compile_stage(vertex_source, StageKind::Vertex).inspect_err(|e| {
            warn!(error = %e, "Vertex stage failed, keeping current program");
        })?;
        let fragment = compile_stage(fragment_source, StageKind::Fragment).inspect_err(|e| {
            warn!(error = %e, "Fragment stage failed, keeping current program");
        })?;
        let program = ctx.link_program(&vertex, &fragment).inspect_err(|e| {
            warn!(error = %e, "Link failed, keeping current program");
        })?;

        let replaced = self.program.replace(program).is_some();
        debug!(replaced, "Shader program linked");
        Ok(())
    }

    pub fn is_compiled(&self) -> bool {
        self.program.is_some()
    }

    /// Make this the active program
    pub fn bind(&self, ctx: &C) -> Result<(), ShaderError> {
        let program = self.program.as_ref().ok_or(ShaderError::NotCompiled)?;
        ctx.use_program(program);
        Ok(())
    }

    /// Write any uniform value by name
    ///
    /// Unknown names log a warning and change nothing.
    pub fn upload(&self, ctx: &C, name: &str, value: UniformValue) {
        let Some(program) = self.program.as_ref() else {
            warn!(name, "Uniform upload without a compiled program");
            return;
        };
        if !ctx.set_uniform(program, name, value) {
            warn!(name, "Program has no such uniform");
        }
    }

    pub fn upload_matrix(&self, ctx: &C, matrix: &Mat4, name: &str) {
        self.upload(ctx, name, UniformValue::Mat4(math::to_float_array(matrix)));
    }

    pub fn upload_vec2(&self, ctx: &C, vector: Vec2, name: &str) {
        self.upload(ctx, name, UniformValue::Vec2(vector.to_array()));
    }

    pub fn upload_int(&self, ctx: &C, value: i32, name: &str) {
        self.upload(ctx, name, UniformValue::Int(value));
    }

    /// Release the program
    pub fn delete(&mut self) {
        if self.program.take().is_some() {
            debug!("Shader program deleted");
        }
    }
}
