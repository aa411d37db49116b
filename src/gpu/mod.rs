// SPDX-License-Identifier: GPL-3.0-only

//! GPU rendering seam
//!
//! Everything above this module talks to the GPU through [`RenderContext`].
//! Two implementations exist:
//! - [`WgpuContext`]: headless wgpu device that renders into textures
//! - [`RecordingContext`]: logs every call, used for dry runs and tests
//!
//! A context is owned by whoever drives the pipeline and is borrowed per
//! call. All calls happen on the thread that owns the context.

pub mod recording;
pub mod wgpu_context;

pub use recording::{GpuCommand, RecordingContext};
pub use wgpu_context::WgpuContext;

pub use wgpu;

use crate::errors::ShaderError;
use crate::mesh::MeshData;
use crate::shaders::StageModule;
use std::sync::Arc;
use tracing::{debug, info};

/// Value written to a named uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// Column-major 4x4 matrix
    Mat4([f32; 16]),
    Vec2([f32; 2]),
    /// Sampler unit for texture uniforms, plain integer otherwise
    Int(i32),
}

impl UniformValue {
    /// Bytes the value occupies in a uniform buffer
    pub fn byte_size(&self) -> usize {
        match self {
            UniformValue::Mat4(_) => 64,
            UniformValue::Vec2(_) => 8,
            UniformValue::Int(_) => 4,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformValue::Mat4(m) => bytemuck::cast_slice(m),
            UniformValue::Vec2(v) => bytemuck::cast_slice(v),
            UniformValue::Int(i) => bytemuck::bytes_of(i),
        }
    }
}

/// Operations the filters and the scene need from a GPU
///
/// Stage sources are compiled and reflected before they get here, so
/// `link_program` only has to match the two stages and build a program.
/// Calls that cannot fail in a driver (binding, uniform upload, draws)
/// report misuse through logging and a `false` return where useful.
pub trait RenderContext {
    type Program;
    type Mesh;
    type Texture;

    /// Link a vertex and fragment stage into a program
    fn link_program(
        &self,
        vertex: &StageModule,
        fragment: &StageModule,
    ) -> Result<Self::Program, ShaderError>;

    /// Make `program` the one subsequent uniform uploads and draws use
    fn use_program(&self, program: &Self::Program);

    /// Write a uniform by name. Returns false when the program has no
    /// uniform of that name.
    fn set_uniform(&self, program: &Self::Program, name: &str, value: UniformValue) -> bool;

    /// Upload vertex and index data
    fn create_mesh(&self, data: &MeshData) -> Self::Mesh;

    /// Clear color and depth of the current target
    fn clear(&self, color: [f32; 4]);

    /// Bind the texture sampled by the next draws
    fn bind_texture(&self, texture: &Self::Texture);

    /// Draw `mesh` with the program in use
    fn draw_mesh(&self, mesh: &Self::Mesh);

    /// Run `draw` with `target` as the framebuffer
    ///
    /// Returns false when `draw` does, or when the frame could not be
    /// submitted.
    fn draw_to_texture(&self, target: &Self::Texture, draw: &mut dyn FnMut() -> bool) -> bool;
}

/// Information about the created GPU device
#[derive(Debug)]
pub struct GpuDeviceInfo {
    /// Name of the GPU adapter
    pub adapter_name: String,
    /// Backend being used (Vulkan, Metal, DX12, etc.)
    pub backend: wgpu::Backend,
}

/// Create a headless wgpu device and queue for rendering into textures
///
/// # Arguments
///
/// * `label` - A label for the device (for debugging)
///
/// # Returns
///
/// A tuple of (Device, Queue, GpuDeviceInfo) or an error message
pub async fn create_render_device(
    label: &str,
) -> Result<(Arc<wgpu::Device>, Arc<wgpu::Queue>, GpuDeviceInfo), String> {
    info!(label = label, "Creating GPU device for rendering");

    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::VULKAN,
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|e| format!("Failed to find suitable GPU adapter: {}", e))?;

    let adapter_info = adapter.get_info();
    let adapter_limits = adapter.limits();

    info!(
        adapter = %adapter_info.name,
        backend = ?adapter_info.backend,
        "GPU adapter selected for rendering"
    );

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some(label),
            required_features: wgpu::Features::empty(),
            required_limits: adapter_limits,
            memory_hints: wgpu::MemoryHints::Performance,
            ..Default::default()
        })
        .await
        .map_err(|e| format!("Failed to create GPU device: {}", e))?;

    debug!(label = label, "GPU device created");

    let info = GpuDeviceInfo {
        adapter_name: adapter_info.name.clone(),
        backend: adapter_info.backend,
    };

    Ok((Arc::new(device), Arc::new(queue), info))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_render_device() {
        // This test requires a GPU, so it may be skipped in CI
        match pollster::block_on(create_render_device("test_device")) {
            Ok((device, queue, info)) => {
                println!("Created device: {:?}", info);
                assert!(!info.adapter_name.is_empty());
                drop(queue);
                drop(device);
            }
            Err(e) => {
                // Skip if no GPU available
                println!("Skipping test (no GPU): {}", e);
            }
        }
    }

    #[test]
    fn test_uniform_value_bytes() {
        let mvp = UniformValue::Mat4(glam::Mat4::IDENTITY.to_cols_array());
        assert_eq!(mvp.as_bytes().len(), mvp.byte_size());
        assert_eq!(UniformValue::Vec2([1.0, 2.0]).as_bytes().len(), 8);
        assert_eq!(UniformValue::Int(0).as_bytes(), &[0, 0, 0, 0]);
    }
}
