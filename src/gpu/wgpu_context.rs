// SPDX-License-Identifier: GPL-3.0-only

//! Headless wgpu render context
//!
//! Calls made inside [`RenderContext::draw_to_texture`] are collected into
//! a frame and encoded as a single render pass when the draw callback
//! returns. Uniform values live on the CPU side of each program and are
//! snapshotted into fresh buffers per draw, so two draws of the same
//! program with different uniforms both see their own values.
//!
//! The input texture is bound at the program's texture slot, with a
//! linear clamp-to-edge sampler. Until a texture is bound, a 1x1 black
//! placeholder is sampled.

use super::{RenderContext, UniformValue, create_render_device};
use crate::constants::uniforms;
use crate::errors::ShaderError;
use crate::mesh::{MeshData, Vertex};
use crate::shaders::{ProgramLayout, StageModule};
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

/// Color format of every texture the context creates
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

/// Cached resource dimensions - avoids reallocation when dimensions match
#[derive(Default, Clone, Copy, PartialEq, Debug)]
pub struct CachedDimensions {
    pub width: u32,
    pub height: u32,
}

impl CachedDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Check if dimensions have changed and need update
    pub fn needs_update(&self, width: u32, height: u32) -> bool {
        self.width != width || self.height != height
    }
}

/// Helper for async buffer readback (map, poll, read, unmap)
///
/// # Arguments
/// * `device` - The wgpu device for polling
/// * `buffer` - The buffer to read from (must be MAP_READ)
pub async fn read_buffer_async(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
) -> Result<Vec<u8>, String> {
    let slice = buffer.slice(..);
    let (sender, receiver) = futures::channel::oneshot::channel();

    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });

    let _ = device.poll(wgpu::PollType::wait_indefinitely());

    receiver
        .await
        .map_err(|_| "Failed to receive buffer mapping".to_string())?
        .map_err(|e| format!("Failed to map buffer: {:?}", e))?;

    let data = slice.get_mapped_range().to_vec();
    buffer.unmap();

    Ok(data)
}

/// RGBA texture usable as draw target and as sampled input
#[derive(Debug, Clone)]
pub struct WgpuTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl WgpuTexture {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Vertex and index buffers of one mesh
#[derive(Debug)]
pub struct WgpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

struct ProgramInner {
    layout: ProgramLayout,
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_data: Mutex<BTreeMap<String, Vec<u8>>>,
}

/// Linked render pipeline plus its uniform values
#[derive(Clone)]
pub struct WgpuProgram {
    inner: Arc<ProgramInner>,
}

impl WgpuProgram {
    pub fn layout(&self) -> &ProgramLayout {
        &self.inner.layout
    }
}

struct DrawCommand {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

#[derive(Default)]
struct Frame {
    clear: Option<[f32; 4]>,
    draws: Vec<DrawCommand>,
}

/// Render context on a headless wgpu device
pub struct WgpuContext {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    sampler: wgpu::Sampler,
    placeholder: WgpuTexture,
    current_program: RefCell<Option<WgpuProgram>>,
    bound_texture: RefCell<Option<wgpu::TextureView>>,
    frame: RefCell<Option<Frame>>,
    depth: RefCell<Option<(CachedDimensions, wgpu::TextureView)>>,
}

impl WgpuContext {
    /// Create a context on a new device, blocking until it is ready
    pub fn new() -> Result<Self, String> {
        let (device, queue, info) = pollster::block_on(create_render_device("vr-render"))?;
        info!(adapter = %info.adapter_name, "Render context ready");
        Ok(Self::from_device(device, queue))
    }

    /// Create a context on an existing device
    pub fn from_device(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("input_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let placeholder = create_texture(&device, 1, 1, "placeholder_texture");
        write_rgba(&queue, &placeholder, &[0, 0, 0, 255]);

        Self {
            device,
            queue,
            sampler,
            placeholder,
            current_program: RefCell::new(None),
            bound_texture: RefCell::new(None),
            frame: RefCell::new(None),
            depth: RefCell::new(None),
        }
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    /// Texture filled with tightly packed RGBA8 pixels
    pub fn create_texture_rgba(
        &self,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<WgpuTexture, String> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(format!(
                "Expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                pixels.len()
            ));
        }
        let texture = create_texture(&self.device, width, height, "input_texture");
        write_rgba(&self.queue, &texture, pixels);
        Ok(texture)
    }

    /// Empty texture to draw into
    pub fn create_target(&self, width: u32, height: u32) -> WgpuTexture {
        create_texture(&self.device, width, height, "output_texture")
    }

    /// Read a texture back as tightly packed RGBA8 pixels
    pub fn read_texture(&self, texture: &WgpuTexture) -> Result<Vec<u8>, String> {
        let unpadded_row = texture.width * 4;
        let padded_row = unpadded_row.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("readback_buffer"),
            size: (padded_row * texture.height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(texture.height),
                },
            },
            extent(texture.width, texture.height),
        );
        self.queue.submit(Some(encoder.finish()));

        let padded = pollster::block_on(read_buffer_async(&self.device, &staging))?;

        let mut pixels = Vec::with_capacity((unpadded_row * texture.height) as usize);
        for row in padded.chunks_exact(padded_row as usize) {
            pixels.extend_from_slice(&row[..unpadded_row as usize]);
        }
        Ok(pixels)
    }

    fn depth_view(&self, width: u32, height: u32) -> wgpu::TextureView {
        let mut depth = self.depth.borrow_mut();
        if let Some((dims, view)) = depth.as_ref() {
            if !dims.needs_update(width, height) {
                return view.clone();
            }
        }

        debug!(width, height, "Allocating depth buffer");
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        *depth = Some((CachedDimensions::new(width, height), view.clone()));
        view
    }

    fn bind_group_for(&self, program: &WgpuProgram) -> wgpu::BindGroup {
        let layout = &program.inner.layout;
        let texture_view = self
            .bound_texture
            .borrow()
            .clone()
            .unwrap_or_else(|| self.placeholder.view.clone());

        let uniform_data = program
            .inner
            .uniform_data
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let buffers: Vec<(u32, wgpu::Buffer)> = layout
            .uniforms
            .iter()
            .map(|(name, uniform)| {
                // uniform buffers are sized in 16 byte steps
                let mut bytes = vec![0u8; (uniform.size.div_ceil(16) * 16) as usize];
                if let Some(data) = uniform_data.get(name) {
                    bytes[..data.len()].copy_from_slice(data);
                }
                let buffer = self
                    .device
                    .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(name.as_str()),
                        contents: &bytes,
                        usage: wgpu::BufferUsages::UNIFORM,
                    });
                (uniform.slot.binding, buffer)
            })
            .collect();

        let mut entries: Vec<wgpu::BindGroupEntry> = buffers
            .iter()
            .map(|(binding, buffer)| wgpu::BindGroupEntry {
                binding: *binding,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        entries.extend(layout.textures.values().map(|slot| wgpu::BindGroupEntry {
            binding: slot.binding,
            resource: wgpu::BindingResource::TextureView(&texture_view),
        }));
        entries.extend(layout.samplers.values().map(|slot| wgpu::BindGroupEntry {
            binding: slot.binding,
            resource: wgpu::BindingResource::Sampler(&self.sampler),
        }));

        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("program_bind_group"),
            layout: &program.inner.bind_group_layout,
            entries: &entries,
        })
    }
}

impl RenderContext for WgpuContext {
    type Program = WgpuProgram;
    type Mesh = WgpuMesh;
    type Texture = WgpuTexture;

    fn link_program(
        &self,
        vertex: &StageModule,
        fragment: &StageModule,
    ) -> Result<Self::Program, ShaderError> {
        let layout = ProgramLayout::link(vertex, fragment)?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let vertex_module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("vertex_stage"),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(vertex.source.as_str())),
            });
        let fragment_module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("fragment_stage"),
                source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(fragment.source.as_str())),
            });

        let mut layout_entries = Vec::new();
        for uniform in layout.uniforms.values() {
            layout_entries.push(wgpu::BindGroupLayoutEntry {
                binding: uniform.slot.binding,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            });
        }
        for slot in layout.textures.values() {
            layout_entries.push(wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            });
        }
        for slot in layout.samplers.values() {
            layout_entries.push(wgpu::BindGroupLayoutEntry {
                binding: slot.binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            });
        }

        let bind_group_layout =
            self.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("program_bind_group_layout"),
                    entries: &layout_entries,
                });

        let pipeline_layout = self
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("program_pipeline_layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        let pipeline = self
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("program_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: Some(vertex.entry_point.as_str()),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRIBUTES,
                    }],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: Some(fragment.entry_point.as_str()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: COLOR_FORMAT,
                        blend: Some(wgpu::BlendState::REPLACE),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    // the sphere is seen from the inside
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            return Err(ShaderError::Link(error.to_string()));
        }

        debug!(
            vertex = %vertex.entry_point,
            fragment = %fragment.entry_point,
            "Render pipeline created"
        );

        Ok(WgpuProgram {
            inner: Arc::new(ProgramInner {
                layout,
                pipeline,
                bind_group_layout,
                uniform_data: Mutex::new(BTreeMap::new()),
            }),
        })
    }

    fn use_program(&self, program: &Self::Program) {
        *self.current_program.borrow_mut() = Some(program.clone());
    }

    fn set_uniform(&self, program: &Self::Program, name: &str, value: UniformValue) -> bool {
        if !program.inner.layout.accepts(name, &value) {
            return false;
        }
        if name == uniforms::TEXTURE && !program.inner.layout.uniforms.contains_key(name) {
            // single texture slot, the unit index has nothing to select
            return true;
        }
        program
            .inner
            .uniform_data
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), value.as_bytes().to_vec());
        true
    }

    fn create_mesh(&self, data: &MeshData) -> Self::Mesh {
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertices"),
                contents: bytemuck::cast_slice(&data.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_indices"),
                contents: bytemuck::cast_slice(&data.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        WgpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: data.index_count(),
        }
    }

    fn clear(&self, color: [f32; 4]) {
        match self.frame.borrow_mut().as_mut() {
            Some(frame) => {
                // a clear discards anything drawn before it
                frame.draws.clear();
                frame.clear = Some(color);
            }
            None => warn!("clear outside of draw_to_texture ignored"),
        }
    }

    fn bind_texture(&self, texture: &Self::Texture) {
        *self.bound_texture.borrow_mut() = Some(texture.view.clone());
    }

    fn draw_mesh(&self, mesh: &Self::Mesh) {
        let Some(program) = self.current_program.borrow().clone() else {
            warn!("draw_mesh without a program in use ignored");
            return;
        };
        let bind_group = self.bind_group_for(&program);

        match self.frame.borrow_mut().as_mut() {
            Some(frame) => frame.draws.push(DrawCommand {
                pipeline: program.inner.pipeline.clone(),
                bind_group,
                vertex_buffer: mesh.vertex_buffer.clone(),
                index_buffer: mesh.index_buffer.clone(),
                index_count: mesh.index_count,
            }),
            None => warn!("draw_mesh outside of draw_to_texture ignored"),
        }
    }

    fn draw_to_texture(&self, target: &Self::Texture, draw: &mut dyn FnMut() -> bool) -> bool {
        *self.frame.borrow_mut() = Some(Frame::default());
        let success = draw();
        let Some(frame) = self.frame.borrow_mut().take() else {
            return false;
        };
        if !success {
            warn!("Draw callback failed, frame dropped");
            return false;
        }

        let depth_view = self.depth_view(target.width, target.height);

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("draw_to_texture_encoder"),
            });
        {
            let (color_load, depth_load) = match frame.clear {
                Some([r, g, b, a]) => (
                    wgpu::LoadOp::Clear(wgpu::Color {
                        r: r as f64,
                        g: g as f64,
                        b: b as f64,
                        a: a as f64,
                    }),
                    wgpu::LoadOp::Clear(1.0),
                ),
                None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
            };

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("draw_to_texture_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &frame.draws {
                pass.set_pipeline(&draw.pipeline);
                pass.set_bind_group(0, &draw.bind_group, &[]);
                pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..draw.index_count, 0, 0..1);
            }
        }
        self.queue.submit(Some(encoder.finish()));

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            warn!(error = %error, "Frame submission failed");
            return false;
        }

        debug!(
            draws = frame.draws.len(),
            width = target.width,
            height = target.height,
            "Frame rendered"
        );
        true
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

fn create_texture(device: &wgpu::Device, width: u32, height: u32, label: &str) -> WgpuTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(width, height),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: COLOR_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::COPY_SRC
            | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    WgpuTexture {
        texture,
        view,
        width,
        height,
    }
}

fn write_rgba(queue: &wgpu::Queue, texture: &WgpuTexture, pixels: &[u8]) {
    queue.write_texture(
        texture.texture.as_image_copy(),
        pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(texture.width * 4),
            rows_per_image: Some(texture.height),
        },
        extent(texture.width, texture.height),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_dimensions() {
        let dims = CachedDimensions::default();
        assert!(dims.needs_update(640, 480));
        let dims = CachedDimensions::new(640, 480);
        assert!(!dims.needs_update(640, 480));
        assert!(dims.needs_update(1280, 720));
    }

    #[test]
    fn test_clear_and_read_back() {
        // This test requires a GPU, so it may be skipped in CI
        let ctx = match WgpuContext::new() {
            Ok(ctx) => ctx,
            Err(e) => {
                println!("Skipping test (no GPU): {}", e);
                return;
            }
        };

        // odd width exercises row padding
        let target = ctx.create_target(3, 2);
        let ok = ctx.draw_to_texture(&target, &mut || {
            ctx.clear([1.0, 0.0, 0.0, 1.0]);
            true
        });
        assert!(ok);

        let pixels = ctx.read_texture(&target).unwrap();
        assert_eq!(pixels.len(), 3 * 2 * 4);
        for pixel in pixels.chunks_exact(4) {
            assert_eq!(pixel, &[255, 0, 0, 255]);
        }
    }
}
