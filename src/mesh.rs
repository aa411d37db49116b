// SPDX-License-Identifier: GPL-3.0-only

//! Mesh construction
//!
//! Geometry is built on the CPU as [`MeshData`] and uploaded once through
//! the render context. Every vertex carries a position and a texture
//! coordinate, matching the `mvp_uv` vertex stage.

use crate::constants::MAX_SPHERE_SEGMENTS;
use crate::gpu::RenderContext;
use bytemuck::{Pod, Zeroable};
use std::f32::consts::PI;

/// Vertex layout shared with the `mvp_uv` vertex stage
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const fn new(position: [f32; 3], uv: [f32; 2]) -> Self {
        Self { position, uv }
    }
}

/// Indexed triangle list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    /// Flat rectangle spanning `[-aspect, aspect] x [-1, 1]` at z = 0
    ///
    /// Texture v grows with y, so an orthographic projection with top and
    /// bottom swapped shows the frame upright.
    pub fn plane(aspect: f32) -> Self {
        let vertices = vec![
            Vertex::new([-aspect, -1.0, 0.0], [0.0, 0.0]),
            Vertex::new([aspect, -1.0, 0.0], [1.0, 0.0]),
            Vertex::new([aspect, 1.0, 0.0], [1.0, 1.0]),
            Vertex::new([-aspect, 1.0, 0.0], [0.0, 1.0]),
        ];
        let indices = vec![0, 1, 2, 0, 2, 3];
        Self { vertices, indices }
    }

    /// UV sphere for equirectangular frames
    ///
    /// `stacks` rings from the north pole (v = 0) to the south pole
    /// (v = 1), `slices` segments around. The seam column is duplicated so
    /// u runs from 0 to 1 without wrapping. Both counts are clamped to
    /// [`MAX_SPHERE_SEGMENTS`].
    pub fn sphere(radius: f32, stacks: u32, slices: u32) -> Self {
        let stacks = stacks.clamp(2, MAX_SPHERE_SEGMENTS);
        let slices = slices.clamp(3, MAX_SPHERE_SEGMENTS);

        let mut vertices = Vec::with_capacity(((stacks + 1) * (slices + 1)) as usize);
        for stack in 0..=stacks {
            let v = stack as f32 / stacks as f32;
            let polar = v * PI;
            for slice in 0..=slices {
                let u = slice as f32 / slices as f32;
                let azimuth = u * 2.0 * PI;
                let position = [
                    radius * polar.sin() * azimuth.cos(),
                    radius * polar.cos(),
                    radius * polar.sin() * azimuth.sin(),
                ];
                vertices.push(Vertex::new(position, [u, v]));
            }
        }

        let row = slices + 1;
        let mut indices = Vec::with_capacity((stacks * slices * 6) as usize);
        for stack in 0..stacks {
            for slice in 0..slices {
                let a = stack * row + slice;
                let b = a + row;
                indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }

        Self { vertices, indices }
    }

    /// Unit cube centred on the origin, each face mapping the full texture
    pub fn cube() -> Self {
        // (normal, tangent, bitangent) per face
        const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ];
        const CORNERS: [([f32; 2], [f32; 2]); 4] = [
            ([-1.0, -1.0], [0.0, 0.0]),
            ([1.0, -1.0], [1.0, 0.0]),
            ([1.0, 1.0], [1.0, 1.0]),
            ([-1.0, 1.0], [0.0, 1.0]),
        ];

        let mut mesh = Self::default();
        for (normal, tangent, bitangent) in FACES {
            let base = mesh.vertices.len() as u32;
            for (corner, uv) in CORNERS {
                let position = [0, 1, 2].map(|i| {
                    0.5 * (normal[i] + corner[0] * tangent[i] + corner[1] * bitangent[i])
                });
                mesh.vertices.push(Vertex::new(position, uv));
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }
}

/// Mesh uploaded to a render context
pub struct Mesh<C: RenderContext> {
    handle: C::Mesh,
    index_count: u32,
}

impl<C: RenderContext> Mesh<C> {
    pub fn upload(ctx: &C, data: &MeshData) -> Self {
        Self {
            handle: ctx.create_mesh(data),
            index_count: data.index_count(),
        }
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn draw(&self, ctx: &C) {
        ctx.draw_mesh(&self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
    }

    #[test]
    fn test_plane_spans_aspect() {
        let plane = MeshData::plane(16.0 / 9.0);
        assert_eq!(plane.vertices.len(), 4);
        assert_eq!(plane.index_count(), 6);
        let max_x = plane
            .vertices
            .iter()
            .map(|v| v.position[0])
            .fold(f32::MIN, f32::max);
        assert_eq!(max_x, 16.0 / 9.0);
        assert!(plane.vertices.iter().all(|v| v.position[2] == 0.0));
    }

    #[test]
    fn test_sphere_counts_and_poles() {
        let sphere = MeshData::sphere(1.0, 10, 20);
        assert_eq!(sphere.vertices.len(), 11 * 21);
        assert_eq!(sphere.indices.len(), 10 * 20 * 6);
        assert!(sphere.indices.iter().all(|&i| (i as usize) < sphere.vertices.len()));

        let north = sphere.vertices[0];
        assert_eq!(north.uv[1], 0.0);
        assert!((north.position[1] - 1.0).abs() < 1e-6);

        for v in &sphere.vertices {
            let [x, y, z] = v.position;
            assert!(((x * x + y * y + z * z).sqrt() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sphere_segments_are_clamped() {
        let sphere = MeshData::sphere(1.0, u32::MAX, 0);
        let stacks = MAX_SPHERE_SEGMENTS as usize;
        assert_eq!(sphere.vertices.len(), (stacks + 1) * 4);
        assert_eq!(sphere.indices.len(), stacks * 3 * 6);
        assert!(sphere.indices.iter().all(|&i| (i as usize) < sphere.vertices.len()));
    }

    #[test]
    fn test_cube_faces() {
        let cube = MeshData::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        for v in &cube.vertices {
            assert!(v.position.iter().all(|c| c.abs() == 0.5));
        }
    }
}
