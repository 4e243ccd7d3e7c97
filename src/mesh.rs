//! Vertex format and the fixed geometry of the demo scene.
//!
//! - [`Vertex`]: position-only vertex shared by every pipeline
//! - [`Geometry`]: CPU-side vertex and index arrays (cube, plane)
//! - [`Mesh`]: the same data uploaded into GPU vertex/index buffers
//!
//! Both primitives wind their front faces counter-clockwise when viewed from
//! outside, matching the `Ccw` front face and back-face culling of the main
//! pass pipelines.

use crate::error::InitError;
use crate::gpu::GpuContext;

/// A vertex for mesh rendering. Only the position is stored: neither pass
/// needs normals or texture coordinates.
///
/// | Attribute | Format    | Offset | Shader Location |
/// |-----------|-----------|--------|-----------------|
/// | position  | Float32x3 | 0      | 0               |
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// Position in model space.
    pub position: [f32; 3],
}

impl Vertex {
    /// The wgpu vertex buffer layout for this vertex type.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
        }
    }
}

/// Vertex and index arrays for one mesh, before upload.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Geometry {
    /// A unit cube centered at the origin, spanning -0.5..0.5 on every axis.
    ///
    /// The eight corners are shared between faces; 12 triangles.
    pub fn cube() -> Self {
        #[rustfmt::skip]
        let vertices = vec![
            Vertex::new(-0.5, -0.5, -0.5), // 0
            Vertex::new( 0.5, -0.5, -0.5), // 1
            Vertex::new( 0.5,  0.5, -0.5), // 2
            Vertex::new(-0.5,  0.5, -0.5), // 3
            Vertex::new(-0.5, -0.5,  0.5), // 4
            Vertex::new( 0.5, -0.5,  0.5), // 5
            Vertex::new( 0.5,  0.5,  0.5), // 6
            Vertex::new(-0.5,  0.5,  0.5), // 7
        ];

        #[rustfmt::skip]
        let indices = vec![
            4, 5, 6, 6, 7, 4, // +Z
            1, 0, 3, 3, 2, 1, // -Z
            5, 1, 2, 2, 6, 5, // +X
            0, 4, 7, 7, 3, 0, // -X
            7, 6, 2, 2, 3, 7, // +Y
            0, 1, 5, 5, 4, 0, // -Y
        ];

        Self { vertices, indices }
    }

    /// A unit square in the XZ plane at y = 0, facing +Y.
    ///
    /// Scale it with the model matrix to get a ground plane of any size.
    pub fn plane() -> Self {
        let vertices = vec![
            Vertex::new(-0.5, 0.0, -0.5),
            Vertex::new(0.5, 0.0, -0.5),
            Vertex::new(0.5, 0.0, 0.5),
            Vertex::new(-0.5, 0.0, 0.5),
        ];

        let indices = vec![3, 2, 1, 1, 0, 3];

        Self { vertices, indices }
    }

    /// Iterates the triangles as position triples.
    pub fn triangles(&self) -> impl Iterator<Item = [[f32; 3]; 3]> + '_ {
        self.indices.chunks_exact(3).map(|tri| {
            [
                self.vertices[tri[0] as usize].position,
                self.vertices[tri[1] as usize].position,
                self.vertices[tri[2] as usize].position,
            ]
        })
    }
}

/// GPU-resident mesh geometry with vertex and index buffers.
///
/// Immutable after creation.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Uploads the geometry into new vertex and index buffers.
    pub fn new(gpu: &GpuContext, geometry: &Geometry, label: &str) -> Result<Self, InitError> {
        use wgpu::util::DeviceExt;

        let (vertex_buffer, index_buffer) = gpu.validated("mesh buffers", |device| {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Vertex Buffer")),
                contents: bytemuck::cast_slice(&geometry.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} Index Buffer")),
                contents: bytemuck::cast_slice(&geometry.indices),
                usage: wgpu::BufferUsages::INDEX,
            });
            (vertex_buffer, index_buffer)
        })?;

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: geometry.indices.len() as u32,
        })
    }

    /// Binds the buffers and issues one indexed draw.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}
