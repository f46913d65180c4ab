//! Destination of vertex data pushed from the simulation to the renderer.

use crate::gfx::scene::{MeshRecord, Model};

/// Writes vertex components into a mesh's render-side vertex buffer.
pub trait VertexUpload {
    /// Overwrites mesh `mesh_index`'s vertex buffer from byte offset 0 with `data`.
    fn write_vertices(&mut self, mesh_index: usize, mesh: &MeshRecord, data: &[f32]);
}

/// Uploads through the wgpu queue into each mesh's GPU vertex buffer.
pub struct GpuUpload<'a> {
    queue: &'a wgpu::Queue,
}

impl<'a> GpuUpload<'a> {
    pub fn new(queue: &'a wgpu::Queue) -> Self {
        Self { queue }
    }
}

impl VertexUpload for GpuUpload<'_> {
    fn write_vertices(&mut self, _mesh_index: usize, mesh: &MeshRecord, data: &[f32]) {
        match mesh.vertex_buffer() {
            Some(buffer) => self
                .queue
                .write_buffer(buffer, 0, bytemuck::cast_slice(data)),
            None => log::trace!("Mesh '{}' has no GPU vertex buffer yet", mesh.name),
        }
    }
}

/// CPU mirror of every mesh's vertex buffer.
///
/// Holds the same bytes the GPU buffers would, so the render side of the
/// simulation bridge can be inspected without a device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostVertexBuffers {
    buffers: Vec<Vec<u8>>,
}

impl HostVertexBuffers {
    /// Mirrors the initial upload of every mesh in `model`.
    pub fn from_model(model: &Model) -> Self {
        Self {
            buffers: model
                .meshes
                .iter()
                .map(|mesh| bytemuck::cast_slice(&mesh.vertices).to_vec())
                .collect(),
        }
    }

    pub fn buffer(&self, mesh_index: usize) -> Option<&[u8]> {
        self.buffers.get(mesh_index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl VertexUpload for HostVertexBuffers {
    fn write_vertices(&mut self, mesh_index: usize, _mesh: &MeshRecord, data: &[f32]) {
        if self.buffers.len() <= mesh_index {
            self.buffers.resize(mesh_index + 1, Vec::new());
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let buffer = &mut self.buffers[mesh_index];
        if buffer.len() < bytes.len() {
            buffer.resize(bytes.len(), 0);
        }
        buffer[..bytes.len()].copy_from_slice(bytes);
    }
}
