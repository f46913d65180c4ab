use std::sync::Arc;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;

use super::{
    model::Model,
    texture::{self, Texture},
    vertex::Vertex,
};

/// Per-draw uniform data: the mesh's final model matrix and material scalars.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshUniform {
    pub model: [[f32; 4]; 4],
    pub ambient: [f32; 3],
    pub shininess: f32,
}

impl MeshUniform {
    pub fn new(model: Matrix4<f32>, ambient: Vector3<f32>, shininess: f32) -> Self {
        Self {
            model: model.into(),
            ambient: ambient.into(),
            shininess,
        }
    }
}

/// GPU buffers owned by one mesh
pub struct MeshGpuResources {
    pub vertex_buffer: Option<wgpu::Buffer>,
    pub index_buffer: Option<wgpu::Buffer>,
    pub index_count: u32,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// One drawable mesh produced by the loader.
///
/// `transform` is the accumulated transform of the node the mesh was found
/// under; it is fixed at load time and only changes by direct assignment.
pub struct MeshRecord {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub textures: Vec<Arc<Texture>>,
    pub transform: Matrix4<f32>,
    gpu_resources: Option<MeshGpuResources>,
}

impl MeshRecord {
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        textures: Vec<Arc<Texture>>,
    ) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            textures,
            transform: Matrix4::identity(),
            gpu_resources: None,
        }
    }

    pub fn with_transform(mut self, transform: Matrix4<f32>) -> Self {
        self.transform = transform;
        self
    }

    /// Shader uniform name for each texture, in draw order.
    pub fn texture_uniforms(&self) -> Vec<String> {
        texture::uniform_names(&self.textures)
    }

    /// Bind group layout for [`MeshUniform`], shared by every mesh.
    pub fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        })
    }

    /// Uploads vertex, index and uniform data.
    ///
    /// The vertex buffer is writable so deformed positions can be pushed
    /// into it after upload.
    pub fn init_gpu_resources(
        &mut self,
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        uniform: &MeshUniform,
    ) {
        let vertex_buffer = if self.vertices.is_empty() {
            log::warn!("Mesh '{}' has no vertex data", self.name);
            None
        } else {
            Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(&self.vertices),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            }))
        };

        let index_buffer = if self.indices.is_empty() {
            log::warn!("Mesh '{}' has no index data", self.name);
            None
        } else {
            Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(&self.indices),
                usage: wgpu::BufferUsages::INDEX,
            }))
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Uniform Buffer"),
            contents: bytemuck::bytes_of(uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        self.gpu_resources = Some(MeshGpuResources {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
            uniform_buffer,
            bind_group,
        });
    }

    pub fn update_uniform(&self, queue: &wgpu::Queue, uniform: &MeshUniform) {
        if let Some(gpu) = &self.gpu_resources {
            queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(uniform));
        }
    }

    pub fn vertex_buffer(&self) -> Option<&wgpu::Buffer> {
        self.gpu_resources
            .as_ref()
            .and_then(|gpu| gpu.vertex_buffer.as_ref())
    }

    pub fn gpu_resources(&self) -> Option<&MeshGpuResources> {
        self.gpu_resources.as_ref()
    }
}

/// Render-pass extension that submits loaded meshes.
///
/// The mesh bind group is set at group 1; the caller binds the camera at
/// group 0.
pub trait DrawMesh<'a> {
    fn draw_mesh(&mut self, mesh: &'a MeshRecord);
    fn draw_model(&mut self, model: &'a Model);
}

impl<'a, 'b> DrawMesh<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b MeshRecord) {
        let Some(gpu) = &mesh.gpu_resources else {
            return;
        };
        let (Some(vertex_buffer), Some(index_buffer)) = (&gpu.vertex_buffer, &gpu.index_buffer)
        else {
            log::warn!("Skipping draw of mesh '{}': no index data", mesh.name);
            return;
        };

        self.set_bind_group(1, &gpu.bind_group, &[]);
        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..gpu.index_count, 0, 0..1);
    }

    fn draw_model(&mut self, model: &'b Model) {
        for mesh in &model.meshes {
            self.draw_mesh(mesh);
        }
    }
}
