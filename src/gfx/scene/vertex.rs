//! # Vertex Data Structures
//!
//! GPU-compatible vertex format shared by every loaded mesh and by the
//! flattened buffer used for deformable geometry.

/// Number of scalar components in one [`Vertex`].
pub const FLOATS_PER_VERTEX: usize = 14;

/// Normal used when a mesh provides none.
pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
/// Texture coordinate used when a mesh provides none.
pub const DEFAULT_TEX_COORDS: [f32; 2] = [0.0, 0.0];
/// Tangent used when a mesh provides no tangent space.
pub const DEFAULT_TANGENT: [f32; 3] = [1.0, 0.0, 0.0];
/// Bitangent used when a mesh provides no tangent space.
pub const DEFAULT_BITANGENT: [f32; 3] = [0.0, 0.0, 1.0];

/// A 3D vertex with the full tangent-space attribute set.
///
/// # Memory Layout
///
/// `#[repr(C)]` keeps the fields contiguous: 14 `f32`s, 56 bytes, in the
/// order position, normal, texture coordinates, tangent, bitangent. The
/// flattened buffer stores vertices in exactly this order.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex {
    /// Vertex at `position` with every other attribute at its default.
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            normal: DEFAULT_NORMAL,
            tex_coords: DEFAULT_TEX_COORDS,
            tangent: DEFAULT_TANGENT,
            bitangent: DEFAULT_BITANGENT,
        }
    }

    /// The vertex as its 14 scalar components.
    pub fn components(&self) -> &[f32; FLOATS_PER_VERTEX] {
        bytemuck::cast_ref(self)
    }

    /// Returns the vertex buffer layout for wgpu rendering.
    ///
    /// - Attribute 0: Position (Float32x3)
    /// - Attribute 1: Normal (Float32x3)
    /// - Attribute 2: Texture coordinates (Float32x2)
    /// - Attribute 3: Tangent (Float32x3)
    /// - Attribute 4: Bitangent (Float32x3)
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
            0 => Float32x3,
            1 => Float32x3,
            2 => Float32x2,
            3 => Float32x3,
            4 => Float32x3,
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}
