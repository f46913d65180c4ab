//! Flattened vertex and index buffers spanning every mesh of a model.
//!
//! Deformable simulations need one linear view of all of a model's geometry.
//! The flattened buffer concatenates each mesh's vertices (14 floats each)
//! in load order and rebases each mesh's indices by the number of vertices
//! already stored, so the flattened index array addresses the flattened
//! vertex array directly.

use cgmath::Point3;

use super::vertex::{Vertex, FLOATS_PER_VERTEX};

/// Where one mesh lives inside the flattened buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshRange {
    /// First vertex of the mesh, counted in vertices.
    pub vertex_offset: u32,
    pub vertex_count: u32,
    /// First index of the mesh within the flattened index array.
    pub index_offset: u32,
    pub index_count: u32,
}

impl MeshRange {
    /// Range of the mesh's vertices, counted in vertices.
    pub fn vertices(&self) -> std::ops::Range<usize> {
        let start = self.vertex_offset as usize;
        start..start + self.vertex_count as usize
    }

    /// Range of the mesh's scalar components in the flattened vertex array.
    pub fn components(&self) -> std::ops::Range<usize> {
        let range = self.vertices();
        range.start * FLOATS_PER_VERTEX..range.end * FLOATS_PER_VERTEX
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlattenedBuffer {
    vertices: Vec<f32>,
    indices: Vec<u32>,
    ranges: Vec<MeshRange>,
}

impl FlattenedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one mesh and returns where it was placed.
    pub fn append_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> MeshRange {
        let range = MeshRange {
            vertex_offset: (self.vertices.len() / FLOATS_PER_VERTEX) as u32,
            vertex_count: vertices.len() as u32,
            index_offset: self.indices.len() as u32,
            index_count: indices.len() as u32,
        };

        for vertex in vertices {
            self.vertices.extend_from_slice(vertex.components());
        }
        self.indices
            .extend(indices.iter().map(|index| index + range.vertex_offset));
        self.ranges.push(range);

        range
    }

    /// Every vertex's 14 components, mesh after mesh.
    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    /// Rebased triangle indices into [`Self::vertices`].
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Placement of each appended mesh, in append order.
    pub fn ranges(&self) -> &[MeshRange] {
        &self.ranges
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The components belonging to the `mesh`-th appended mesh.
    pub fn mesh_slice(&self, mesh: usize) -> Option<&[f32]> {
        self.ranges
            .get(mesh)
            .map(|range| &self.vertices[range.components()])
    }

    /// Positions of every vertex, e.g. to seed a convex hull.
    pub fn positions(&self) -> Vec<Point3<f32>> {
        self.vertices
            .chunks_exact(FLOATS_PER_VERTEX)
            .map(|v| Point3::new(v[0], v[1], v[2]))
            .collect()
    }

    /// Position components of every vertex, three floats each.
    pub fn position_components(&self) -> Vec<f32> {
        self.vertices
            .chunks_exact(FLOATS_PER_VERTEX)
            .flat_map(|v| [v[0], v[1], v[2]])
            .collect()
    }

    /// Mutable `[x, y, z]` slot of every vertex.
    pub fn positions_mut(&mut self) -> impl Iterator<Item = &mut [f32]> {
        self.vertices
            .chunks_exact_mut(FLOATS_PER_VERTEX)
            .map(|v| &mut v[..3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(x: f32) -> Vec<Vertex> {
        vec![
            Vertex::at([x, 0.0, 0.0]),
            Vertex::at([x + 1.0, 0.0, 0.0]),
            Vertex::at([x, 1.0, 0.0]),
        ]
    }

    #[test]
    fn test_offsets_count_vertices() {
        let mut buffer = FlattenedBuffer::new();
        let first = buffer.append_mesh(&triangle(0.0), &[0, 1, 2]);
        let second = buffer.append_mesh(&triangle(5.0), &[0, 1, 2]);

        assert_eq!(first.vertex_offset, 0);
        assert_eq!(second.vertex_offset, 3);
        assert_eq!(second.index_offset, 3);
        assert_eq!(buffer.indices(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(buffer.vertices().len(), 2 * 3 * FLOATS_PER_VERTEX);
    }

    #[test]
    fn test_mesh_slice() {
        let mut buffer = FlattenedBuffer::new();
        buffer.append_mesh(&triangle(0.0), &[0, 1, 2]);
        buffer.append_mesh(&triangle(5.0), &[0, 1, 2]);

        let slice = buffer.mesh_slice(1).unwrap();
        assert_eq!(slice.len(), 3 * FLOATS_PER_VERTEX);
        assert_eq!(slice[0], 5.0);
        assert!(buffer.mesh_slice(2).is_none());
    }

    #[test]
    fn test_positions_mut() {
        let mut buffer = FlattenedBuffer::new();
        buffer.append_mesh(&triangle(0.0), &[0, 1, 2]);

        for position in buffer.positions_mut() {
            position[1] += 10.0;
        }

        let positions = buffer.positions();
        assert_eq!(positions[2], Point3::new(0.0, 11.0, 0.0));
        // Normals untouched
        assert_eq!(buffer.vertices()[3..6], [0.0, 1.0, 0.0]);
        assert_eq!(buffer.position_components().len(), 9);
    }
}
