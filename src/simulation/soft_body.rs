//! # Soft-Body Sync
//!
//! One-directional bridge from a deformable simulation to the renderer.
//! The simulation sees a model as one flattened vertex array; after each
//! physics step its positions are written back into that array and each
//! mesh's render buffer receives exactly its own slice of it.
//!
//! ```no_run
//! use tessera::gfx::scene::{LoadOptions, Model};
//! use tessera::simulation::{HostVertexBuffers, SoftBodySync};
//!
//! let mut model = Model::from_path("cloth.obj", LoadOptions::default().with_flatten(true));
//! let sync = SoftBodySync::new(&model).unwrap();
//! let mut buffers = HostVertexBuffers::from_model(&model);
//!
//! let positions = model.flattened.as_ref().unwrap().position_components();
//! sync.update_positions(&mut model, &positions).unwrap();
//! sync.sync(&model, &mut buffers).unwrap();
//! ```

use cgmath::{Matrix4, Point3, Transform};

use crate::{
    gfx::scene::Model,
    physics::{PhysicsWorld, RigidBodyHandle},
};

use super::upload::VertexUpload;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("model was loaded without a flattened vertex buffer")]
    NotFlattened,

    #[error("expected {expected} position components, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("no model at index {0}")]
    UnknownModel(usize),
}

/// A simulated body whose vertices move independently.
pub trait DeformableBody {
    /// Pulls the body's state after the world has stepped.
    fn update(&mut self, world: &PhysicsWorld);

    /// Current vertex positions, three floats per flattened vertex.
    fn positions(&self) -> &[f32];
}

/// Pushes simulated positions into a model's flattened buffer and meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftBodySync {
    vertex_count: usize,
}

impl SoftBodySync {
    pub fn new(model: &Model) -> Result<Self, SyncError> {
        let flattened = model.flattened.as_ref().ok_or(SyncError::NotFlattened)?;
        Ok(Self {
            vertex_count: flattened.vertex_count(),
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Overwrites every vertex position of `model` with `positions`.
    ///
    /// The flattened buffer and each mesh's CPU vertices are both updated;
    /// other attributes are left untouched.
    pub fn update_positions(&self, model: &mut Model, positions: &[f32]) -> Result<(), SyncError> {
        let expected = self.vertex_count * 3;
        if positions.len() != expected {
            return Err(SyncError::LengthMismatch {
                expected,
                actual: positions.len(),
            });
        }

        let flattened = model.flattened.as_mut().ok_or(SyncError::NotFlattened)?;
        if flattened.vertex_count() != self.vertex_count {
            return Err(SyncError::LengthMismatch {
                expected,
                actual: flattened.vertex_count() * 3,
            });
        }

        for (slot, position) in flattened.positions_mut().zip(positions.chunks_exact(3)) {
            slot.copy_from_slice(position);
        }

        for (mesh, range) in model.meshes.iter_mut().zip(flattened.ranges()) {
            for (vertex, index) in mesh.vertices.iter_mut().zip(range.vertices()) {
                vertex.position.copy_from_slice(&positions[index * 3..index * 3 + 3]);
            }
        }

        Ok(())
    }

    /// Uploads each mesh's slice of the flattened buffer to its vertex buffer.
    pub fn sync(&self, model: &Model, upload: &mut impl VertexUpload) -> Result<(), SyncError> {
        let flattened = model.flattened.as_ref().ok_or(SyncError::NotFlattened)?;

        for (index, mesh) in model.meshes.iter().enumerate() {
            if let Some(slice) = flattened.mesh_slice(index) {
                upload.write_vertices(index, mesh, slice);
            }
        }

        Ok(())
    }

    /// Pulls `body`'s positions into `model` and uploads them.
    pub fn apply(
        &self,
        model: &mut Model,
        body: &dyn DeformableBody,
        upload: &mut impl VertexUpload,
    ) -> Result<(), SyncError> {
        self.update_positions(model, body.positions())?;
        self.sync(model, upload)
    }
}

/// Deforms a model's rest pose by the pose of one rigid body.
///
/// The rest pose has each mesh's node transform baked in, so the skin's
/// positions are in world space. The driven model must draw them with
/// identity transforms; see [`Model::reset_transforms`].
pub struct RigidSkin {
    body: RigidBodyHandle,
    rest: Vec<Point3<f32>>,
    positions: Vec<f32>,
}

impl RigidSkin {
    /// Captures the model's current flattened positions, each moved by its
    /// mesh's transform, as the rest pose.
    pub fn new(model: &Model, body: RigidBodyHandle) -> Result<Self, SyncError> {
        let flattened = model.flattened.as_ref().ok_or(SyncError::NotFlattened)?;
        let mut rest = flattened.positions();
        for (mesh, range) in model.meshes.iter().zip(flattened.ranges()) {
            for point in &mut rest[range.vertices()] {
                *point = mesh.transform.transform_point(*point);
            }
        }
        let positions = rest.iter().flat_map(|p| [p.x, p.y, p.z]).collect();

        Ok(Self {
            body,
            rest,
            positions,
        })
    }

    pub fn body(&self) -> RigidBodyHandle {
        self.body
    }

    fn deform(&mut self, transform: &Matrix4<f32>) {
        self.positions = self
            .rest
            .iter()
            .flat_map(|p| {
                let moved = transform.transform_point(*p);
                [moved.x, moved.y, moved.z]
            })
            .collect();
    }
}

impl DeformableBody for RigidSkin {
    fn update(&mut self, world: &PhysicsWorld) {
        match world.body_transform(self.body) {
            Some(transform) => self.deform(&transform),
            None => log::warn!("Rigid skin body {:?} is gone", self.body),
        }
    }

    fn positions(&self) -> &[f32] {
        &self.positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        gfx::scene::{
            ImportedMesh, ImportedScene, LoadOptions, ModelLoader, SceneNode, FLOATS_PER_VERTEX,
        },
        physics::{PhysicsConfig, Shape, ShapeDescriptor},
        simulation::upload::HostVertexBuffers,
    };
    use cgmath::{Deg, InnerSpace, Quaternion, Rotation3, Vector3};
    use std::path::Path;

    fn two_triangle_model(flatten: bool) -> Model {
        let triangle = |name: &str, x: f32| {
            ImportedMesh::new(
                name,
                vec![[x, 0.0, 0.0], [x + 1.0, 0.0, 0.0], [x, 1.0, 0.0]],
                vec![0, 1, 2],
            )
        };
        let scene = ImportedScene::new(
            SceneNode::new("root")
                .with_mesh(0)
                .with_child(SceneNode::new("child").with_mesh(1)),
        )
        .with_meshes(vec![triangle("a", 0.0), triangle("b", 5.0)]);

        ModelLoader::new(LoadOptions::default().with_flatten(flatten))
            .build(&scene, Path::new(""))
            .unwrap()
    }

    fn shifted_positions(model: &Model, dy: f32) -> Vec<f32> {
        let mut positions = model.flattened.as_ref().unwrap().position_components();
        for position in positions.chunks_exact_mut(3) {
            position[1] += dy;
        }
        positions
    }

    #[test]
    fn test_requires_flattened_model() {
        let model = two_triangle_model(false);
        assert_eq!(SoftBodySync::new(&model), Err(SyncError::NotFlattened));
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let mut model = two_triangle_model(true);
        let sync = SoftBodySync::new(&model).unwrap();
        let mut buffers = HostVertexBuffers::from_model(&model);

        let positions = shifted_positions(&model, 2.5);
        sync.update_positions(&mut model, &positions).unwrap();
        sync.sync(&model, &mut buffers).unwrap();

        let flattened = model.flattened.as_ref().unwrap();
        let mut read_back = Vec::new();
        for index in 0..model.meshes.len() {
            read_back.extend_from_slice(buffers.buffer(index).unwrap());
        }
        let expected: &[u8] = bytemuck::cast_slice(flattened.vertices());
        assert_eq!(read_back, expected);

        // Positions went through unchanged
        assert_eq!(flattened.position_components(), positions);
    }

    #[test]
    fn test_each_mesh_gets_its_own_slice() {
        let mut model = two_triangle_model(true);
        let sync = SoftBodySync::new(&model).unwrap();
        let mut buffers = HostVertexBuffers::from_model(&model);

        let positions = shifted_positions(&model, 1.0);
        sync.update_positions(&mut model, &positions).unwrap();
        sync.sync(&model, &mut buffers).unwrap();

        let flattened = model.flattened.as_ref().unwrap();
        for index in 0..2 {
            let expected: &[u8] = bytemuck::cast_slice(flattened.mesh_slice(index).unwrap());
            let actual = buffers.buffer(index).unwrap();
            assert_eq!(actual.len(), 3 * FLOATS_PER_VERTEX * 4);
            assert_eq!(actual, expected);
        }

        // Second mesh holds its own vertices, not the first mesh's
        assert_eq!(model.meshes[1].vertices[0].position, [5.0, 1.0, 0.0]);
        let expected_bytes: &[u8] = bytemuck::cast_slice(&model.meshes[1].vertices);
        assert_eq!(buffers.buffer(1).unwrap(), expected_bytes);
    }

    #[test]
    fn test_length_mismatch() {
        let mut model = two_triangle_model(true);
        let sync = SoftBodySync::new(&model).unwrap();
        let result = sync.update_positions(&mut model, &[0.0; 9]);
        assert_eq!(
            result,
            Err(SyncError::LengthMismatch {
                expected: 18,
                actual: 9
            })
        );
    }

    #[test]
    fn test_rigid_skin_follows_body() {
        let mut world = PhysicsWorld::init(
            PhysicsConfig::default()
                .with_fixed_time_step(0.25)
                .with_max_frame_time(None),
        )
        .unwrap();
        let handle = world
            .add_primitive_rigid_body(
                &ShapeDescriptor::new(Shape::Sphere { radius: 0.5 })
                    .with_mass(1.0)
                    .with_position(Vector3::new(0.0, 10.0, 0.0)),
            )
            .unwrap();

        let mut model = two_triangle_model(true);
        let sync = SoftBodySync::new(&model).unwrap();
        let mut skin = RigidSkin::new(&model, handle).unwrap();
        let mut buffers = HostVertexBuffers::from_model(&model);

        skin.update(&world);
        sync.apply(&mut model, &skin, &mut buffers).unwrap();
        assert_eq!(model.meshes[0].vertices[0].position, [0.0, 10.0, 0.0]);

        world.step(0.5);
        skin.update(&world);
        sync.apply(&mut model, &skin, &mut buffers).unwrap();
        assert!(model.meshes[0].vertices[0].position[1] < 10.0);
    }

    #[test]
    fn test_rigid_skin_bakes_node_transform_inside_body_pose() {
        let mut world = PhysicsWorld::init(PhysicsConfig::default()).unwrap();
        let handle = world
            .add_primitive_rigid_body(
                &ShapeDescriptor::new(Shape::Sphere { radius: 0.5 })
                    .with_position(Vector3::new(0.0, 10.0, 0.0))
                    .with_rotation(Quaternion::from_angle_y(Deg(90.0))),
            )
            .unwrap();

        // Child node sits at x = 2 under the root
        let scene = ImportedScene::new(
            SceneNode::new("root").with_child(
                SceneNode::new("child")
                    .with_transform(Matrix4::from_translation(Vector3::new(2.0, 0.0, 0.0)))
                    .with_mesh(0),
            ),
        )
        .with_meshes(vec![ImportedMesh::new(
            "t",
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2],
        )]);
        let mut model = ModelLoader::new(LoadOptions::default().with_flatten(true))
            .build(&scene, Path::new(""))
            .unwrap();

        let sync = SoftBodySync::new(&model).unwrap();
        let mut skin = RigidSkin::new(&model, handle).unwrap();
        let mut buffers = HostVertexBuffers::from_model(&model);
        model.reset_transforms();

        skin.update(&world);
        sync.apply(&mut model, &skin, &mut buffers).unwrap();

        // Body pose applied after the node offset: (2,0,0) turned about Y lands on -Z
        let drawn = model.mesh_transform(0).unwrap().transform_point(Point3::from(
            model.meshes[0].vertices[0].position,
        ));
        assert!((drawn - Point3::new(0.0, 10.0, -2.0)).magnitude() < 1e-4);
    }
}
