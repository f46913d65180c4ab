use cgmath::Vector3;
use rapier3d::prelude::{ColliderHandle, RigidBodyHandle};

use super::shape::ShapeKind;

/// A rigid body that has been constructed and registered in a [`PhysicsWorld`].
///
/// Holding a `SimulatedBody` means construction succeeded: the rigid-body
/// handle and its collider both exist in the world's sets and live until the
/// body is removed or the world is freed.
///
/// [`PhysicsWorld`]: super::world::PhysicsWorld
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedBody {
    pub(crate) handle: RigidBodyHandle,
    pub(crate) collider: ColliderHandle,
    pub(crate) kind: ShapeKind,
    pub(crate) mass: f32,
    pub(crate) inertia: Vector3<f32>,
}

impl SimulatedBody {
    pub fn handle(&self) -> RigidBodyHandle {
        self.handle
    }

    pub fn collider(&self) -> ColliderHandle {
        self.collider
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// Principal local inertia; zero for fixed bodies.
    pub fn inertia(&self) -> Vector3<f32> {
        self.inertia
    }
}
