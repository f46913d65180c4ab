//! Errors raised while configuring the physics world or constructing bodies.

use rapier3d::prelude::RigidBodyHandle;

use super::shape::ShapeKind;

#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("invalid physics configuration: {0}")]
    InvalidConfig(String),

    #[error("cannot build {kind:?} shape: {reason}")]
    DegenerateShape { kind: ShapeKind, reason: String },

    #[error("no body registered for handle {0:?}")]
    UnknownBody(RigidBodyHandle),
}
