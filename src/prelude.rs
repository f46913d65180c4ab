//! # Tessera Prelude
//!
//! Commonly used types in one import.
//!
//! ```no_run
//! use tessera::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut engine = tessera::default()?;
//!
//!     let model = engine
//!         .scene_mut()
//!         .add_model(Model::from_path("crate.obj", LoadOptions::default()));
//!     let body = engine.scene_mut().physics_mut().add_primitive_rigid_body(
//!         &ShapeDescriptor::new(Shape::Box { half_extents: Vector3::new(0.5, 0.5, 0.5) })
//!             .with_mass(1.0)
//!             .with_position(Vector3::new(0.0, 5.0, 0.0)),
//!     )?;
//!     engine.scene_mut().bind_rigid_body(model, body);
//!
//!     engine.run()
//! }
//! ```

// Re-export core application types
pub use crate::app::{Engine, EngineConfig, SceneState};

// Re-export graphics and scene types
pub use crate::gfx::camera::FlyCamera;
pub use crate::gfx::scene::{LoadOptions, Model, SceneError};

// Re-export physics types
pub use crate::physics::{
    PhysicsConfig, PhysicsError, PhysicsWorld, RigidBodyHandle, Shape, ShapeDescriptor, ShapeKind,
    StepReport,
};

// Re-export the simulation bridge
pub use crate::simulation::{DeformableBody, RigidSkin, SoftBodySync, SyncError};

// Re-export common external dependencies
pub use cgmath::{Deg, InnerSpace, Point3, Quaternion, Vector3};
